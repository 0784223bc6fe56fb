use anyhow::{anyhow, Result};
use snapmark_schemas::{Snapshot, SnapshotId};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::store::{SaveOutcome, SnapshotStore};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests served by the store worker
pub enum StoreCommand {
    List(Reply<Vec<Snapshot>>),
    Search(String, Reply<Vec<Snapshot>>),
    Save(Box<Snapshot>, Reply<SaveOutcome>),
    Delete(SnapshotId, Reply<Vec<Snapshot>>),
    UpdateIntent(SnapshotId, String, Reply<Vec<Snapshot>>),
    ExportMarkdown(Reply<String>),
}

/// Single writer over the snapshot store: commands run one at a time, so
/// read-modify-write cycles never interleave
pub struct StoreWorker {
    store: SnapshotStore,
    receiver: mpsc::UnboundedReceiver<StoreCommand>,
}

impl StoreWorker {
    pub fn new(store: SnapshotStore, receiver: mpsc::UnboundedReceiver<StoreCommand>) -> Self {
        Self { store, receiver }
    }

    /// Drain commands until every handle is dropped
    pub async fn run(mut self) {
        info!("Store worker started");

        while let Some(command) = self.receiver.recv().await {
            self.dispatch(command).await;
        }

        warn!("Store worker stopped - channel closed");
    }

    async fn dispatch(&self, command: StoreCommand) {
        // A dropped reply receiver only means the caller went away
        match command {
            StoreCommand::List(reply) => {
                let _ = reply.send(self.store.list().await);
            }
            StoreCommand::Search(query, reply) => {
                let _ = reply.send(self.store.search(&query).await);
            }
            StoreCommand::Save(snapshot, reply) => {
                let _ = reply.send(self.store.save(*snapshot).await);
            }
            StoreCommand::Delete(id, reply) => {
                let _ = reply.send(self.store.delete_by_id(&id).await);
            }
            StoreCommand::UpdateIntent(id, intent, reply) => {
                let _ = reply.send(self.store.update_intent(&id, &intent).await);
            }
            StoreCommand::ExportMarkdown(reply) => {
                let _ = reply.send(self.store.to_markdown().await);
            }
        }
    }
}

/// Cloneable front for a running `StoreWorker`
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::UnboundedSender<StoreCommand>,
}

impl StoreHandle {
    /// Spawn a worker owning `store` on the current runtime
    pub fn spawn(store: SnapshotStore) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(StoreWorker::new(store, receiver).run());
        Self { sender }
    }

    pub async fn list(&self) -> Result<Vec<Snapshot>> {
        self.request(StoreCommand::List).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Snapshot>> {
        let query = query.to_string();
        self.request(|reply| StoreCommand::Search(query, reply)).await
    }

    pub async fn save(&self, snapshot: Snapshot) -> Result<SaveOutcome> {
        self.request(|reply| StoreCommand::Save(Box::new(snapshot), reply))
            .await
    }

    pub async fn delete(&self, id: SnapshotId) -> Result<Vec<Snapshot>> {
        self.request(|reply| StoreCommand::Delete(id, reply)).await
    }

    pub async fn update_intent(&self, id: SnapshotId, intent: &str) -> Result<Vec<Snapshot>> {
        let intent = intent.to_string();
        self.request(|reply| StoreCommand::UpdateIntent(id, intent, reply))
            .await
    }

    pub async fn export_markdown(&self) -> Result<String> {
        self.request(StoreCommand::ExportMarkdown).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> StoreCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .map_err(|_| anyhow!("Store worker is not running"))?;
        response
            .await
            .map_err(|_| anyhow!("Store worker dropped the request"))?
    }
}
