use anyhow::{Context, Result};
use serde::Serialize;
use snapmark_schemas::{Action, MessageRequest, MessageResponse, Snapshot, SnapshotId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::kv::SqliteKeyValueStore;
use crate::llm::{LLMClient, LanguageModel};
use crate::network::HttpProbe;
use crate::page::PageSource;
use crate::pipeline::CapturePipeline;
use crate::store::SnapshotStore;
use crate::worker::StoreHandle;

/// Request-level failures; the messages are part of the protocol
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("No action specified")]
    NoAction,
    #[error("Unknown action: {action}")]
    UnknownAction { action: String },
    #[error("Missing snapshot ID")]
    MissingId,
    #[error("Missing ID or intent")]
    MissingIntent,
    #[error("No active tab found")]
    NoActiveTab,
}

/// Message protocol front: one request in, one `{success, data, error}` envelope out
#[derive(Clone)]
pub struct SnapmarkService {
    pipeline: Arc<CapturePipeline>,
    store: StoreHandle,
}

impl SnapmarkService {
    pub fn new(pipeline: Arc<CapturePipeline>, store: StoreHandle) -> Self {
        Self { pipeline, store }
    }

    /// Wire up SQLite storage, the HTTP probe and the optional model client.
    /// Must be called inside a tokio runtime.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let kv = SqliteKeyValueStore::new(&config.db_path)?;
        let probe = HttpProbe::new(config.probe_url.clone())?;
        let model = LLMClient::from_env_optional().map(|client| {
            info!(
                "Model summaries enabled ({:?}, {})",
                client.config().provider,
                client.config().model
            );
            Arc::new(client) as Arc<dyn LanguageModel>
        });

        let pipeline = CapturePipeline::new(Arc::new(probe), model)
            .with_probe_timeout(config.probe_timeout);
        let store = StoreHandle::spawn(SnapshotStore::new(Arc::new(kv)));

        Ok(Self::new(Arc::new(pipeline), store))
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Handle one protocol request. Never fails; errors become failure envelopes.
    pub async fn handle(&self, request: MessageRequest, pages: &dyn PageSource) -> MessageResponse {
        let action = request.action.clone().unwrap_or_default();

        match self.dispatch(request, pages).await {
            Ok(data) => MessageResponse::ok(data),
            Err(e) => {
                error!("Request {:?} failed: {}", action, e);
                MessageResponse::failure(e.to_string())
            }
        }
    }

    /// Capture the page source's active tab and store it
    pub async fn capture(&self, pages: &dyn PageSource) -> Result<Snapshot> {
        let tab = pages.active_tab().await.ok_or(RequestError::NoActiveTab)?;
        let snapshot = self.pipeline.capture(pages, &tab).await;
        let outcome = self.store.save(snapshot).await?;
        Ok(outcome.stored)
    }

    async fn dispatch(
        &self,
        request: MessageRequest,
        pages: &dyn PageSource,
    ) -> Result<serde_json::Value> {
        let name = request
            .action
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(RequestError::NoAction)?;
        let action = Action::parse(name).ok_or_else(|| RequestError::UnknownAction {
            action: name.to_string(),
        })?;

        info!("Handling {}", action);

        match action {
            Action::CaptureCurrentTab => to_data(&self.capture(pages).await?),
            Action::GetSnapshots => to_data(&self.store.list().await?),
            Action::SearchSnapshots => {
                let query = request.query.unwrap_or_default();
                to_data(&self.store.search(&query).await?)
            }
            Action::DeleteSnapshot => {
                let id = required(request.id).ok_or(RequestError::MissingId)?;
                to_data(&self.store.delete(SnapshotId(id)).await?)
            }
            Action::UpdateSnapshotIntent => {
                let (id, intent) = required(request.id)
                    .zip(required(request.new_intent))
                    .ok_or(RequestError::MissingIntent)?;
                to_data(&self.store.update_intent(SnapshotId(id), &intent).await?)
            }
            Action::ExportMarkdown => to_data(&self.store.export_markdown().await?),
        }
    }
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

fn to_data<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).context("Failed to serialize response")
}
