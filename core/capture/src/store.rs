use anyhow::{bail, Context, Result};
use serde_json::Value;
use snapmark_export::MarkdownRenderer;
use snapmark_schemas::{Snapshot, SnapshotId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::kv::KeyValueStore;

/// Storage key holding the whole snapshot sequence
pub const SNAPSHOTS_KEY: &str = "snapmark_snapshots";
/// Capacity bound; the oldest records are evicted beyond it
pub const MAX_SNAPSHOTS: usize = 100;
/// Repeat captures of a url inside this window are suppressed
pub const DUPLICATE_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Result of a save attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// Store contents after the save, most recent first
    pub snapshots: Vec<Snapshot>,
    /// The record now held for this capture: the new one, or the earlier duplicate
    pub stored: Snapshot,
    pub duplicate: bool,
}

/// Bounded, most-recent-first snapshot sequence kept under a single key.
/// Every operation is a read-modify-write of the whole sequence; callers
/// that share a store serialize through `StoreHandle`.
pub struct SnapshotStore {
    kv: Arc<dyn KeyValueStore>,
    renderer: MarkdownRenderer,
}

impl SnapshotStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            renderer: MarkdownRenderer::new(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Snapshot>> {
        let value = self
            .kv
            .get_or(SNAPSHOTS_KEY, Value::Array(Vec::new()))
            .await?;

        // Unreadable stored data is an error, never an empty list
        let Value::Array(items) = value else {
            warn!("Value under {} is not a snapshot array", SNAPSHOTS_KEY);
            bail!("Stored snapshots under {} are not an array", SNAPSHOTS_KEY);
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<Snapshot>(item)
                    .with_context(|| format!("Unreadable snapshot record at index {}", index))
            })
            .collect()
    }

    pub async fn get(&self, id: &SnapshotId) -> Result<Option<Snapshot>> {
        Ok(self.list().await?.into_iter().find(|s| &s.id == id))
    }

    /// Prepend `snapshot` unless it duplicates a recent capture, then evict beyond capacity
    pub async fn save(&self, snapshot: Snapshot) -> Result<SaveOutcome> {
        let mut snapshots = self.list().await?;

        if let Some(existing) = snapshots.iter().find(|s| is_duplicate(s, &snapshot)) {
            info!(
                "Duplicate capture of {} within window, keeping {}",
                snapshot.url, existing.id
            );
            let stored = existing.clone();
            return Ok(SaveOutcome {
                snapshots,
                stored,
                duplicate: true,
            });
        }

        snapshots.insert(0, snapshot.clone());
        if snapshots.len() > MAX_SNAPSHOTS {
            let evicted = snapshots.len() - MAX_SNAPSHOTS;
            snapshots.truncate(MAX_SNAPSHOTS);
            debug!("Evicted {} oldest snapshots", evicted);
        }

        self.persist(&snapshots).await?;
        info!("Saved snapshot {} ({} stored)", snapshot.id, snapshots.len());

        Ok(SaveOutcome {
            snapshots,
            stored: snapshot,
            duplicate: false,
        })
    }

    /// Remove the record with `id`; an unknown id leaves the store untouched
    pub async fn delete_by_id(&self, id: &SnapshotId) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.list().await?;
        let before = snapshots.len();
        snapshots.retain(|s| &s.id != id);

        if snapshots.len() == before {
            debug!("Delete of unknown snapshot {} ignored", id);
            return Ok(snapshots);
        }

        self.persist(&snapshots).await?;
        info!("Deleted snapshot {}", id);
        Ok(snapshots)
    }

    /// Replace only the intent of the record with `id`
    pub async fn update_intent(&self, id: &SnapshotId, new_intent: &str) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.list().await?;

        let Some(snapshot) = snapshots.iter_mut().find(|s| &s.id == id) else {
            debug!("Intent update for unknown snapshot {} ignored", id);
            return Ok(snapshots);
        };
        snapshot.intent = new_intent.trim().to_string();

        self.persist(&snapshots).await?;
        info!("Updated intent of snapshot {}", id);
        Ok(snapshots)
    }

    /// Case-insensitive substring search; a blank query returns everything
    pub async fn search(&self, query: &str) -> Result<Vec<Snapshot>> {
        let snapshots = self.list().await?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(snapshots);
        }

        Ok(snapshots.into_iter().filter(|s| s.matches(&needle)).collect())
    }

    pub async fn to_markdown(&self) -> Result<String> {
        let snapshots = self.list().await?;
        Ok(self.renderer.render(&snapshots))
    }

    async fn persist(&self, snapshots: &[Snapshot]) -> Result<()> {
        let value = serde_json::to_value(snapshots).context("Failed to serialize snapshots")?;
        self.kv.set(SNAPSHOTS_KEY, value).await
    }
}

fn is_duplicate(existing: &Snapshot, candidate: &Snapshot) -> bool {
    existing.id == candidate.id
        || (existing.url == candidate.url
            && candidate.created_at - existing.created_at < DUPLICATE_WINDOW_MS)
}
