//! A [`Publisher`] wrapper that reads from the real destination but never
//! writes to it.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::contract::{PublishError, Publisher, RemoteBlock, RemotePage};

/// A write the dry run would have performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedWrite {
    CreatePage { parent_id: String, title: String },
    AppendChildren { block_id: String, count: usize },
    DeleteBlock { block_id: String },
}

pub struct DryRunPublisher<P> {
    inner: P,
    fake_ids: Mutex<HashSet<String>>,
    writes: Mutex<Vec<PlannedWrite>>,
}

impl<P: Publisher> DryRunPublisher<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            fake_ids: Mutex::new(HashSet::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every write that was suppressed, in call order.
    pub fn planned_writes(&self) -> Vec<PlannedWrite> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    fn record(&self, write: PlannedWrite) {
        info!(?write, "[DRY RUN] Skipping write");
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(write);
        }
    }

    fn fake_id(&self) -> String {
        let id = Uuid::new_v4().to_string();
        if let Ok(mut ids) = self.fake_ids.lock() {
            ids.insert(id.clone());
        }
        id
    }

    fn is_fake(&self, id: &str) -> bool {
        self.fake_ids
            .lock()
            .map(|ids| ids.contains(id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl<P: Publisher> Publisher for DryRunPublisher<P> {
    async fn list_children(&self, block_id: &str) -> Result<Vec<RemoteBlock>, PublishError> {
        // Pages that were only pretended into existence have no children.
        if self.is_fake(block_id) {
            return Ok(Vec::new());
        }
        self.inner.list_children(block_id).await
    }

    async fn create_page(&self, parent_id: &str, title: &str) -> Result<RemotePage, PublishError> {
        self.record(PlannedWrite::CreatePage {
            parent_id: parent_id.to_string(),
            title: title.to_string(),
        });
        Ok(RemotePage { id: self.fake_id() })
    }

    async fn append_children(
        &self,
        block_id: &str,
        children: Vec<Value>,
    ) -> Result<Vec<RemoteBlock>, PublishError> {
        self.record(PlannedWrite::AppendChildren {
            block_id: block_id.to_string(),
            count: children.len(),
        });
        Ok(children
            .iter()
            .map(|child| {
                let kind = child
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                RemoteBlock {
                    id: self.fake_id(),
                    body: child.get(&kind).cloned().unwrap_or(Value::Null),
                    kind,
                    has_children: false,
                    child_page_title: None,
                }
            })
            .collect())
    }

    async fn delete_block(&self, block_id: &str) -> Result<(), PublishError> {
        self.record(PlannedWrite::DeleteBlock {
            block_id: block_id.to_string(),
        });
        Ok(())
    }
}
