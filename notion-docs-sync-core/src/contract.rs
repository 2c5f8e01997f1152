//! # contract: the publishing seam between the sync pipeline and Notion
//!
//! This module defines a single trait (`Publisher`) and the plain data types
//! it exchanges. The synchronise pipeline only ever talks to a `Publisher`,
//! so the real HTTP client, the dry-run wrapper and test mocks are
//! interchangeable.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, exported as `MockPublisher` when
//!   the `test-export-mocks` feature is on (default), so dependents can use it
//!   in their integration tests.
//!
//! ## Adding New Destinations
//! - Implement the trait for your destination.
//! - Map transport failures onto [`PublishError`] variants; the pipeline
//!   reports them per document and stops.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// A block as it currently exists on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlock {
    pub id: String,
    /// The API block type, e.g. `paragraph` or `child_page`.
    pub kind: String,
    pub has_children: bool,
    /// The type specific object of the block, e.g. the value of its
    /// `paragraph` key: rich text, code language, image url, cells.
    pub body: Value,
    /// Title of a `child_page` block.
    pub child_page_title: Option<String>,
}

impl RemoteBlock {
    /// Child pages and databases are structure, not page content.
    pub fn is_structural(&self) -> bool {
        self.kind == "child_page" || self.kind == "child_database"
    }
}

/// A page returned after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transport error: {0}")]
    Http(String),
    #[error("Notion API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

/// Trait for reading and writing the remote page tree.
///
/// All ids are Notion block/page ids; pages are blocks, so a page id can be
/// passed wherever a block id is expected.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// List every direct child block of `block_id`, following pagination.
    async fn list_children(&self, block_id: &str) -> Result<Vec<RemoteBlock>, PublishError>;

    /// Create a page titled `title` beneath `parent_id`.
    async fn create_page(&self, parent_id: &str, title: &str) -> Result<RemotePage, PublishError>;

    /// Append API block payloads to `block_id`, returning the created blocks
    /// in order.
    async fn append_children(
        &self,
        block_id: &str,
        children: Vec<Value>,
    ) -> Result<Vec<RemoteBlock>, PublishError>;

    /// Delete (archive) a block or page.
    async fn delete_block(&self, block_id: &str) -> Result<(), PublishError>;
}
