//! High-level pipeline: orchestrates scan → convert → diff → publish for a
//! documentation tree.
//!
//! For every markdown document under the docs root this module:
//!   - resolves (or creates) the page chain mirroring the document's path
//!     beneath the destination page, one child page per directory
//!   - converts the markdown into blocks and plans the API payloads
//!   - compares the planned content with what the page currently holds
//!     (formatting, links, code languages, image urls, table rows and nested
//!     list items included) and rewrites the page only when they differ
//!
//! Re-running over unchanged docs performs no writes. With
//! [`SyncOptions::prune`] set, child pages of every page used as a parent
//! during the run that match no local document or directory are deleted.
//!
//! # Error Handling
//! Fail fast: the first publisher error aborts the run with a [`SyncError`]
//! naming the document being published.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::SyncOptions;
use crate::contract::{PublishError, Publisher, RemoteBlock};
use crate::docs::{scan_docs, DocsError, Document};
use crate::markdown;
use crate::payload::{
    content_hash, fingerprint_planned, fingerprint_remote, plan_all, FingerprintTree,
    PlannedBlock, MAX_BLOCKS_PER_REQUEST,
};
use crate::target::PageId;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Docs(#[from] DocsError),
    #[error("failed to publish {}: {source}", path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: PublishError,
    },
    #[error("failed to prune page {title:?}: {source}")]
    Prune {
        title: String,
        #[source]
        source: PublishError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// The page did not exist and was created with the document's content.
    Created,
    /// The page existed with different content and was rewritten.
    Updated,
    /// The page already matched the document; nothing was written.
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub relative_path: PathBuf,
    pub page_id: String,
    pub outcome: SyncOutcome,
    pub block_count: usize,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrunedPage {
    pub parent_id: String,
    pub page_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SynchroniseReport {
    pub documents: Vec<DocumentReport>,
    pub pruned: Vec<PrunedPage>,
}

impl SynchroniseReport {
    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.documents
            .iter()
            .filter(|d| d.outcome == outcome)
            .count()
    }
}

/// Cached view of the remote page tree for one run.
struct PageTree {
    root_id: String,
    listings: HashMap<String, Vec<RemoteBlock>>,
    created: HashSet<String>,
    /// Child page titles each parent is expected to keep.
    expected: BTreeMap<String, BTreeSet<String>>,
}

impl PageTree {
    fn new(root_id: String) -> Self {
        Self {
            root_id,
            listings: HashMap::new(),
            created: HashSet::new(),
            expected: BTreeMap::new(),
        }
    }

    async fn children<P: Publisher + ?Sized>(
        &mut self,
        publisher: &P,
        page_id: &str,
    ) -> Result<&[RemoteBlock], PublishError> {
        if !self.listings.contains_key(page_id) {
            let listing = publisher.list_children(page_id).await?;
            debug!(page_id, count = listing.len(), "[SYNC] Listed page children");
            self.listings.insert(page_id.to_string(), listing);
        }
        Ok(self
            .listings
            .get(page_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Walk `page_path` from the root, creating missing pages, and return
    /// the id of the last page.
    async fn resolve<P: Publisher + ?Sized>(
        &mut self,
        publisher: &P,
        page_path: &[String],
    ) -> Result<String, PublishError> {
        let mut parent = self.root_id.clone();
        for title in page_path {
            self.expected
                .entry(parent.clone())
                .or_default()
                .insert(title.clone());

            let existing = self
                .children(publisher, &parent)
                .await?
                .iter()
                .find(|b| b.kind == "child_page" && b.child_page_title.as_deref() == Some(title.as_str()))
                .map(|b| b.id.clone());

            parent = match existing {
                Some(id) => id,
                None => {
                    info!(parent = %parent, title = %title, "[SYNC] Creating page");
                    let page = publisher.create_page(&parent, title).await?;
                    if let Some(listing) = self.listings.get_mut(&parent) {
                        listing.push(RemoteBlock {
                            id: page.id.clone(),
                            kind: "child_page".to_string(),
                            has_children: false,
                            body: json!({ "title": title }),
                            child_page_title: Some(title.clone()),
                        });
                    }
                    self.listings.insert(page.id.clone(), Vec::new());
                    self.created.insert(page.id.clone());
                    page.id
                }
            };
        }
        Ok(parent)
    }
}

/// Entrypoint: publish every document under `docs_root` beneath `root_page`.
pub async fn synchronise<P>(
    options: &SyncOptions,
    publisher: &P,
    docs_root: &Path,
    root_page: &PageId,
) -> Result<SynchroniseReport, SyncError>
where
    P: Publisher + ?Sized,
{
    info!(docs_root = %docs_root.display(), root_page = %root_page, "[SYNC] Starting synchronisation");

    let documents = scan_docs(docs_root, &options.extensions).map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Failed to scan documentation");
        e
    })?;

    let mut tree = PageTree::new(root_page.hyphenated());
    let mut report = SynchroniseReport::default();

    for document in &documents {
        let result = publish_document(&mut tree, publisher, document).await;
        match result {
            Ok(doc_report) => {
                info!(
                    path = %doc_report.relative_path.display(),
                    outcome = ?doc_report.outcome,
                    blocks = doc_report.block_count,
                    "[SYNC] Document synchronised"
                );
                report.documents.push(doc_report);
            }
            Err(source) => {
                error!(path = %document.relative_path.display(), error = %source, "[SYNC][ERROR] Publishing failed");
                return Err(SyncError::Publish {
                    path: document.relative_path.clone(),
                    source,
                });
            }
        }
    }

    if options.prune {
        report.pruned = prune(&tree, publisher).await?;
    }

    info!(
        created = report.count(SyncOutcome::Created),
        updated = report.count(SyncOutcome::Updated),
        unchanged = report.count(SyncOutcome::Unchanged),
        pruned = report.pruned.len(),
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}

async fn publish_document<P: Publisher + ?Sized>(
    tree: &mut PageTree,
    publisher: &P,
    document: &Document,
) -> Result<DocumentReport, PublishError> {
    let page_id = tree.resolve(publisher, &document.page_path).await?;
    let created = tree.created.contains(&page_id);

    let blocks = markdown::convert(&document.markdown);
    let planned = plan_all(&blocks);
    let hash = content_hash(&planned);

    let existing: Vec<RemoteBlock> = tree.children(publisher, &page_id).await?.to_vec();
    let expected = fingerprint_planned(&planned);
    let unchanged = !created && matches_remote(publisher, &existing, &expected).await?;

    let outcome = if unchanged {
        SyncOutcome::Unchanged
    } else {
        for block in existing.iter().filter(|b| !b.is_structural()) {
            publisher.delete_block(&block.id).await?;
        }
        let appended = append_planned(publisher, &page_id, &planned).await?;

        let mut listing: Vec<RemoteBlock> =
            existing.into_iter().filter(|b| b.is_structural()).collect();
        listing.extend(appended);
        tree.listings.insert(page_id.clone(), listing);

        if created {
            SyncOutcome::Created
        } else {
            SyncOutcome::Updated
        }
    };

    Ok(DocumentReport {
        relative_path: document.relative_path.clone(),
        page_id,
        outcome,
        block_count: planned.len(),
        content_hash: hash,
    })
}

/// Whether the remote content under one parent renders the same as
/// `expected`. Children are only listed once their parents match.
fn matches_remote<'a, P: Publisher + ?Sized>(
    publisher: &'a P,
    remote: &'a [RemoteBlock],
    expected: &'a [FingerprintTree],
) -> BoxFuture<'a, Result<bool, PublishError>> {
    async move {
        let content: Vec<&RemoteBlock> =
            remote.iter().filter(|b| !b.is_structural()).collect();
        if content.len() != expected.len() {
            return Ok(false);
        }
        if content
            .iter()
            .zip(expected)
            .any(|(block, tree)| fingerprint_remote(block) != tree.entry)
        {
            return Ok(false);
        }
        for (block, tree) in content.iter().zip(expected) {
            if !block.has_children {
                continue;
            }
            let children = publisher.list_children(&block.id).await?;
            if !matches_remote(publisher, &children, &tree.children).await? {
                debug!(block_id = %block.id, "[SYNC] Nested content differs");
                return Ok(false);
            }
        }
        Ok(true)
    }
    .boxed()
}

/// Append `blocks` beneath `parent_id` in request-sized chunks, then each
/// block's own children beneath the block that was created for it.
///
/// Returns the top-level blocks that were created.
fn append_planned<'a, P: Publisher + ?Sized>(
    publisher: &'a P,
    parent_id: &'a str,
    blocks: &'a [PlannedBlock],
) -> BoxFuture<'a, Result<Vec<RemoteBlock>, PublishError>> {
    async move {
        let mut appended = Vec::with_capacity(blocks.len());
        for chunk in blocks.chunks(MAX_BLOCKS_PER_REQUEST) {
            let payloads = chunk.iter().map(|b| b.payload.clone()).collect();
            let created = publisher.append_children(parent_id, payloads).await?;

            let needs_children = chunk.iter().any(|b| !b.children.is_empty());
            if needs_children && created.len() != chunk.len() {
                return Err(PublishError::Decode(format!(
                    "appended {} blocks but {} were returned",
                    chunk.len(),
                    created.len()
                )));
            }
            for (planned, remote) in chunk.iter().zip(created.iter()) {
                if !planned.children.is_empty() {
                    append_planned(publisher, &remote.id, &planned.children).await?;
                }
            }
            appended.extend(created);
        }
        Ok(appended)
    }
    .boxed()
}

async fn prune<P: Publisher + ?Sized>(
    tree: &PageTree,
    publisher: &P,
) -> Result<Vec<PrunedPage>, SyncError> {
    let mut pruned = Vec::new();
    for (parent_id, keep) in &tree.expected {
        let Some(listing) = tree.listings.get(parent_id) else {
            continue;
        };
        for block in listing.iter().filter(|b| b.kind == "child_page") {
            let title = block.child_page_title.clone().unwrap_or_default();
            if keep.contains(&title) {
                continue;
            }
            info!(parent = %parent_id, title = %title, "[SYNC] Pruning page with no local document");
            publisher
                .delete_block(&block.id)
                .await
                .map_err(|source| SyncError::Prune {
                    title: title.clone(),
                    source,
                })?;
            pruned.push(PrunedPage {
                parent_id: parent_id.clone(),
                page_id: block.id.clone(),
                title,
            });
        }
    }
    Ok(pruned)
}
