//! Scanning of the local documentation tree.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("documentation path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to walk documentation tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One markdown file of the documentation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the documentation root, e.g. `guide/install.md`.
    pub relative_path: PathBuf,
    /// Page titles from the root page down to this document's own page.
    pub page_path: Vec<String>,
    pub markdown: String,
}

impl Document {
    pub fn title(&self) -> &str {
        self.page_path.last().map(String::as_str).unwrap_or_default()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Collect every document under `root` whose extension is one of
/// `extensions`, sorted by relative path. Hidden files and directories are
/// skipped.
pub fn scan_docs(root: &Path, extensions: &[String]) -> Result<Vec<Document>, DocsError> {
    if !root.is_dir() {
        return Err(DocsError::NotADirectory(root.to_path_buf()));
    }
    info!(root = %root.display(), "Scanning documentation tree");

    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, extensions) {
            continue;
        }
        let relative_path = match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let markdown = fs::read_to_string(path).map_err(|source| DocsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let page_path = page_path(&relative_path);
        if page_path.is_empty() {
            warn!(path = %relative_path.display(), "Document has no usable title, skipping");
            continue;
        }
        debug!(path = %relative_path.display(), bytes = markdown.len(), "Found document");
        documents.push(Document {
            relative_path,
            page_path,
            markdown,
        });
    }

    documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(count = documents.len(), "Documentation tree scanned");
    Ok(documents)
}

/// Directory components followed by the file stem.
fn page_path(relative_path: &Path) -> Vec<String> {
    let mut titles: Vec<String> = relative_path
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    if let Some(stem) = relative_path.file_stem() {
        titles.push(stem.to_string_lossy().into_owned());
    }
    titles.retain(|t| !t.is_empty());
    titles
}
