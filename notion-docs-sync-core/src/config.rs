use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Options controlling a single synchronise run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Delete remote child pages that no longer have a local document.
    pub prune: bool,
    /// File extensions (without the dot) treated as markdown documents.
    pub extensions: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            prune: false,
            extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }
}

impl SyncOptions {
    pub fn trace_loaded(&self) {
        info!(
            prune = self.prune,
            extensions = ?self.extensions,
            "Loaded sync options"
        );
        debug!(?self, "Sync options loaded (full debug)");
    }
}
