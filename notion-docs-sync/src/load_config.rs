/// `load_config` module: Loads the optional static YAML config file into the
/// settings the CLI needs beyond its three invocation arguments.
///
/// # Responsibilities
/// - Parse the user-supplied YAML configuration file into type-safe structs
/// - Supply defaults for every key, so an absent file or section is valid
/// - Produce clear diagnostics: read and parse failures are distinct errors
///
/// Secrets never live in this file. The Notion token arrives through the
/// `--token` flag or the `NOTION_TOKEN` environment variable.
///
/// Accepted schema:
///
/// ```yaml
/// api:
///   base_url: https://api.notion.com
///   notion_version: "2022-06-28"
///   max_retries: 3
///   retry_base_delay_ms: 500
///   max_retry_delay_ms: 60000
///   timeout_secs: 30
/// sync:
///   prune: false
///   extensions: [md, markdown]
/// ```
use anyhow::Result;
use notion_docs_sync_core::config::SyncOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub api: ApiSection,
    pub sync: SyncOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub notion_version: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Upper bound for any single wait between retries, including waits the
    /// server asks for with `Retry-After`.
    pub max_retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            max_retries: 3,
            retry_base_delay_ms: 500,
            max_retry_delay_ms: 60_000,
            timeout_secs: 30,
        }
    }
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    if config_content.trim().is_empty() {
        return Ok(CliConfig::default());
    }

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.sync.extensions.is_empty() {
        anyhow::bail!("sync.extensions must name at least one file extension");
    }

    info!(
        base_url = %config.api.base_url,
        notion_version = %config.api.notion_version,
        max_retries = config.api.max_retries,
        "Config loaded successfully"
    );
    Ok(config)
}
