///
/// This module implements the CLI interface for notion-docs-sync: argument
/// parsing, the invocation contract used by wrappers, and the async entrypoint.
///
/// All business logic (markdown conversion, docs scanning, the sync pipeline)
/// lives in the [`notion-docs-sync-core`] crate. This module is strictly CLI
/// glue and orchestration.
///
/// ## Invocation contract
/// Wrappers start the binary as
///
/// ```text
/// notion-docs-sync --token=<TOKEN> -- <DOCS_PATH> <NOTION_URL>
/// ```
///
/// and [`Invocation::args`] builds exactly that argument list. The attached
/// token and the `--` separator keep values that look like flags from being
/// read as flags, so parsing it back yields the same three values, unmodified.
///
/// [`notion-docs-sync-core`]: ../../notion-docs-sync-core/
use crate::load_config::{load_config, CliConfig};
use crate::upload::NotionClient;
use anyhow::{Context, Result};
use clap::Parser;
use notion_docs_sync_core::dry_run::DryRunPublisher;
use notion_docs_sync_core::synchronise::{synchronise, SyncOutcome, SynchroniseReport};
use notion_docs_sync_core::target::PageId;
use std::fmt;
use std::path::PathBuf;

/// Conventional location of the documentation directory.
pub const DEFAULT_DOCS_PATH: &str = "docs";

/// CLI for notion-docs-sync: publish markdown documentation to Notion.
#[derive(Parser)]
#[clap(
    name = "notion-docs-sync",
    version,
    about = "Publish a directory of markdown documentation to a Notion page tree",
    allow_missing_positional = true
)]
pub struct Cli {
    /// Notion integration token
    #[clap(long, env = "NOTION_TOKEN", hide_env_values = true, allow_hyphen_values = true)]
    pub token: String,

    /// Directory of markdown documents to publish
    #[clap(default_value = DEFAULT_DOCS_PATH, allow_hyphen_values = true)]
    pub docs_path: PathBuf,

    /// URL of the Notion page the documents are published beneath
    #[clap(allow_hyphen_values = true)]
    pub notion_url: String,

    /// Optional YAML config file (API and sync settings, no secrets)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Read the destination and report what would change, without writing
    #[clap(long)]
    pub dry_run: bool,

    /// Delete remote pages that no longer have a local document
    #[clap(long)]
    pub prune: bool,
}

impl Cli {
    /// The three forwarded values, as received.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            token: self.token.clone(),
            docs_path: self.docs_path.to_string_lossy().into_owned(),
            notion_url: self.notion_url.clone(),
        }
    }
}

/// The three strings a wrapper forwards to the binary.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub token: String,
    pub docs_path: String,
    pub notion_url: String,
}

impl Invocation {
    pub fn new(token: impl Into<String>, docs_path: Option<&str>, notion_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            docs_path: docs_path.unwrap_or(DEFAULT_DOCS_PATH).to_string(),
            notion_url: notion_url.into(),
        }
    }

    /// `--token=<token> -- <docs_path> <notion_url>`, in that order.
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("--token={}", self.token),
            "--".to_string(),
            self.docs_path.clone(),
            self.notion_url.clone(),
        ]
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("token", &"<redacted>")
            .field("docs_path", &self.docs_path)
            .field("notion_url", &self.notion_url)
            .finish()
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    let mut options = config.sync.clone();
    options.prune |= cli.prune;
    options.trace_loaded();

    let root_page = PageId::from_url(&cli.notion_url)
        .with_context(|| format!("Invalid Notion URL {:?}", cli.notion_url))?;
    let client = NotionClient::new(&cli.token, &config.api)
        .context("Failed to construct Notion client")?;

    tracing::info!(
        command = "sync",
        docs_path = %cli.docs_path.display(),
        root_page = %root_page,
        dry_run = cli.dry_run,
        "Starting synchronisation process"
    );

    let result = if cli.dry_run {
        let publisher = DryRunPublisher::new(client);
        let result = synchronise(&options, &publisher, &cli.docs_path, &root_page).await;
        tracing::info!(
            suppressed_writes = publisher.planned_writes().len(),
            "[DRY RUN] No changes were written"
        );
        result
    } else {
        synchronise(&options, &client, &cli.docs_path, &root_page).await
    };

    match result {
        Ok(report) => {
            tracing::info!(command = "sync", documents = report.documents.len(), "Synchronisation complete");
            print_report(&report, cli.dry_run);
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            Err(anyhow::Error::new(e))
        }
    }
}

fn print_report(report: &SynchroniseReport, dry_run: bool) {
    let heading = if dry_run {
        "Synchronise dry run complete."
    } else {
        "Synchronise complete."
    };
    println!("{heading}");
    for doc in &report.documents {
        println!("  {:<9} {}", format!("{:?}", doc.outcome), doc.relative_path.display());
    }
    for page in &report.pruned {
        println!("  {:<9} {}", "Pruned", page.title);
    }
    println!(
        "{} created, {} updated, {} unchanged, {} pruned",
        report.count(SyncOutcome::Created),
        report.count(SyncOutcome::Updated),
        report.count(SyncOutcome::Unchanged),
        report.pruned.len()
    );
}
