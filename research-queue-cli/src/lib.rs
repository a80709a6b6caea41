//! # research-queue-cli
//!
//! Command-line front end for Research Queue.
//!
//! ## Commands
//!
//! - `research-queue quarters` - List published quarters
//! - `research-queue list` - Flat queue, optionally filtered by status
//! - `research-queue tree` - Topic tree of the quarter
//! - `research-queue show` - One topic with breadcrumb and sub-topics
//! - `research-queue add` / `edit` / `status` / `delete` - Change topics
//! - `research-queue export` / `import` - Snapshot file exchange
//! - `research-queue config` - Print or initialise the settings file
//!
//! ## Configuration
//!
//! Settings are read from `~/.config/research-queue/settings.json` (see
//! [`settings`]), overridable with `--config` or `RESEARCH_QUEUE_CONFIG`.

#![forbid(unsafe_code)]
#![allow(clippy::print_stdout)]

pub mod commands;
pub mod logging;
pub mod settings;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use research_queue_core::{
    DirectorySource, NoRemote, PersistenceResolver, Quarter, Session, Storage,
};

use crate::settings::{RemoteSettings, Settings};

/// Research Queue - quarterly research backlog.
#[derive(Debug, Parser)]
#[command(name = "research-queue")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Quarter to work in (`YYYY-Qn`). Defaults to the current quarter.
    #[arg(long, short = 'q', env = "RESEARCH_QUEUE_QUARTER")]
    pub quarter: Option<String>,

    /// Settings file.
    #[arg(long, env = "RESEARCH_QUEUE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings file in effect.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(settings::settings_file_path)
    }

    /// The `--quarter` flag, parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is not a `YYYY-Qn` token.
    pub fn requested_quarter(&self) -> Result<Option<Quarter>> {
        self.quarter
            .as_deref()
            .map(|token| {
                Quarter::parse(token).with_context(|| format!("Invalid --quarter `{token}`"))
            })
            .transpose()
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List quarters published by the remote source.
    Quarters,
    /// Flat queue of topics in preorder.
    List(commands::view::ListArgs),
    /// Indented topic tree.
    Tree(commands::view::TreeArgs),
    /// One topic with its breadcrumb and sub-topics.
    Show(commands::view::ShowArgs),
    /// Add a root topic, or a sub-topic with `--parent`.
    Add(commands::topics::AddArgs),
    /// Edit a topic's text fields.
    Edit(commands::topics::EditArgs),
    /// Set a topic's status.
    Status(commands::topics::StatusArgs),
    /// Delete a topic and all of its sub-topics.
    Delete(commands::topics::DeleteArgs),
    /// Write the quarter's snapshot document.
    Export(commands::exchange::ExportArgs),
    /// Replace the quarter's topics from a snapshot or legacy file.
    Import(commands::exchange::ImportArgs),
    /// Print the effective settings, or write defaults with `--init`.
    Config(commands::config::ConfigArgs),
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Runs `cli` against the settings in effect.
///
/// # Errors
///
/// Returns an error if the local cache cannot be opened or written, or the
/// command itself fails.
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let config_path = cli.config_path();
    if let Commands::Config(args) = &cli.command {
        return commands::config::execute(args, &config_path, &settings, cli.format);
    }

    let requested = cli.requested_quarter()?;
    let mut session = open_session(&settings, requested).await?;

    let format = cli.format;
    match cli.command {
        Commands::Quarters => commands::view::quarters(&session, format)?,
        Commands::List(args) => commands::view::list(&args, &session, format)?,
        Commands::Tree(args) => commands::view::tree(&args, &session, format)?,
        Commands::Show(args) => commands::view::show(&args, &session, format)?,
        Commands::Add(args) => commands::topics::add(args, &mut session)?,
        Commands::Edit(args) => commands::topics::edit(args, &mut session)?,
        Commands::Status(args) => commands::topics::status(args, &mut session, &settings)?,
        Commands::Delete(args) => commands::topics::delete(&args, &mut session)?,
        Commands::Export(args) => commands::exchange::export(&args, &mut session)?,
        Commands::Import(args) => commands::exchange::import(&args, &mut session)?,
        Commands::Config(args) => {
            commands::config::execute(&args, &config_path, &settings, format)?;
        }
    }

    session.close().context("Failed to save topics")?;
    Ok(())
}

/// Opens the local cache and remote source named by `settings` and loads
/// `quarter`, or the current quarter when `None`.
///
/// # Errors
///
/// Returns an error if the cache file cannot be created or opened.
pub async fn open_session(settings: &Settings, quarter: Option<Quarter>) -> Result<Session> {
    if let Some(parent) = settings.data_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let storage = Storage::open(&settings.data_file)
        .with_context(|| format!("Failed to open cache {}", settings.data_file.display()))?;

    let resolver = match &settings.remote {
        None => PersistenceResolver::new(storage, NoRemote),
        Some(RemoteSettings::Directory(dir)) => {
            PersistenceResolver::new(storage, DirectorySource::new(dir.clone()))
        }
        #[cfg(feature = "remote-http")]
        Some(RemoteSettings::Url(url)) => PersistenceResolver::new(
            storage,
            research_queue_core::HttpSource::new(url.as_str())
                .context("Failed to create HTTP client")?,
        ),
        #[cfg(not(feature = "remote-http"))]
        Some(RemoteSettings::Url(url)) => {
            log::warn!("built without remote-http; ignoring remote {url}");
            PersistenceResolver::new(storage, NoRemote)
        }
    };

    let session = match quarter {
        Some(quarter) => Session::open_at(resolver, quarter).await,
        None => Session::open(resolver).await,
    };
    Ok(session.with_edit_delay(Duration::from_millis(settings.edit_debounce_ms)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from([
            "research-queue",
            "--quarter",
            "2024-Q3",
            "--format",
            "json",
            "list",
            "--status",
            "done",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(
            cli.requested_quarter().unwrap(),
            Some(Quarter::parse("2024-Q3").unwrap())
        );
        assert!(matches!(
            cli.command,
            Commands::List(ref args) if args.status.as_deref() == Some("done")
        ));
    }

    #[tokio::test]
    async fn test_open_session_with_directory_remote() {
        let dir = tempfile::TempDir::new().unwrap();
        let published = dir.path().join("site");
        std::fs::create_dir_all(published.join("data")).unwrap();
        std::fs::write(
            published.join("data").join("index.json"),
            r#"{"quarters":["2024-Q3","2024-Q4"]}"#,
        )
        .unwrap();

        let settings = Settings {
            data_file: dir.path().join("cache").join("queue.sqlite3"),
            remote: Some(RemoteSettings::Directory(published)),
            ..Settings::default()
        };
        let session = open_session(&settings, Some(Quarter::parse("2024-Q3").unwrap()))
            .await
            .unwrap();

        assert!(settings.data_file.exists());
        assert_eq!(session.quarter(), Quarter::parse("2024-Q3").unwrap());
        assert_eq!(
            session.available_quarters(),
            &[Quarter::parse("2024-Q3").unwrap(), Quarter::parse("2024-Q4").unwrap()]
        );
    }

    #[test]
    fn test_bad_quarter_flag_is_reported() {
        let cli = Cli::parse_from(["research-queue", "--quarter", "Q3", "tree"]);
        assert!(cli.requested_quarter().is_err());
    }

    #[test]
    fn test_add_with_parent() {
        let cli = Cli::parse_from([
            "research-queue",
            "add",
            "Pratt parsing",
            "--parent",
            "abc",
            "--description",
            "operator precedence",
        ]);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.title, "Pratt parsing");
                assert_eq!(args.parent.as_deref(), Some("abc"));
                assert_eq!(args.description, "operator precedence");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_delete_is_unconfirmed_by_default() {
        let cli = Cli::parse_from(["research-queue", "delete", "abc"]);
        assert!(matches!(cli.command, Commands::Delete(ref args) if !args.yes));
    }
}
