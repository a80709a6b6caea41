//! Snapshot export and document import.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use research_queue_core::{read_document, write_snapshot, ResearchQueueError, Session};

/// Arguments for the export command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout. Publish it as
    /// `data/<quarter>/queue.json`.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Arguments for the import command.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Snapshot document or legacy topic array.
    pub path: PathBuf,

    /// Replace the quarter's topics without asking.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Writes the active quarter's snapshot document.
pub fn export(args: &ExportArgs, session: &mut Session) -> Result<()> {
    let doc = session.export_snapshot()?;
    match &args.out {
        Some(path) => {
            write_snapshot(path, &doc).map_err(|e| anyhow!(ResearchQueueError::from(e).user_message()))?;
            eprintln!(
                "Exported {} topic(s) ({} sub-topic(s)) of {} to {}",
                doc.topic_count,
                doc.sub_topic_count,
                doc.quarter,
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&doc)?),
    }
    Ok(())
}

/// Replaces the topics of the document's quarter once confirmed with `--yes`.
pub fn import(args: &ImportArgs, session: &mut Session) -> Result<()> {
    let doc = read_document(&args.path, session.quarter())
        .map_err(|e| anyhow!(ResearchQueueError::from(e).user_message()))?;
    if !args.yes {
        println!("{}", doc.confirmation_prompt());
        bail!("Not imported; re-run with --yes to confirm");
    }
    let outcome = session.apply_import(doc)?;
    if outcome.switched_quarter {
        eprintln!("Switched to {}", outcome.quarter);
    }
    eprintln!(
        "Imported {} topic(s) ({} total with sub-topics) into {}",
        outcome.stats.topic_count,
        outcome.stats.total(),
        outcome.quarter
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_queue_core::{NoRemote, PersistenceResolver, Quarter, Storage};
    use std::fs;
    use tempfile::TempDir;

    async fn session() -> Session {
        let resolver = PersistenceResolver::new(Storage::open_in_memory().unwrap(), NoRemote)
            .with_initial_quarter(Quarter::parse("2024-Q3").unwrap());
        Session::open(resolver).await
    }

    #[tokio::test]
    async fn test_import_rejects_garbage_with_user_message() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "42").unwrap();

        let mut session = session().await;
        let args = ImportArgs { path, yes: true };
        let err = import(&args, &mut session).unwrap_err();
        assert_eq!(err.to_string(), "Failed to import: invalid JSON file.");
    }

    #[tokio::test]
    async fn test_export_then_import_into_other_quarter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.json");

        let mut source = session().await;
        source.create_topic("Parsing", "").unwrap();
        export(&ExportArgs { out: Some(path.clone()) }, &mut source).unwrap();
        assert!(!source.has_unsaved_changes());

        let resolver = PersistenceResolver::new(Storage::open_in_memory().unwrap(), NoRemote)
            .with_initial_quarter(Quarter::parse("2025-Q1").unwrap());
        let mut target = Session::open(resolver).await;
        import(&ImportArgs { path, yes: true }, &mut target).unwrap();

        assert_eq!(target.quarter(), Quarter::parse("2024-Q3").unwrap());
        assert_eq!(target.topics().len(), 1);
        assert_eq!(target.topics()[0].title, "Parsing");
    }

    #[tokio::test]
    async fn test_unconfirmed_import_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(&path, r#"[{"id":"x","title":"Legacy"}]"#).unwrap();

        let mut session = session().await;
        assert!(import(&ImportArgs { path, yes: false }, &mut session).is_err());
        assert!(session.topics().is_empty());
    }
}
