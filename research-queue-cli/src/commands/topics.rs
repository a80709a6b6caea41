//! Commands that change topics in the active quarter.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use research_queue_core::{FieldPatch, Session, TopicStatus};

use crate::settings::Settings;

/// Arguments for the add command.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Topic title.
    pub title: String,

    /// Short description.
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Add as a sub-topic of this topic id.
    #[arg(long, short = 'p')]
    pub parent: Option<String>,
}

/// Arguments for the edit command.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Topic id.
    pub id: String,

    /// New title. A blank title is ignored.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(long)]
    pub description: Option<String>,

    /// New notes.
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for the status command.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Topic id.
    pub id: String,

    /// New status; must be one of the configured statuses.
    pub status: String,
}

/// Arguments for the delete command.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Topic id.
    pub id: String,

    /// Delete without asking.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Adds a root topic or a sub-topic and prints its id.
pub fn add(args: AddArgs, session: &mut Session) -> Result<()> {
    if args.title.trim().is_empty() {
        bail!("A topic needs a title");
    }
    let title = args.title.trim();
    let id = match &args.parent {
        Some(parent) => session
            .create_child(parent, title, &args.description)?
            .with_context(|| format!("No topic with id {parent}"))?,
        None => session.create_topic(title, &args.description)?,
    };
    println!("{id}");
    Ok(())
}

/// Queues a text edit. It is committed when the session closes.
pub fn edit(args: EditArgs, session: &mut Session) -> Result<()> {
    if session.find(&args.id).is_none() {
        bail!("No topic with id {}", args.id);
    }
    let patch = FieldPatch {
        title: args.title,
        description: args.description,
        notes: args.notes,
        status: None,
    };
    if patch.is_empty() {
        bail!("Nothing to change; pass --title, --description or --notes");
    }
    session.queue_edit(&args.id, patch, Instant::now())?;
    log::debug!("edit to {} pending until close", args.id);
    Ok(())
}

/// Sets a topic's status immediately.
pub fn status(args: StatusArgs, session: &mut Session, settings: &Settings) -> Result<()> {
    check_status(&args.status, &settings.statuses)?;
    let patch = FieldPatch {
        status: Some(TopicStatus::new(args.status)),
        ..FieldPatch::default()
    };
    if !session.update_fields(&args.id, patch)? {
        bail!("No topic with id {}", args.id);
    }
    Ok(())
}

/// Deletes a topic and its subtree once confirmed with `--yes`.
pub fn delete(args: &DeleteArgs, session: &mut Session) -> Result<()> {
    let prompt = session
        .delete_prompt(&args.id)
        .with_context(|| format!("No topic with id {}", args.id))?;
    if !args.yes {
        println!("{prompt}");
        bail!("Not deleted; re-run with --yes to confirm");
    }
    session.delete_subtree(&args.id)?;
    Ok(())
}

fn check_status(status: &str, allowed: &[String]) -> Result<()> {
    if allowed.iter().any(|s| s == status) {
        Ok(())
    } else {
        bail!("Unknown status `{status}`; expected one of: {}", allowed.join(", "))
    }
}
