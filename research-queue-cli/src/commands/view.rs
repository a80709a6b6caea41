//! Read-only views: quarters, the flat queue, the tree, and one topic.

use std::collections::HashSet;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use research_queue_core::{Session, Topic, TopicStatus};
use serde::Serialize;
use serde_json::json;

use crate::OutputFormat;

/// Arguments for the list command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show topics with this status.
    #[arg(long, short = 's')]
    pub status: Option<String>,
}

/// Arguments for the tree command.
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Ignore the remembered expansion state and show every topic.
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Expand these topics (remembered across runs).
    #[arg(long, value_name = "ID")]
    pub expand: Vec<String>,

    /// Collapse these topics (remembered across runs).
    #[arg(long, value_name = "ID")]
    pub collapse: Vec<String>,
}

/// Arguments for the show command.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Topic id.
    pub id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueRow<'a> {
    id: &'a str,
    title: &'a str,
    status: &'a TopicStatus,
    path: String,
    sub_topics: usize,
}

/// Prints the published quarters, marking the active one.
pub fn quarters(session: &Session, format: OutputFormat) -> Result<()> {
    let active = session.quarter();
    match format {
        OutputFormat::Json => {
            let body = json!({
                "active": active,
                "quarters": session.available_quarters(),
                "canAdvance": session.can_advance(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            for quarter in session.available_quarters() {
                let marker = if *quarter == active { '*' } else { ' ' };
                println!("{marker} {quarter}");
            }
            if !session.available_quarters().contains(&active) {
                println!("* {active} (local only)");
            }
        }
    }
    Ok(())
}

/// Prints every topic in preorder, optionally filtered by status.
pub fn list(args: &ListArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let status = args.status.as_deref().map(TopicStatus::new);
    let rows: Vec<QueueRow<'_>> = session
        .flatten_filtered(status.as_ref())
        .into_iter()
        .map(|topic| QueueRow {
            id: &topic.id,
            title: &topic.title,
            status: &topic.status,
            path: session.path(&topic.id).unwrap_or_default(),
            sub_topics: session.count_descendants(&topic.id).unwrap_or(0),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No topics in {}", session.quarter());
                return Ok(());
            }
            for row in &rows {
                println!("{}  [{}]  {}", row.id, row.status, row.path);
            }
        }
    }
    Ok(())
}

/// Prints the forest, applying and remembering expansion changes.
pub fn tree(args: &TreeArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let resolver = session.resolver();
    let mut expanded = resolver.load_expanded();
    if !args.expand.is_empty() || !args.collapse.is_empty() {
        expanded.extend(args.expand.iter().cloned());
        for id in &args.collapse {
            expanded.remove(id);
        }
        resolver
            .save_expanded(&expanded)
            .context("Failed to remember expanded topics")?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(session.topics())?),
        OutputFormat::Text => {
            if session.topics().is_empty() {
                println!("No topics in {}", session.quarter());
            } else {
                print!("{}", render_tree(session.topics(), &expanded, args.all));
            }
        }
    }
    Ok(())
}

/// Prints one topic with its breadcrumb and direct sub-topics.
pub fn show(args: &ShowArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let topic = session
        .find(&args.id)
        .with_context(|| format!("No topic with id {}", args.id))?;
    let path = session.path(&topic.id).unwrap_or_default();
    let parent_id = session.find_parent(&topic.id).parent().map(|p| p.id.as_str());

    match format {
        OutputFormat::Json => {
            let body = json!({
                "topic": topic,
                "path": path,
                "parentId": parent_id,
                "subTopicCount": session.count_descendants(&topic.id),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => print!("{}", render_topic(topic, &path)),
    }
    Ok(())
}

/// Indented outline of `forest`. Collapsed topics show their hidden count.
pub fn render_tree(forest: &[Topic], expanded: &HashSet<String>, all: bool) -> String {
    let mut out = String::new();
    for topic in forest {
        render_node(&mut out, topic, 0, expanded, all);
    }
    out
}

fn render_node(out: &mut String, topic: &Topic, depth: usize, expanded: &HashSet<String>, all: bool) {
    let indent = "  ".repeat(depth);
    let open = all || expanded.contains(&topic.id);
    let marker = match (topic.children.is_empty(), open) {
        (true, _) => "-",
        (false, true) => "v",
        (false, false) => ">",
    };
    let _ = write!(out, "{indent}{marker} {} [{}] ({})", topic.title, topic.status, topic.id);
    if !open && !topic.children.is_empty() {
        let hidden = research_queue_core::tree::count_descendants(topic);
        let _ = write!(out, " +{hidden}");
    }
    out.push('\n');
    if open {
        for child in &topic.children {
            render_node(out, child, depth + 1, expanded, all);
        }
    }
}

fn render_topic(topic: &Topic, path: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{path}");
    let _ = writeln!(out, "  id:      {}", topic.id);
    let _ = writeln!(out, "  status:  {}", topic.status);
    if let Some(created) = DateTime::<Utc>::from_timestamp_millis(topic.created_at) {
        let _ = writeln!(out, "  created: {}", created.format("%Y-%m-%d %H:%M"));
    }
    if !topic.description.is_empty() {
        let _ = writeln!(out, "\n{}", topic.description);
    }
    if !topic.notes.is_empty() {
        let _ = writeln!(out, "\nNotes:\n{}", topic.notes);
    }
    if !topic.children.is_empty() {
        let _ = writeln!(out, "\nSub-topics:");
        for child in &topic.children {
            let _ = writeln!(out, "  {} [{}] ({})", child.title, child.status, child.id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, title: &str, children: Vec<Topic>) -> Topic {
        Topic {
            id: id.to_string(),
            title: title.to_string(),
            children,
            ..Topic::default()
        }
    }

    fn forest() -> Vec<Topic> {
        vec![
            topic(
                "a",
                "Parsing",
                vec![topic("b", "Pratt", vec![topic("c", "Binding power", vec![])])],
            ),
            topic("d", "Linking", vec![]),
        ]
    }

    #[test]
    fn test_collapsed_tree_shows_hidden_count() {
        let out = render_tree(&forest(), &HashSet::new(), false);
        assert_eq!(
            out,
            "> Parsing [queued] (a) +2\n- Linking [queued] (d)\n"
        );
    }

    #[test]
    fn test_expanded_topics_open_one_level_at_a_time() {
        let expanded: HashSet<String> = ["a".to_string()].into_iter().collect();
        let out = render_tree(&forest(), &expanded, false);
        assert_eq!(
            out,
            "v Parsing [queued] (a)\n  > Pratt [queued] (b) +1\n- Linking [queued] (d)\n"
        );
    }

    #[test]
    fn test_all_ignores_expansion_state() {
        let out = render_tree(&forest(), &HashSet::new(), true);
        assert!(out.contains("    - Binding power [queued] (c)\n"));
    }

    #[test]
    fn test_render_topic_lists_sub_topics() {
        let mut parent = topic("a", "Parsing", vec![topic("b", "Pratt", vec![])]);
        parent.notes = "read the paper".to_string();
        let out = render_topic(&parent, "Parsing");
        assert!(out.starts_with("Parsing\n"));
        assert!(out.contains("Notes:\nread the paper"));
        assert!(out.contains("Sub-topics:\n  Pratt [queued] (b)"));
    }
}
