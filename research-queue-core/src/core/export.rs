//! Snapshot export and import of a quarter's forest as JSON documents.
//!
//! Two input shapes are accepted on import:
//!
//! - the quarterly snapshot `{ quarter, updatedAt, topicCount, subTopicCount, topics }`
//!   written by [`to_snapshot`];
//! - the legacy bare array of topics written before data was split by quarter.
//!
//! Individual topics are not validated beyond what deserialization requires;
//! missing fields take their defaults.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::tree::ForestStats;
use crate::{Forest, Quarter, Topic};

/// Portable, metadata-annotated representation of one quarter's forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub quarter: Quarter,
    pub updated_at: DateTime<Utc>,
    /// Number of root topics.
    pub topic_count: usize,
    /// Number of topics below the roots.
    pub sub_topic_count: usize,
    pub topics: Forest,
}

/// Which accepted shape an imported document had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// A bare array of topics.
    Legacy,
    /// An object carrying a `topics` array.
    Quarterly,
}

/// A document accepted for import, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDocument {
    /// Target quarter: the document's own, or the active one when it names none.
    pub quarter: Quarter,
    pub topics: Forest,
    pub shape: DocumentShape,
}

impl ImportedDocument {
    pub fn stats(&self) -> ForestStats {
        ForestStats::of(&self.topics)
    }

    /// Question to put to the user before the import replaces their data.
    pub fn confirmation_prompt(&self) -> String {
        let stats = self.stats();
        format!(
            "Import {} topic(s) ({} total with sub-topics) into {}?",
            stats.topic_count,
            stats.total(),
            self.quarter
        )
    }
}

/// Errors specific to export/import operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid export format: {0}")]
    InvalidFormat(String),
}

/// Builds the snapshot document for `topics`, stamped with the current time.
pub fn to_snapshot(quarter: Quarter, topics: &[Topic]) -> SnapshotDocument {
    let stats = ForestStats::of(topics);
    SnapshotDocument {
        quarter,
        updated_at: Utc::now(),
        topic_count: stats.topic_count,
        sub_topic_count: stats.sub_topic_count,
        topics: topics.to_vec(),
    }
}

/// Interprets raw JSON as one of the two accepted import shapes.
///
/// # Errors
///
/// Returns [`ExportError::InvalidFormat`] when `raw` is not JSON, is neither an
/// array nor an object with a `topics` array, or names a quarter that is not a
/// valid `YYYY-Qn` token.
pub fn from_imported(raw: &str, active: Quarter) -> Result<ImportedDocument, ExportError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ExportError::InvalidFormat(format!("not JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(ImportedDocument {
            quarter: active,
            topics: topics_from(Value::Array(items))?,
            shape: DocumentShape::Legacy,
        }),
        Value::Object(mut map) => {
            let topics = match map.remove("topics") {
                Some(topics @ Value::Array(_)) => topics_from(topics)?,
                _ => {
                    return Err(ExportError::InvalidFormat(
                        "expected an array or an object with a `topics` array".to_string(),
                    ))
                }
            };
            let quarter = match map.get("quarter") {
                None | Some(Value::Null) => active,
                Some(Value::String(token)) if token.is_empty() => active,
                Some(Value::String(token)) => Quarter::parse(token)
                    .map_err(|_| ExportError::InvalidFormat(format!("bad quarter `{token}`")))?,
                Some(other) => {
                    return Err(ExportError::InvalidFormat(format!("bad quarter `{other}`")))
                }
            };
            Ok(ImportedDocument {
                quarter,
                topics,
                shape: DocumentShape::Quarterly,
            })
        }
        _ => Err(ExportError::InvalidFormat(
            "expected an array or an object with a `topics` array".to_string(),
        )),
    }
}

fn topics_from(value: Value) -> Result<Forest, ExportError> {
    serde_json::from_value(value)
        .map_err(|e| ExportError::InvalidFormat(format!("unreadable topics: {e}")))
}

/// Writes `doc` to `path` as two-space indented JSON.
pub fn write_snapshot<P: AsRef<Path>>(path: P, doc: &SnapshotDocument) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads and interprets an import file.
pub fn read_document<P: AsRef<Path>>(
    path: P,
    active: Quarter,
) -> Result<ImportedDocument, ExportError> {
    let raw = std::fs::read_to_string(path)?;
    from_imported(&raw, active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TopicStatus;
    use tempfile::NamedTempFile;

    fn q(token: &str) -> Quarter {
        Quarter::parse(token).unwrap()
    }

    fn forest() -> Forest {
        let mut root = Topic::new("Compilers", "front ends");
        root.status = TopicStatus::new("in_progress");
        root.notes = "dragon book ch. 3".to_string();
        let mut child = Topic::new("Parsing", "");
        child.children.push(Topic::new("Pratt", "operator precedence"));
        root.children.push(child);
        vec![root, Topic::new("Databases", "")]
    }

    #[test]
    fn test_snapshot_counts() {
        let doc = to_snapshot(q("2024-Q2"), &forest());
        assert_eq!(doc.quarter, q("2024-Q2"));
        assert_eq!(doc.topic_count, 2);
        assert_eq!(doc.sub_topic_count, 2);
    }

    #[test]
    fn test_snapshot_json_field_names() {
        let json = serde_json::to_value(to_snapshot(q("2024-Q2"), &[])).unwrap();
        assert_eq!(json["quarter"], "2024-Q2");
        assert_eq!(json["topicCount"], 0);
        assert_eq!(json["subTopicCount"], 0);
        assert_eq!(json["topics"], serde_json::json!([]));
        assert!(json["updatedAt"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_snapshot_round_trip_preserves_forest() {
        let original = forest();
        let raw = serde_json::to_string(&to_snapshot(q("2024-Q2"), &original)).unwrap();
        let imported = from_imported(&raw, q("2023-Q1")).unwrap();
        assert_eq!(imported.topics, original);
        assert_eq!(imported.quarter, q("2024-Q2"));
        assert_eq!(imported.shape, DocumentShape::Quarterly);
    }

    #[test]
    fn test_legacy_array_uses_active_quarter() {
        let raw = r#"[{"id":"x","title":"T","description":"","status":"queued","notes":"","children":[],"createdAt":1}]"#;
        let imported = from_imported(raw, q("2024-Q2")).unwrap();
        assert_eq!(imported.shape, DocumentShape::Legacy);
        assert_eq!(imported.quarter, q("2024-Q2"));
        assert_eq!(imported.topics.len(), 1);
        assert_eq!(imported.topics[0].id, "x");
    }

    #[test]
    fn test_loosely_typed_nodes_are_accepted() {
        let raw = r#"[
            {"id":"x","title":"T","notes":null},
            {"id":7,"title":"Numbered"},
            {"id":"z","title":"Dated","createdAt":"2024-04-01T00:00:00Z"}
        ]"#;
        let imported = from_imported(raw, q("2024-Q2")).unwrap();
        assert_eq!(imported.topics.len(), 3);
        assert_eq!(imported.topics[0].notes, "");
        assert_eq!(imported.topics[1].id, "7");
        assert_eq!(imported.topics[2].created_at, 1711929600000);
    }

    #[test]
    fn test_quarterly_without_quarter_uses_active() {
        let imported = from_imported(r#"{"topics":[]}"#, q("2024-Q2")).unwrap();
        assert_eq!(imported.quarter, q("2024-Q2"));
        let imported = from_imported(r#"{"quarter":"","topics":[]}"#, q("2024-Q2")).unwrap();
        assert_eq!(imported.quarter, q("2024-Q2"));
    }

    #[test]
    fn test_quarterly_names_its_quarter() {
        let imported =
            from_imported(r#"{"quarter":"2024-Q3","topics":[{"id":"a","title":"A"}]}"#, q("2024-Q2"))
                .unwrap();
        assert_eq!(imported.quarter, q("2024-Q3"));
        assert_eq!(imported.topics[0].title, "A");
    }

    #[test]
    fn test_rejects_other_shapes() {
        for raw in [
            "not json",
            "42",
            r#""text""#,
            "null",
            r#"{"quarter":"2024-Q3"}"#,
            r#"{"topics":{}}"#,
            r#"{"quarter":"2024-Q9","topics":[]}"#,
            r#"{"quarter":7,"topics":[]}"#,
            "[1, 2]",
        ] {
            assert!(
                matches!(from_imported(raw, q("2024-Q2")), Err(ExportError::InvalidFormat(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_confirmation_prompt() {
        let doc = ImportedDocument {
            quarter: q("2024-Q3"),
            topics: forest(),
            shape: DocumentShape::Quarterly,
        };
        assert_eq!(
            doc.confirmation_prompt(),
            "Import 2 topic(s) (4 total with sub-topics) into 2024-Q3?"
        );
    }

    #[test]
    fn test_write_then_read_file() {
        let temp = NamedTempFile::new().unwrap();
        let doc = to_snapshot(q("2024-Q4"), &forest());
        write_snapshot(temp.path(), &doc).unwrap();

        let written = std::fs::read_to_string(temp.path()).unwrap();
        assert!(written.contains("\n  \"quarter\": \"2024-Q4\""));

        let imported = read_document(temp.path(), q("2024-Q1")).unwrap();
        assert_eq!(imported.quarter, q("2024-Q4"));
        assert_eq!(imported.topics, doc.topics);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let result = read_document("/nonexistent/queue.json", q("2024-Q1"));
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
