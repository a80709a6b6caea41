use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow state of a topic.
///
/// The core never enumerates statuses: it stores whatever token the caller
/// selected and only compares tokens for equality when filtering. `queued`
/// is the one value the core itself assigns, at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicStatus(String);

impl TopicStatus {
    pub const QUEUED: &'static str = "queued";

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn queued() -> Self {
        Self(Self::QUEUED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TopicStatus {
    fn default() -> Self {
        Self::queued()
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node in a quarter's topic forest.
///
/// Fields are read leniently so that documents from older versions, or
/// hand-edited ones, load without per-field validation: a missing or `null`
/// field takes its default, scalar text fields accept numbers, and
/// `createdAt` accepts epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::status")]
    pub status: TopicStatus,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient::children")]
    pub children: Vec<Topic>,
    /// Unix timestamp in milliseconds.
    #[serde(default, deserialize_with = "lenient::millis")]
    pub created_at: i64,
}

impl Topic {
    /// Creates a fresh leaf with a new id, `queued` status and no children.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            status: TopicStatus::queued(),
            notes: String::new(),
            children: Vec::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Ordered root topics of one quarter.
pub type Forest = Vec<Topic>;

mod lenient {
    use chrono::DateTime;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{Topic, TopicStatus};

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TopicStatus, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if !s.is_empty() => TopicStatus::new(s),
            _ => TopicStatus::default(),
        })
    }

    /// Non-array values read as no children; non-object entries are dropped.
    pub fn children<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Topic>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s.trim()).ok().map(|t| t.timestamp_millis()))
                .unwrap_or_default(),
            _ => 0,
        })
    }
}
