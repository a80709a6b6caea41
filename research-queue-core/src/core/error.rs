//! Error types for the Research Queue core library.

use thiserror::Error;

use crate::core::export::ExportError;

/// All errors that can occur within the Research Queue core library.
///
/// Absent data (cache misses, unreachable remotes, unparsable cache entries) is
/// never represented here; the persistence resolver downgrades those to an
/// empty result before they reach a caller.
#[derive(Debug, Error)]
pub enum ResearchQueueError {
    /// A SQLite operation on the local cache failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A string was not a well-formed `YYYY-Qn` quarter token.
    #[error("Invalid quarter: {0}")]
    InvalidQuarter(String),

    /// An imported document matched neither the quarterly nor the legacy shape.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Reading or writing a snapshot file failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Forest data could not be serialized to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`ResearchQueueError`].
pub type Result<T> = std::result::Result<T, ResearchQueueError>;

impl ResearchQueueError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::InvalidQuarter(token) => format!("Not a quarter: {token}"),
            Self::InvalidFormat(_) => "Failed to import: invalid JSON file.".to_string(),
            Self::Export(ExportError::InvalidFormat(_)) => {
                "Failed to import: invalid JSON file.".to_string()
            }
            Self::Export(e) => format!("File error: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_message_matches_import_rejection() {
        let e = ResearchQueueError::InvalidFormat("expected array".to_string());
        assert_eq!(e.user_message(), "Failed to import: invalid JSON file.");

        let e = ResearchQueueError::from(ExportError::InvalidFormat("number".to_string()));
        assert_eq!(e.user_message(), "Failed to import: invalid JSON file.");
    }

    #[test]
    fn test_invalid_quarter_names_the_token() {
        let e = ResearchQueueError::InvalidQuarter("2024-Q9".to_string());
        assert!(e.user_message().contains("2024-Q9"));
        assert!(e.to_string().contains("2024-Q9"));
    }
}
