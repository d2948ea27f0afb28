//! Unified error handling for meetup.

use thiserror::Error;

/// Errors that can occur while loading users, clustering or writing results.
#[derive(Debug, Error)]
pub enum MeetupError {
    /// A required column is absent from the input file.
    #[error("The supplied column '{column}' is not present in the input file")]
    MissingColumn { column: String },

    /// A data row could not be turned into a user location.
    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// No users were found in the input.
    #[error("No users found in the input")]
    EmptyInput,

    /// A partitioner was asked for an impossible number of groups.
    #[error("Cannot partition {point_count} points into {requested} groups")]
    InvalidPartitionCount { requested: usize, point_count: usize },

    /// A partitioner did not return one label per point.
    #[error("Partitioner returned {actual} labels for {expected} points")]
    LabelCountMismatch { expected: usize, actual: usize },

    /// A meeting point strategy needs a collaborator that was not configured.
    #[error("Missing capability: {capability}")]
    MissingCapability { capability: String },

    /// The street network has no nodes to snap to.
    #[error("Street network has no nodes inside the requested bounds")]
    EmptyNetwork,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for meetup operations.
pub type Result<T> = std::result::Result<T, MeetupError>;

/// Extension trait for converting Options into meetup errors.
pub trait OptionExt<T> {
    /// Convert None into a MissingColumn error.
    fn ok_or_missing_column(self, column: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing_column(self, column: &str) -> Result<T> {
        self.ok_or_else(|| MeetupError::MissingColumn {
            column: column.to_string(),
        })
    }
}
