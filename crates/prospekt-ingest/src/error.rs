use thiserror::Error;

/// Failures of a single extraction-strategy invocation.
///
/// These never escape the fetch orchestrator: each one is recorded in the
/// run's attempt trail and the next strategy in the chain is tried.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("failed to read raw records from {path}: {source}")]
    SpoolIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode raw records from {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A malformed raw record. The offending record is dropped with a warning;
/// sibling records in the same batch proceed.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record #{ordinal} has an empty title")]
    EmptyTitle { ordinal: usize },

    #[error("record #{ordinal} ({title}) has unusable price {value}")]
    InvalidPrice {
        ordinal: usize,
        title: String,
        value: String,
    },
}
