//! Error types shared by stream sessions and store back-ends

use sediment_common::CommitId;
use thiserror::Error;

/// Result type for event store operations
pub type Result<T> = std::result::Result<T, EventStoreError>;

/// Failures surfaced by stream sessions and commit stores
#[derive(Error, Debug, Clone)]
pub enum EventStoreError {
    /// A required argument was missing or empty
    #[error("Missing required argument: {0}")]
    NullArgument(String),

    /// The stream session has been disposed
    #[error("Stream session has been disposed")]
    Disposed,

    /// A range load with a positive lower bound found nothing
    #[error("Stream not found: {bucket_id}/{stream_id}")]
    StreamNotFound {
        bucket_id: String,
        stream_id: String,
    },

    /// A commit with this ID already exists in the stream
    #[error("Duplicate commit {commit_id} on stream {stream_id}")]
    DuplicateCommit {
        commit_id: CommitId,
        stream_id: String,
    },

    /// Another writer appended to the stream since the last observed head
    #[error(
        "Concurrent append to stream {stream_id}: attempted sequence {attempted_sequence}, durable head is {head_sequence}"
    )]
    Concurrency {
        stream_id: String,
        attempted_sequence: u64,
        head_sequence: u64,
    },

    /// Unrecoverable transport or medium failure
    #[error("Storage failure: {0}")]
    Storage(String),
}
