//! Stream snapshots
//!
//! A snapshot materializes stream state at a revision so that sessions can
//! load without replaying the whole stream. The payload is opaque to the
//! engine, like event bodies.

use serde::{Deserialize, Serialize};

/// Materialized stream state at a specific revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Bucket the stream lives in
    pub bucket_id: String,

    /// Stream the snapshot belongs to
    pub stream_id: String,

    /// Revision of the last event folded into this snapshot
    pub stream_revision: u64,

    /// Serialized stream state
    pub payload: Vec<u8>,
}

impl Snapshot {
    /// Create a new snapshot
    pub fn new(
        bucket_id: impl Into<String>,
        stream_id: impl Into<String>,
        stream_revision: u64,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            stream_id: stream_id.into(),
            stream_revision,
            payload,
        }
    }
}
