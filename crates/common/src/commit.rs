//! Commits and commit attempts
//!
//! A `CommitAttempt` is the intent a session submits; a `Commit` is what the
//! store durably appended, including the fields only the store can assign
//! (checkpoint token, dispatch flag). Revision and sequence numbering is
//! 1-based and gapless per stream.

use crate::{CommitId, EventMessage, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An atomic group of events a session asks the store to append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAttempt {
    /// Bucket the stream lives in
    pub bucket_id: String,

    /// Stream the commit targets
    pub stream_id: String,

    /// Writer-chosen identifier, unique per stream
    pub commit_id: CommitId,

    /// Position of this commit in the stream, 1-based
    pub commit_sequence: u64,

    /// Revision of the last event in this commit
    pub stream_revision: u64,

    /// When the attempt was built
    pub commit_stamp: Timestamp,

    /// Headers merged into the stream's committed headers
    pub headers: HashMap<String, String>,

    /// The events being appended; never empty for a valid attempt
    pub events: Vec<EventMessage>,
}

impl CommitAttempt {
    /// Revision of the first event in this commit
    pub fn first_revision(&self) -> u64 {
        self.stream_revision - self.events.len() as u64 + 1
    }
}

/// An atomic, durably-persisted group of events for one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Bucket the stream lives in
    pub bucket_id: String,

    /// Stream the commit belongs to
    pub stream_id: String,

    /// Writer-chosen identifier, unique per stream
    pub commit_id: CommitId,

    /// Position of this commit in the stream, 1-based and gapless
    pub commit_sequence: u64,

    /// Revision of the last event in this commit
    pub stream_revision: u64,

    /// When the originating attempt was built
    pub commit_stamp: Timestamp,

    /// Headers merged into the stream's committed headers
    pub headers: HashMap<String, String>,

    /// The committed events, in append order; never empty
    pub events: Vec<EventMessage>,

    /// Store-assigned global position, absent for back-ends without one
    pub checkpoint_token: Option<u64>,

    /// Whether downstream dispatch machinery has handled this commit
    pub dispatched: bool,
}

impl Commit {
    /// Build the persisted form of an attempt
    pub fn from_attempt(attempt: CommitAttempt, checkpoint_token: Option<u64>) -> Self {
        Self {
            bucket_id: attempt.bucket_id,
            stream_id: attempt.stream_id,
            commit_id: attempt.commit_id,
            commit_sequence: attempt.commit_sequence,
            stream_revision: attempt.stream_revision,
            commit_stamp: attempt.commit_stamp,
            headers: attempt.headers,
            events: attempt.events,
            checkpoint_token,
            dispatched: false,
        }
    }

    /// Revision of the first event in this commit
    pub fn first_revision(&self) -> u64 {
        self.stream_revision - self.events.len() as u64 + 1
    }
}
