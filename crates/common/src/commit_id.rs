//! Commit identifier using UUIDv7
//!
//! Commit IDs are chosen by the writer, not the store, so that a retried
//! attempt carries the same identity as the original and can be recognized
//! as a duplicate. UUIDv7 keeps fresh IDs time-ordered, which helps
//! back-ends that index commits by ID.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Caller-supplied commit identifier, unique per stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(Uuid);

impl CommitId {
    /// Generate a new commit ID using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID (for deserialization and fixtures)
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Convert to bytes (16 bytes, big-endian)
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Parse from bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid commit ID: {}", e))
    }
}

impl Default for CommitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for CommitId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommitId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Lexicographic comparison of bytes provides total ordering
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}
