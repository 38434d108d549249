//! In-memory commit store
//!
//! Reference implementation of the [`CommitStore`] contract and the
//! semantics oracle other back-ends are conformance-tested against. Each
//! stream is an ordered list of commits behind a single exclusive lock; all
//! work happens synchronously under that lock, which keeps `commit`
//! all-or-nothing across await points.

use async_trait::async_trait;
use parking_lot::Mutex;
use sediment_common::{Commit, CommitAttempt, Snapshot};
use sediment_store::{CommitStore, EventStoreError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bucket and stream pair identifying a stream
type StreamKey = (String, String);

/// Commits and snapshots of a single stream
#[derive(Default)]
struct StreamLog {
    /// Commits in sequence order
    commits: Vec<Commit>,

    /// Snapshots in ascending revision order
    snapshots: Vec<Snapshot>,
}

/// In-memory commit store for testing and as a conformance oracle
pub struct MemoryCommitStore {
    /// (bucket, stream) -> log
    streams: Mutex<HashMap<StreamKey, StreamLog>>,

    /// Source of globally monotonic checkpoint tokens
    checkpoint: AtomicU64,
}

impl MemoryCommitStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            checkpoint: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryCommitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommitStore for MemoryCommitStore {
    async fn get_from(
        &self,
        bucket_id: &str,
        stream_id: &str,
        min_revision: u64,
        max_revision: u64,
    ) -> Result<Vec<Commit>> {
        let streams = self.streams.lock();
        let key = (bucket_id.to_string(), stream_id.to_string());

        let Some(log) = streams.get(&key) else {
            return Ok(Vec::new());
        };

        Ok(log
            .commits
            .iter()
            .filter(|c| c.stream_revision >= min_revision && c.first_revision() <= max_revision)
            .cloned()
            .collect())
    }

    async fn commit(&self, attempt: CommitAttempt) -> Result<Commit> {
        let mut streams = self.streams.lock();
        let key = (attempt.bucket_id.clone(), attempt.stream_id.clone());
        let log = streams.entry(key).or_default();

        // Duplicate detection runs before the sequence check so an idempotent
        // retry of an already-durable commit reports DuplicateCommit, not
        // Concurrency.
        if log.commits.iter().any(|c| c.commit_id == attempt.commit_id) {
            return Err(EventStoreError::DuplicateCommit {
                commit_id: attempt.commit_id,
                stream_id: attempt.stream_id,
            });
        }

        let head_sequence = log.commits.len() as u64;
        if attempt.commit_sequence != head_sequence + 1 {
            return Err(EventStoreError::Concurrency {
                stream_id: attempt.stream_id,
                attempted_sequence: attempt.commit_sequence,
                head_sequence,
            });
        }

        let token = self.checkpoint.fetch_add(1, Ordering::SeqCst) + 1;
        let commit = Commit::from_attempt(attempt, Some(token));

        tracing::debug!(
            "[{}/{}] appended commit {} at sequence {} (checkpoint {})",
            commit.bucket_id,
            commit.stream_id,
            commit.commit_id,
            commit.commit_sequence,
            token
        );

        log.commits.push(commit.clone());
        Ok(commit)
    }

    async fn mark_dispatched(&self, commit: &Commit) -> Result<()> {
        let mut streams = self.streams.lock();
        let key = (commit.bucket_id.clone(), commit.stream_id.clone());

        if let Some(log) = streams.get_mut(&key) {
            if let Some(stored) = log
                .commits
                .iter_mut()
                .find(|c| c.commit_id == commit.commit_id)
            {
                stored.dispatched = true;
            }
        }

        Ok(())
    }

    async fn get_undispatched(&self) -> Result<Vec<Commit>> {
        let streams = self.streams.lock();

        let mut undispatched: Vec<Commit> = streams
            .values()
            .flat_map(|log| log.commits.iter())
            .filter(|c| !c.dispatched)
            .cloned()
            .collect();

        undispatched.sort_by_key(|c| c.checkpoint_token);
        Ok(undispatched)
    }

    async fn get_snapshot(
        &self,
        bucket_id: &str,
        stream_id: &str,
        max_revision: u64,
    ) -> Result<Option<Snapshot>> {
        let streams = self.streams.lock();
        let key = (bucket_id.to_string(), stream_id.to_string());

        let Some(log) = streams.get(&key) else {
            return Ok(None);
        };

        Ok(log
            .snapshots
            .iter()
            .rev()
            .find(|s| s.stream_revision <= max_revision)
            .cloned())
    }

    async fn add_snapshot(&self, snapshot: Snapshot) -> Result<bool> {
        let mut streams = self.streams.lock();
        let key = (snapshot.bucket_id.clone(), snapshot.stream_id.clone());

        let Some(log) = streams.get_mut(&key) else {
            return Ok(false);
        };

        match log
            .snapshots
            .binary_search_by_key(&snapshot.stream_revision, |s| s.stream_revision)
        {
            Ok(existing) => log.snapshots[existing] = snapshot,
            Err(insert_at) => log.snapshots.insert(insert_at, snapshot),
        }

        Ok(true)
    }

    async fn delete_stream(&self, bucket_id: &str, stream_id: &str) -> Result<()> {
        let mut streams = self.streams.lock();
        let key = (bucket_id.to_string(), stream_id.to_string());
        streams.remove(&key);
        Ok(())
    }

    async fn purge(&self) -> Result<()> {
        self.streams.lock().clear();
        Ok(())
    }
}
