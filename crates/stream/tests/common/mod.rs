//! Common test utilities for stream session tests

use async_trait::async_trait;
use parking_lot::Mutex;
use sediment_common::{Commit, CommitAttempt, CommitId, EventMessage, Snapshot, Timestamp};
use sediment_store::{CommitStore, EventStoreError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

pub const BUCKET: &str = "default";
pub const STREAM: &str = "orders-1";

/// Build an event with the given body
pub fn event(body: &str) -> EventMessage {
    EventMessage::with_body(body.as_bytes().to_vec())
}

/// Build a commit for the shared test stream
pub fn commit(commit_sequence: u64, stream_revision: u64, bodies: &[&str]) -> Commit {
    commit_with_id(CommitId::new(), commit_sequence, stream_revision, bodies)
}

/// Build a commit carrying a specific commit ID
pub fn commit_with_id(
    commit_id: CommitId,
    commit_sequence: u64,
    stream_revision: u64,
    bodies: &[&str],
) -> Commit {
    Commit {
        bucket_id: BUCKET.to_string(),
        stream_id: STREAM.to_string(),
        commit_id,
        commit_sequence,
        stream_revision,
        commit_stamp: Timestamp::from_micros(1_000),
        headers: HashMap::new(),
        events: bodies
            .iter()
            .map(|b| EventMessage::with_body(b.as_bytes().to_vec()))
            .collect(),
        checkpoint_token: Some(commit_sequence),
        dispatched: false,
    }
}

/// Build a commit attempt for seeding a real store
#[allow(dead_code)]
pub fn attempt(commit_sequence: u64, stream_revision: u64, bodies: &[&str]) -> CommitAttempt {
    CommitAttempt {
        bucket_id: BUCKET.to_string(),
        stream_id: STREAM.to_string(),
        commit_id: CommitId::new(),
        commit_sequence,
        stream_revision,
        commit_stamp: Timestamp::from_micros(1_000),
        headers: HashMap::new(),
        events: bodies
            .iter()
            .map(|b| EventMessage::with_body(b.as_bytes().to_vec()))
            .collect(),
    }
}

/// Commit store double that records calls and can be scripted to fail
///
/// `get_from` hands out the queued batches in order, then empty vectors.
/// `commit` pops scripted failures first; once the script is exhausted it
/// persists by echoing the attempt with the next checkpoint token.
pub struct ScriptedStore {
    /// Batches returned by successive get_from calls
    reads: Mutex<VecDeque<Vec<Commit>>>,

    /// Errors returned by the next commit calls
    commit_failures: Mutex<VecDeque<EventStoreError>>,

    /// Every attempt the session submitted
    attempts: Mutex<Vec<CommitAttempt>>,

    /// (min, max) of every get_from call
    read_ranges: Mutex<Vec<(u64, u64)>>,

    /// Source of checkpoint tokens for echoed commits
    checkpoint: AtomicU64,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            reads: Mutex::new(VecDeque::new()),
            commit_failures: Mutex::new(VecDeque::new()),
            attempts: Mutex::new(Vec::new()),
            read_ranges: Mutex::new(Vec::new()),
            checkpoint: AtomicU64::new(0),
        }
    }

    /// Store whose first get_from returns the given batch
    pub fn with_commits(batch: Vec<Commit>) -> Self {
        let store = Self::new();
        store.queue_read(batch);
        store
    }

    /// Queue a batch for the next unanswered get_from call
    pub fn queue_read(&self, batch: Vec<Commit>) {
        self.reads.lock().push_back(batch);
    }

    /// Fail the next commit call with the given error
    pub fn fail_next_commit(&self, error: EventStoreError) {
        self.commit_failures.lock().push_back(error);
    }

    /// Every attempt submitted so far
    pub fn attempts(&self) -> Vec<CommitAttempt> {
        self.attempts.lock().clone()
    }

    /// The (min, max) range of every get_from call so far
    #[allow(dead_code)]
    pub fn read_ranges(&self) -> Vec<(u64, u64)> {
        self.read_ranges.lock().clone()
    }
}

#[async_trait]
impl CommitStore for ScriptedStore {
    async fn get_from(
        &self,
        _bucket_id: &str,
        _stream_id: &str,
        min_revision: u64,
        max_revision: u64,
    ) -> Result<Vec<Commit>> {
        self.read_ranges.lock().push((min_revision, max_revision));
        Ok(self.reads.lock().pop_front().unwrap_or_default())
    }

    async fn commit(&self, attempt: CommitAttempt) -> Result<Commit> {
        self.attempts.lock().push(attempt.clone());

        if let Some(error) = self.commit_failures.lock().pop_front() {
            return Err(error);
        }

        let token = self.checkpoint.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Commit::from_attempt(attempt, Some(token)))
    }

    async fn mark_dispatched(&self, _commit: &Commit) -> Result<()> {
        Ok(())
    }

    async fn get_undispatched(&self) -> Result<Vec<Commit>> {
        Ok(Vec::new())
    }

    async fn get_snapshot(
        &self,
        _bucket_id: &str,
        _stream_id: &str,
        _max_revision: u64,
    ) -> Result<Option<Snapshot>> {
        Ok(None)
    }

    async fn add_snapshot(&self, _snapshot: Snapshot) -> Result<bool> {
        Ok(false)
    }

    async fn delete_stream(&self, _bucket_id: &str, _stream_id: &str) -> Result<()> {
        Ok(())
    }

    async fn purge(&self) -> Result<()> {
        Ok(())
    }
}
