//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditLog` is the reference implementation of the engine's
//! `AuditSink` trait.  It keeps the most recent records in a `Vec` protected
//! by a `Mutex`, making it safe to share between the engine and any number
//! of readers.
//!
//! The log is capped: once `capacity` records are retained, appending a new
//! record evicts the oldest one.  Eviction keeps the chain verifiable by
//! remembering the evicted record's hash as the new anchor — the retained
//! suffix always links back to it.
//!
//! Use `export_log()` to obtain a verifiable snapshot, and
//! `verify_integrity()` at any time to confirm the retained window has not
//! been tampered with in memory.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::debug;

use steward_contracts::audit::{AuditEntry, AuditQuery};
use steward_contracts::error::{StewardError, StewardResult};
use steward_core::traits::AuditSink;

use crate::{
    chain::{hash_entry, verify_chain},
    record::{AuditLogExport, ChainedEntry},
};

/// Default maximum number of retained records.
pub const DEFAULT_CAPACITY: usize = 1000;

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryAuditLog`.
pub(crate) struct LogState {
    /// Retained records in chain order (lowest sequence first).
    pub(crate) records: Vec<ChainedEntry>,

    /// The next sequence number to assign (starts at 0, never resets).
    pub(crate) sequence: u64,

    /// The `this_hash` of the last appended record, or the anchor before
    /// any record has been appended.
    pub(crate) last_hash: String,

    /// Expected `prev_hash` of the oldest retained record: the genesis
    /// sentinel until the first eviction, then the `this_hash` of the most
    /// recently evicted record.
    pub(crate) anchor_hash: String,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An in-memory, capped, append-only audit log backed by a SHA-256 hash
/// chain.
///
/// # Thread safety
///
/// `record()` and `query()` both acquire a `Mutex` internally.  The log is
/// normally held behind an `Arc` shared with the engine.
pub struct InMemoryAuditLog {
    scope: String,
    capacity: usize,
    pub(crate) state: Arc<Mutex<LogState>>,
}

impl InMemoryAuditLog {
    /// Create a log for the given scope with the default capacity.
    pub fn new(scope: impl Into<String>) -> Self {
        Self::with_capacity(scope, DEFAULT_CAPACITY)
    }

    /// Create a log retaining at most `capacity` records.
    ///
    /// The internal `last_hash` is initialized to
    /// `ChainedEntry::GENESIS_HASH` so the first record's `prev_hash` is
    /// automatically correct.
    pub fn with_capacity(scope: impl Into<String>, capacity: usize) -> Self {
        let state = LogState {
            records: Vec::new(),
            sequence: 0,
            last_hash: ChainedEntry::GENESIS_HASH.to_string(),
            anchor_hash: ChainedEntry::GENESIS_HASH.to_string(),
        };
        Self {
            scope: scope.into(),
            capacity: capacity.max(1),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Export a verifiable snapshot of the retained window.
    ///
    /// The `terminal_hash` is the `this_hash` of the last record, or an
    /// empty string when nothing has been recorded.
    pub fn export_log(&self) -> AuditLogExport {
        let state = self.state.lock().expect("audit state lock poisoned");
        let terminal_hash = state
            .records
            .last()
            .map(|r| r.this_hash.clone())
            .unwrap_or_default();

        AuditLogExport {
            scope: self.scope.clone(),
            anchor_hash: state.anchor_hash.clone(),
            records: state.records.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Verify that the retained window has not been tampered with.
    ///
    /// Delegates to `verify_chain` with the current anchor, which checks
    /// both prev-hash linkage and hash correctness for every record.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("audit state lock poisoned");
        verify_chain(&state.records, &state.anchor_hash)
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("audit state lock poisoned")
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for InMemoryAuditLog {
    /// Append one lifecycle entry to the hash chain.
    ///
    /// Computes `this_hash` from (scope, sequence, prev_hash, entry), wraps
    /// the entry in a `ChainedEntry`, appends it, then advances the sequence
    /// counter and `last_hash`.  When the window is full, the oldest record
    /// is evicted and its hash becomes the new anchor.
    ///
    /// Returns `Err(AuditWriteFailed)` only if the internal mutex is
    /// poisoned, which cannot happen under normal operation.
    fn record(&self, entry: AuditEntry) -> StewardResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| StewardError::AuditWriteFailed {
                reason: format!("audit state lock poisoned: {}", e),
            })?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;

        let this_hash = hash_entry(&self.scope, sequence, &entry, &prev_hash);

        state.records.push(ChainedEntry {
            sequence,
            scope: self.scope.clone(),
            entry,
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        if state.records.len() > self.capacity {
            let evicted = state.records.remove(0);
            state.anchor_hash = evicted.this_hash;
            debug!(
                scope = %self.scope,
                evicted_sequence = evicted.sequence,
                "audit window full, oldest record evicted"
            );
        }

        Ok(())
    }

    /// Return retained entries matching `query`, in chain order.
    ///
    /// All filters are combined with AND; `limit` keeps the most recent
    /// matches.
    fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        let mut matched: Vec<AuditEntry> = state
            .records
            .iter()
            .filter(|r| {
                query.action_id.map_or(true, |id| r.entry.action_id == id)
                    && query.event.map_or(true, |ev| r.entry.event == ev)
            })
            .map(|r| r.entry.clone())
            .collect();
        if let Some(limit) = query.limit {
            if matched.len() > limit {
                matched.drain(..matched.len() - limit);
            }
        }
        matched
    }
}
