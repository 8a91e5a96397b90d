//! Chained audit record and export types.
//!
//! `ChainedEntry` is a single entry in the hash chain — it wraps an
//! `AuditEntry` with sequence numbering and the SHA-256 hashes that make
//! tampering detectable.  `AuditLogExport` is the snapshot produced when the
//! retained window is exported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use steward_contracts::audit::AuditEntry;

/// A single entry in the SHA-256 hash chain for one audit scope.
///
/// Each record commits to the previous one via `prev_hash`, forming an
/// append-only chain.  Modifying any field — including those of the embedded
/// `entry` — invalidates `this_hash` and every subsequent `prev_hash`,
/// which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainedEntry {
    /// Monotonically increasing position in the chain, starting at 0.
    /// Sequence numbers keep counting across evictions.
    pub sequence: u64,

    /// The (employee, workspace) scope this record belongs to.
    pub scope: String,

    /// The immutable lifecycle event produced by the engine.
    pub entry: AuditEntry,

    /// SHA-256 hash (hex) of the previous record, or the chain's anchor for
    /// the oldest retained record (`GENESIS_HASH` if nothing was evicted).
    pub prev_hash: String,

    /// SHA-256 hash (hex) of this record's canonical content.
    ///
    /// Computed by `hash_entry()` over (scope, sequence, prev_hash,
    /// canonical JSON of entry).
    pub this_hash: String,
}

impl ChainedEntry {
    /// The sentinel `prev_hash` used for the first record of every chain.
    ///
    /// 64 hex zeros — a value that can never be the SHA-256 of real data,
    /// making genesis detection unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A snapshot of the retained audit window for one scope.
///
/// Produced by `InMemoryAuditLog::export_log()`.  `anchor_hash` is the
/// `this_hash` of the most recently evicted record (or `GENESIS_HASH`), so
/// the retained suffix can always be re-verified; `terminal_hash` is a
/// compact commitment to the whole window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogExport {
    /// The scope whose events are recorded here.
    pub scope: String,

    /// Expected `prev_hash` of the oldest retained record.
    pub anchor_hash: String,

    /// All retained records in chain order (lowest sequence first).
    pub records: Vec<ChainedEntry>,

    /// Wall-clock time (UTC) the snapshot was taken.
    pub exported_at: DateTime<Utc>,

    /// The `this_hash` of the last record.  Empty string if the window is
    /// empty.
    pub terminal_hash: String,
}
