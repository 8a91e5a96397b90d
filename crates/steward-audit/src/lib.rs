//! # steward-audit
//!
//! Capped, append-only, SHA-256 hash-chained audit trail for the STEWARD
//! engine.
//!
//! ## Overview
//!
//! Every lifecycle event the engine records is wrapped in a `ChainedEntry`
//! that links to the previous record via its SHA-256 hash.  Tampering with
//! any record — even a single byte — breaks the chain and is detected by
//! `verify_chain`.  The log retains a bounded window (1000 records by
//! default); eviction preserves verifiability by promoting the evicted
//! record's hash to the chain anchor.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use steward_audit::InMemoryAuditLog;
//! use steward_core::traits::AuditSink;
//!
//! let log = InMemoryAuditLog::new("emp-1/ws-1");
//! log.record(entry)?;
//!
//! assert!(log.verify_integrity());
//! let snapshot = log.export_log();
//! ```

pub mod chain;
pub mod memory;
pub mod record;

pub use chain::{hash_entry, verify_chain};
pub use memory::{InMemoryAuditLog, DEFAULT_CAPACITY};
pub use record::{AuditLogExport, ChainedEntry};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use steward_contracts::action::ActionId;
    use steward_contracts::audit::{AuditEntry, AuditEventKind, AuditQuery};
    use steward_core::traits::AuditSink;

    use super::{ChainedEntry, InMemoryAuditLog};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_entry(id: ActionId, event: AuditEventKind) -> AuditEntry {
        AuditEntry::new(id, event).with_detail(json!({ "note": event.as_str() }))
    }

    fn filled_log(count: usize) -> (InMemoryAuditLog, Vec<ActionId>) {
        let log = InMemoryAuditLog::new("emp-1/ws-1");
        let mut ids = Vec::new();
        for _ in 0..count {
            let id = ActionId::new();
            log.record(make_entry(id, AuditEventKind::Created)).unwrap();
            ids.push(id);
        }
        (log, ids)
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    /// Writing three records and verifying produces a valid chain.
    #[test]
    fn test_hash_chain_integrity() {
        let (log, _) = filled_log(3);
        assert!(
            log.verify_integrity(),
            "chain must be valid after sequential writes"
        );
    }

    /// Mutating any record's entry breaks the chain.
    #[test]
    fn test_tamper_detection() {
        let (log, _) = filled_log(3);

        // Directly mutate the internal state to simulate tampering.
        {
            let mut state = log.state.lock().unwrap();
            state.records[0].entry.detail = Some(json!({ "note": "TAMPERED" }));
        }

        assert!(
            !log.verify_integrity(),
            "chain must detect tampering with a stored record"
        );
    }

    /// The first record's `prev_hash` must equal the genesis sentinel.
    #[test]
    fn test_genesis_hash() {
        let (log, _) = filled_log(1);
        let snapshot = log.export_log();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(
            snapshot.records[0].prev_hash,
            ChainedEntry::GENESIS_HASH,
            "first record must link to the genesis sentinel hash"
        );
        assert_eq!(snapshot.anchor_hash, ChainedEntry::GENESIS_HASH);
    }

    /// Sequence numbers must be 0, 1, 2, … with no gaps or skips.
    #[test]
    fn test_sequence_monotonic() {
        let (log, _) = filled_log(3);
        let snapshot = log.export_log();
        for (idx, record) in snapshot.records.iter().enumerate() {
            assert_eq!(record.sequence, idx as u64);
        }
    }

    /// Appending beyond capacity evicts the oldest records while keeping the
    /// retained suffix verifiable against the promoted anchor.
    #[test]
    fn test_eviction_keeps_chain_verifiable() {
        let log = InMemoryAuditLog::with_capacity("emp-1/ws-1", 3);
        for _ in 0..5 {
            log.record(make_entry(ActionId::new(), AuditEventKind::Created))
                .unwrap();
        }

        assert_eq!(log.len(), 3);
        let snapshot = log.export_log();
        // Sequences keep counting across evictions.
        let sequences: Vec<u64> = snapshot.records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
        // The oldest retained record links to the last evicted one.
        assert_eq!(snapshot.records[0].prev_hash, snapshot.anchor_hash);
        assert_ne!(snapshot.anchor_hash, ChainedEntry::GENESIS_HASH);

        assert!(log.verify_integrity());
        assert!(super::verify_chain(&snapshot.records, &snapshot.anchor_hash));
    }

    /// Tampering is still detected after evictions have occurred.
    #[test]
    fn test_tamper_detection_after_eviction() {
        let log = InMemoryAuditLog::with_capacity("emp-1/ws-1", 3);
        for _ in 0..5 {
            log.record(make_entry(ActionId::new(), AuditEventKind::Created))
                .unwrap();
        }

        {
            let mut state = log.state.lock().unwrap();
            state.records[1].entry.actor = Some("intruder".to_string());
        }

        assert!(!log.verify_integrity());
    }

    /// `export_log()` contains every retained record in order, with a
    /// terminal hash committing to the window.
    #[test]
    fn test_export_log() {
        let (log, _) = filled_log(3);
        let snapshot = log.export_log();

        assert_eq!(snapshot.scope, "emp-1/ws-1");
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(
            snapshot.terminal_hash,
            snapshot.records.last().unwrap().this_hash,
            "terminal_hash must equal the last record's this_hash"
        );
        assert!(super::verify_chain(&snapshot.records, &snapshot.anchor_hash));
    }

    /// An empty chain is trivially valid — there is nothing to verify.
    #[test]
    fn test_verify_empty() {
        let log = InMemoryAuditLog::new("emp-1/ws-1");
        assert!(log.verify_integrity());
        assert!(super::verify_chain(&[], ChainedEntry::GENESIS_HASH));
        assert!(log.export_log().terminal_hash.is_empty());
    }

    /// Query filters combine with AND and `limit` keeps the most recent
    /// matches, preserving chain order.
    #[test]
    fn test_query_filters() {
        let log = InMemoryAuditLog::new("emp-1/ws-1");
        let a = ActionId::new();
        let b = ActionId::new();

        log.record(make_entry(a, AuditEventKind::Created)).unwrap();
        log.record(make_entry(b, AuditEventKind::Created)).unwrap();
        log.record(make_entry(a, AuditEventKind::Approved)).unwrap();
        log.record(make_entry(a, AuditEventKind::Completed)).unwrap();

        let for_a = log.query(&AuditQuery::for_action(a));
        assert_eq!(for_a.len(), 3);
        assert_eq!(for_a[0].event, AuditEventKind::Created);
        assert_eq!(for_a[2].event, AuditEventKind::Completed);

        let created = log.query(&AuditQuery::all().with_event(AuditEventKind::Created));
        assert_eq!(created.len(), 2);

        let recent = log.query(&AuditQuery::for_action(a).with_limit(2));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event, AuditEventKind::Approved);
        assert_eq!(recent[1].event, AuditEventKind::Completed);

        let none = log.query(
            &AuditQuery::for_action(b).with_event(AuditEventKind::Completed),
        );
        assert!(none.is_empty());
    }
}
