//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Every field that contributes to a record's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. scope as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of entry (serde_json with no pretty-printing)

use sha2::{Digest, Sha256};

use steward_contracts::audit::AuditEntry;

use crate::record::ChainedEntry;

/// Compute the SHA-256 hash for a single chained record.
///
/// The hash commits to every field that uniquely identifies a record: its
/// position in the chain (`sequence`), the scope it belongs to, its link to
/// the previous record (`prev_hash`), and the full lifecycle entry.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `entry` cannot be serialized to JSON — which cannot happen for
/// the well-formed `AuditEntry` type.
pub fn hash_entry(scope: &str, sequence: u64, entry: &AuditEntry, prev_hash: &str) -> String {
    // serde_json::to_vec produces canonical, deterministic JSON without
    // trailing whitespace or key reordering across calls on the same value.
    let entry_json =
        serde_json::to_vec(entry).expect("AuditEntry must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&entry_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a (possibly evicted-from) hash chain.
///
/// `anchor` is the expected `prev_hash` of the first record — the genesis
/// sentinel for a chain that has never evicted, or the `this_hash` of the
/// most recently evicted record otherwise.
///
/// Returns `true` when the chain is valid according to both rules:
///
/// 1. **Prev-hash linkage** — each record's `prev_hash` equals the
///    `this_hash` of the preceding record (or `anchor` for the first).
/// 2. **Hash correctness** — each record's `this_hash` matches the value
///    recomputed from its own fields.
///
/// Returns `false` the moment any mismatch is detected.  An empty chain is
/// defined as valid.
pub fn verify_chain(records: &[ChainedEntry], anchor: &str) -> bool {
    let mut expected_prev = anchor.to_string();

    for record in records {
        if record.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_entry(
            &record.scope,
            record.sequence,
            &record.entry,
            &record.prev_hash,
        );
        if record.this_hash != recomputed {
            return false;
        }

        expected_prev = record.this_hash.clone();
    }

    true
}
