//! # steward-trust
//!
//! The progressive trust ledger for the STEWARD engine.
//!
//! ## Overview
//!
//! This crate decides, per proposed action, whether a human must approve it.
//! [`TrustLedger::evaluate`] combines a pure confidence classifier with
//! per-action-type learned metrics and an ordered list of escalation rules;
//! [`TrustLedger::record_outcome`] is the learning loop that advances (or
//! demotes) the trust level as approvals and rejections accumulate.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use steward_trust::{config, TrustLedger};
//!
//! let cfg = config::from_file(Path::new("trust.toml"))?;
//! let ledger = TrustLedger::new(cfg);
//! // Pass `ledger` to `steward_core::ActionEngine`.
//! ```
//!
//! ## Decision order
//!
//! Escalation rules are applied in configured order and the first match
//! forces approval; only when none fire does the resolved trust level's own
//! policy apply.

pub mod classifier;
pub mod config;
pub mod ledger;

pub use classifier::{score_confidence, ClassifierInput};
pub use ledger::TrustLedger;

// ── Tests ─────────────────────────────────────────────────────────────────────
