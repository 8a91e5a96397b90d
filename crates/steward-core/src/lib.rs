//! steward-core: the trust-gated action execution engine.
//!
//! This crate hosts the lifecycle controller ([`ActionEngine`]) and the
//! traits it is built around:
//!
//! - [`ActionHandler`] — side-effect executors, one per action type
//! - [`AuditSink`]     — the append-only lifecycle event record
//! - [`ActionStore`]   — injected action storage
//!
//! The engine owns one employee's action queue and trust ledger. Every
//! action passes validation and a trust decision before it is queued, and a
//! handler is only ever invoked for an action in `Approved` status.

pub mod engine;
pub mod registry;
pub mod store;
pub mod traits;
pub mod validation;

pub use engine::{ActionEngine, EngineConfig, QueueStats};
pub use registry::HandlerRegistry;
pub use store::InMemoryActionStore;
pub use traits::{ActionHandler, ActionStore, AuditSink};
pub use validation::validate_parameters;
