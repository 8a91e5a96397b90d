//! # steward-contracts
//!
//! Shared types, catalogs, and contracts for the STEWARD trust engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod action;
pub mod audit;
pub mod catalog;
pub mod error;
pub mod trust;
