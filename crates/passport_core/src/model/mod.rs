//! Account identity domain model.
//!
//! # Responsibility
//! - Define the account and credential records persisted by core.
//! - Define the public profile projection handed to callers.
//!
//! # Invariants
//! - Every account is identified by a stable `AccountId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod account;
