//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the account storage contract consumed by services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Lookups return `Ok(None)` for absent rows and `Err` only for storage
//!   failures.
//! - Multi-record writes happen inside one transaction scope.

pub mod account_repo;
