//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, hashing, token coding and storage into the
//!   register / login / resolve use cases.
//! - Keep boundary layers decoupled from storage and crypto details.
//!
//! # Invariants
//! - Every dependency (store, hasher, codec) is injected at construction.
//! - Slow hashing never runs while a store transaction is open.

pub mod authentication_service;
pub mod error;
pub mod registration_service;
pub mod session_resolver;
