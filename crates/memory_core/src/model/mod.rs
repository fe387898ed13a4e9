//! Domain model for persisted memories.
//!
//! # Responsibility
//! - Define the record shape shared by storage and handler layers.
//! - Own input validation that must run before any SQL mutation.
//!
//! # Invariants
//! - A memory is identified by its non-empty `key`; there is exactly one
//!   record per key.

pub mod memory;
