//! Repository layer for memory persistence.
//!
//! # Responsibility
//! - Define the four storage primitives as a trait contract.
//! - Keep SQL details behind the SQLite implementation.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Every primitive is exactly one SQL statement; atomicity comes from
//!   SQLite's single-statement guarantee.

pub mod memory_repo;
