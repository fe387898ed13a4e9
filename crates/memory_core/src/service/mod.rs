//! Core use-case services.
//!
//! # Responsibility
//! - Expose repository primitives as use-case level APIs.
//! - Keep handler layers decoupled from storage details.

pub mod memory_service;
