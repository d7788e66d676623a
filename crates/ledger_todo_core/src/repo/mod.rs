//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define stream-oriented data access contracts.
//! - Isolate SQLite query details from host and service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Stored documents that fail to parse are reported, never masked.

pub mod stream_repo;
