//! Ledger-facing data model.
//!
//! # Responsibility
//! - Define stream identifiers, transaction envelopes and todo documents.
//! - Keep wire field names (`$i`, `dueDate`, `sharedWith`) in one place.
//!
//! # Invariants
//! - Every piece of ledger state is addressed by a `StreamId`.
//! - Todo documents are never deleted, only created and mutated.

pub mod stream;
pub mod todo;
pub mod transaction;
