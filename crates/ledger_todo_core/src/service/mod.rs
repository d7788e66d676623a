//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate contract, host and repository calls into use-case APIs.
//! - Keep callers decoupled from storage and contract internals.

pub mod ledger_service;
pub mod session;
pub mod todo_query;
