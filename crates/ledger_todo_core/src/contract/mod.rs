//! Todo smart contract.
//!
//! # Responsibility
//! - Evaluate `create`, `update` and `share` transactions in the ordered
//!   verify → vote → commit phases.
//! - Hand the resulting state change back to the host; persisting it is the
//!   host's job.
//!
//! # Invariants
//! - Only the vote phase reads ledger state, and only through `LedgerHost`.
//! - No phase retries; any rejection is terminal for the transaction.
//! - No shared mutable state between invocations.

pub mod commit;
pub mod entry;
pub mod error;
pub mod machine;
pub mod verify;
pub mod vote;

pub use commit::StateChange;
pub use entry::{Entry, PayloadSource};
pub use error::ContractError;
pub use machine::{process, ContractRun, Outcome, Phase};
