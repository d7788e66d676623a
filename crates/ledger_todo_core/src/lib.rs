//! Todo smart contract and local ledger host.
//! The `contract` module is the single source of truth for todo invariants.

pub mod contract;
pub mod db;
pub mod host;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use contract::{process, ContractError, ContractRun, Entry, Outcome, Phase, StateChange};
pub use host::{apply_change, CommitReceipt, HostError, LedgerHost};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::stream::{Authority, AuthorityKey, StreamId, STREAM_ID_LEN};
pub use model::todo::TodoState;
pub use model::transaction::{
    CreateTodo, ShareTodo, SignedTransaction, TodoPatch, TransactionEnvelope,
};
pub use repo::stream_repo::{
    RepoError, RepoResult, SqliteStreamRepository, StreamRecord, StreamRepository, TodoListQuery,
};
pub use service::ledger_service::{LedgerService, LedgerServiceError};
pub use service::session::Session;
pub use service::todo_query::{TodoQueryService, TodoRecord};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
