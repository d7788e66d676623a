//! Ledger host collaborator contract.
//!
//! # Responsibility
//! - Define what the contract needs from the surrounding ledger runtime:
//!   stream resolution, stream creation, authority copying and writes.
//! - Apply committed state changes through that contract.
//!
//! # Invariants
//! - The contract only ever calls `resolve_stream`; writes happen in
//!   `apply_change` after the contract reached `Committed`.
//! - A created stream always receives the acting stream's authority.

mod sqlite;

use crate::contract::StateChange;
use crate::model::stream::StreamId;
use crate::model::todo::TodoState;
use crate::repo::stream_repo::RepoError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of the host itself, as opposed to a contract rejection.
#[derive(Debug)]
pub enum HostError {
    /// A stream the host was asked to modify does not exist.
    StreamNotFound(StreamId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StreamNotFound(id) => write!(f, "stream not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StreamNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for HostError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::StreamNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Services the ledger runtime provides to a contract.
pub trait LedgerHost {
    /// Current state document of `id`, `None` when the stream is unknown.
    fn resolve_stream(&self, id: &StreamId) -> Result<Option<Value>, HostError>;
    /// Allocates a new stream holding `state` and returns its id.
    fn create_stream(&self, state: &Value) -> Result<StreamId, HostError>;
    /// Copies the authority of `from` onto `to`.
    fn copy_authority(&self, from: &StreamId, to: &StreamId) -> Result<(), HostError>;
    /// Replaces the state document of an existing stream.
    fn write_stream(&self, id: &StreamId, state: &Value) -> Result<(), HostError>;
}

/// Streams touched by a committed transaction, in ledger response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// Streams created by the transaction.
    pub new: Vec<StreamId>,
    /// Existing streams whose state was replaced.
    pub updated: Vec<StreamId>,
    /// State written by the transaction.
    pub state: TodoState,
}

impl CommitReceipt {
    /// The single stream a todo transaction touches.
    pub fn stream(&self) -> Option<&StreamId> {
        self.new.first().or_else(|| self.updated.first())
    }
}

/// Applies `change` to `host`.
///
/// # Errors
/// Propagates host failures; callers are expected to run this inside a
/// storage transaction so a partial apply is rolled back.
pub fn apply_change<H: LedgerHost + ?Sized>(
    host: &H,
    change: &StateChange,
) -> Result<CommitReceipt, HostError> {
    match change {
        StateChange::Create {
            authority_from,
            state,
        } => {
            let id = host.create_stream(&state.to_document())?;
            host.copy_authority(authority_from, &id)?;
            Ok(CommitReceipt {
                new: vec![id],
                updated: Vec::new(),
                state: state.clone(),
            })
        }
        StateChange::Replace { stream, state } => {
            host.write_stream(stream, &state.to_document())?;
            Ok(CommitReceipt {
                new: Vec::new(),
                updated: vec![stream.clone()],
                state: state.clone(),
            })
        }
    }
}
