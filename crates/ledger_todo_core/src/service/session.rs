//! Explicit caller context for read and write use-cases.

use crate::model::stream::StreamId;
use crate::model::transaction::{CreateTodo, SignedTransaction, TodoPatch, TransactionEnvelope};

/// Identity a caller acts as.
///
/// Passed into every query and used to build transactions; there is no
/// process-wide "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: StreamId,
}

impl Session {
    pub fn new(identity: StreamId) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &StreamId {
        &self.identity
    }

    pub fn create(&self, todo: &CreateTodo) -> TransactionEnvelope {
        TransactionEnvelope::create(&self.identity, todo)
    }

    pub fn update(&self, todo_stream: &StreamId, patch: &TodoPatch) -> TransactionEnvelope {
        TransactionEnvelope::update(&self.identity, todo_stream, patch)
    }

    pub fn share(&self, todo_stream: &StreamId, recipient: &StreamId) -> TransactionEnvelope {
        TransactionEnvelope::share(&self.identity, todo_stream, recipient)
    }

    /// Wraps `tx` with a signature attributed to this identity.
    ///
    /// Signature bytes are produced by the caller's key handler.
    pub fn sign(
        &self,
        tx: TransactionEnvelope,
        signature: impl Into<String>,
    ) -> SignedTransaction {
        SignedTransaction::new(tx).signed_by(&self.identity, signature)
    }
}
