//! Local ledger use-case service.
//!
//! # Responsibility
//! - Onboard identity streams.
//! - Run submitted transactions through the todo contract and persist the
//!   committed change.
//!
//! # Invariants
//! - Each submission runs inside one immediate SQLite transaction; a
//!   rejection or host failure leaves storage untouched.
//! - A transaction counts as self-signed unless the acting stream is a
//!   registered identity and has signed it.

use crate::contract::{process, ContractError, Outcome, Phase};
use crate::host::{apply_change, CommitReceipt, HostError};
use crate::model::stream::{Authority, StreamId};
use crate::model::transaction::SignedTransaction;
use crate::repo::stream_repo::{RepoError, SqliteStreamRepository, StreamRepository};
use log::{error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Stream `type` of onboarded identities.
pub const IDENTITY_TYPE: &str = "identity";

/// Service error for ledger submissions.
#[derive(Debug)]
pub enum LedgerServiceError {
    /// The contract rejected the transaction.
    Rejected { phase: Phase, reason: ContractError },
    /// Identity onboarding input is unusable.
    InvalidIdentity(String),
    /// Host or storage failure.
    Host(HostError),
}

impl LedgerServiceError {
    /// Contract rejection reason, when this is a rejection.
    pub fn rejection(&self) -> Option<&ContractError> {
        match self {
            Self::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl Display for LedgerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { phase, reason } => write!(f, "rejected in {phase}: {reason}"),
            Self::InvalidIdentity(message) => write!(f, "invalid identity: {message}"),
            Self::Host(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected { reason, .. } => Some(reason),
            Self::InvalidIdentity(_) => None,
            Self::Host(err) => Some(err),
        }
    }
}

impl From<HostError> for LedgerServiceError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}

impl From<RepoError> for LedgerServiceError {
    fn from(value: RepoError) -> Self {
        Self::Host(value.into())
    }
}

impl From<rusqlite::Error> for LedgerServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(RepoError::from(value))
    }
}

/// Ledger facade over one SQLite connection.
pub struct LedgerService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> LedgerService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Registers a new identity stream carrying `authority`.
    pub fn onboard_identity(
        &mut self,
        name: &str,
        authority: Authority,
    ) -> Result<StreamId, LedgerServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerServiceError::InvalidIdentity(
                "name must not be blank".to_string(),
            ));
        }

        let id = StreamId::mint();
        let tx = self.conn.transaction()?;
        SqliteStreamRepository::new(&tx).insert_stream(
            &id,
            &json!({ "type": IDENTITY_TYPE, "name": name }),
            Some(&authority),
        )?;
        tx.commit()?;

        info!("event=identity_onboard module=service status=ok stream={id}");
        Ok(id)
    }

    /// Processes `signed` through the contract and persists the result.
    ///
    /// # Errors
    /// - `Rejected` with the phase and reason when the contract refuses.
    /// - `Host` for storage failures.
    pub fn submit(
        &mut self,
        signed: &SignedTransaction,
    ) -> Result<CommitReceipt, LedgerServiceError> {
        let started_at = Instant::now();
        let entry = signed.tx.entry.clone().unwrap_or_else(|| "-".to_string());
        info!("event=tx_submit module=service status=start entry={entry}");

        let result = self.submit_in_transaction(signed);
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(receipt) => info!(
                "event=tx_submit module=service status=ok entry={entry} new={} updated={} duration_ms={duration_ms}",
                receipt.new.len(),
                receipt.updated.len()
            ),
            Err(LedgerServiceError::Rejected { phase, reason }) => warn!(
                "event=tx_submit module=service status=rejected entry={entry} phase={phase} error_code={} duration_ms={duration_ms}",
                reason.code()
            ),
            Err(err) => error!(
                "event=tx_submit module=service status=error entry={entry} duration_ms={duration_ms} error={err}"
            ),
        }
        result
    }

    fn submit_in_transaction(
        &mut self,
        signed: &SignedTransaction,
    ) -> Result<CommitReceipt, LedgerServiceError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let repo = SqliteStreamRepository::new(&tx);

        let self_signed = is_self_signed(&repo, signed)?;
        let receipt = match process(&repo, &signed.tx, self_signed)? {
            Outcome::Committed(change) => apply_change(&repo, &change)?,
            Outcome::Rejected { phase, reason } => {
                return Err(LedgerServiceError::Rejected { phase, reason });
            }
        };

        tx.commit()?;
        Ok(receipt)
    }
}

fn is_self_signed<R: StreamRepository>(
    repo: &R,
    signed: &SignedTransaction,
) -> Result<bool, RepoError> {
    if signed.self_sign {
        return Ok(true);
    }
    let Some(acting) = signed.tx.acting_stream() else {
        return Ok(true);
    };
    if !signed.has_signature_from(&acting) {
        return Ok(true);
    }

    let registered = repo
        .get_stream(&acting)?
        .is_some_and(|record| record.authority.is_some());
    Ok(!registered)
}
