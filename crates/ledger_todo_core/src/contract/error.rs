//! Contract rejection reasons.

use crate::contract::entry::Entry;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a transaction was rejected by the todo contract.
///
/// Every variant is terminal for the transaction. The `Display` text is the
/// rejection reason surfaced to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Transaction is not signed by a registered identity.
    UnauthorizedTransaction,
    /// `$entry` is absent.
    MissingEntry,
    /// `$entry` names an operation this contract does not know.
    UnknownEntry(String),
    /// Create payload lacks `name`, `body` or `dueDate`, or name/body is blank.
    IncompleteCreateData,
    /// Update payload carries none of `name`, `body`, `dueDate`.
    NoUpdateData,
    /// Share payload has no 64-character `stream` recipient.
    MissingRecipient,
    /// Acting stream is not the owner of the target todo.
    NotOwner(Entry),
}

impl ContractError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnauthorizedTransaction => "unauthorized_transaction",
            Self::MissingEntry => "missing_entry",
            Self::UnknownEntry(_) => "unknown_entry",
            Self::IncompleteCreateData => "incomplete_create_data",
            Self::NoUpdateData => "no_update_data",
            Self::MissingRecipient => "missing_recipient",
            Self::NotOwner(_) => "not_owner",
        }
    }
}

impl Display for ContractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnauthorizedTransaction => write!(f, "identity signatures needed"),
            Self::MissingEntry => write!(f, "no entry found"),
            Self::UnknownEntry(value) => write!(f, "entry not found: `{value}`"),
            Self::IncompleteCreateData => write!(
                f,
                "data is missing name, dueDate, or body (name and body can't be blank)"
            ),
            Self::NoUpdateData => write!(f, "no data provided"),
            Self::MissingRecipient => write!(f, "no recipient provided"),
            Self::NotOwner(entry) => write!(f, "only owner can {entry}"),
        }
    }
}

impl Error for ContractError {}
