//! Contract entry points and where each one reads its payload from.

use crate::contract::error::ContractError;
use crate::model::transaction::TransactionEnvelope;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Operation kind of a todo transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    Create,
    Update,
    Share,
}

/// Location of the data payload inside the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Acting (first) stream entry of `$i`.
    ActingInput,
    /// Target (first) stream entry of `$o`.
    TargetOutput,
}

impl Entry {
    pub const ALL: [Entry; 3] = [Entry::Create, Entry::Update, Entry::Share];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Share => "share",
        }
    }

    /// Creates read from the signer; update/share mutate the output stream
    /// and so carry their data there.
    pub fn payload_source(self) -> PayloadSource {
        match self {
            Self::Create => PayloadSource::ActingInput,
            Self::Update | Self::Share => PayloadSource::TargetOutput,
        }
    }

    /// Resolves the raw `$entry` value of an envelope.
    pub fn from_envelope(envelope: &TransactionEnvelope) -> Result<Self, ContractError> {
        match envelope.entry.as_deref() {
            None | Some("") => Err(ContractError::MissingEntry),
            Some(value) => value.parse(),
        }
    }
}

impl PayloadSource {
    /// Picks the payload from `envelope`, `None` when the slot is absent.
    pub fn select(self, envelope: &TransactionEnvelope) -> Option<&Value> {
        match self {
            Self::ActingInput => envelope.acting_payload(),
            Self::TargetOutput => envelope.output_payload(),
        }
    }
}

impl FromStr for Entry {
    type Err = ContractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "share" => Ok(Self::Share),
            other => Err(ContractError::UnknownEntry(other.to_string())),
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
