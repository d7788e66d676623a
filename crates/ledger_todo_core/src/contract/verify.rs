//! Verify phase: structural checks without ledger state access.
//!
//! # Responsibility
//! - Reject self-signed transactions and malformed envelopes.
//! - Turn the raw JSON payload into a typed `Action`.
//!
//! # Invariants
//! - Payloads are read only through `Entry::payload_source`.
//! - Truthiness follows the ledger's JSON rules: `null`, `false`, `0`, `""`
//!   count as absent.

use crate::contract::entry::Entry;
use crate::contract::error::ContractError;
use crate::model::stream::StreamId;
use crate::model::transaction::{CreateTodo, TodoPatch, TransactionEnvelope};
use serde_json::{Map, Value};

/// Transaction that passed verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    /// `$namespace` of the envelope.
    pub namespace: String,
    /// First stream of `$i`, if any.
    pub acting: Option<StreamId>,
    pub action: Action,
}

/// Typed operation produced by verification, one variant per entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create { owner: StreamId, todo: CreateTodo },
    Update { target: StreamId, patch: TodoPatch },
    Share { target: StreamId, recipient: StreamId },
}

impl VerifiedTransaction {
    pub fn entry(&self) -> Entry {
        match self.action {
            Action::Create { .. } => Entry::Create,
            Action::Update { .. } => Entry::Update,
            Action::Share { .. } => Entry::Share,
        }
    }

    /// Stream whose current state the vote phase must read, if any.
    pub fn vote_target(&self) -> Option<&StreamId> {
        match &self.action {
            Action::Create { .. } => None,
            Action::Update { target, .. } | Action::Share { target, .. } => Some(target),
        }
    }
}

/// Runs structural verification of `envelope`.
///
/// # Errors
/// - `UnauthorizedTransaction` when `self_signed` is set.
/// - `MissingEntry` / `UnknownEntry` for a bad `$entry`.
/// - The entry-specific payload error otherwise.
pub fn verify(
    envelope: &TransactionEnvelope,
    self_signed: bool,
) -> Result<VerifiedTransaction, ContractError> {
    if self_signed {
        return Err(ContractError::UnauthorizedTransaction);
    }

    let entry = Entry::from_envelope(envelope)?;
    let payload = entry
        .payload_source()
        .select(envelope)
        .and_then(Value::as_object);
    let acting = envelope.acting_stream();

    let action = match entry {
        Entry::Create => {
            let todo = verify_create(payload)?;
            // A create payload can only exist under an acting stream.
            let owner = acting.clone().ok_or(ContractError::IncompleteCreateData)?;
            Action::Create { owner, todo }
        }
        Entry::Update => {
            let patch = verify_update(payload)?;
            let target = envelope.output_stream().ok_or(ContractError::NoUpdateData)?;
            Action::Update { target, patch }
        }
        Entry::Share => {
            let recipient = verify_share(payload)?;
            let target = envelope
                .output_stream()
                .ok_or(ContractError::MissingRecipient)?;
            Action::Share { target, recipient }
        }
    };

    Ok(VerifiedTransaction {
        namespace: envelope.namespace.clone(),
        acting,
        action,
    })
}

fn verify_create(payload: Option<&Map<String, Value>>) -> Result<CreateTodo, ContractError> {
    let payload = payload.ok_or(ContractError::IncompleteCreateData)?;
    let name = non_blank_str(payload.get("name")).ok_or(ContractError::IncompleteCreateData)?;
    let body = non_blank_str(payload.get("body")).ok_or(ContractError::IncompleteCreateData)?;
    let due_date = truthy(payload.get("dueDate")).ok_or(ContractError::IncompleteCreateData)?;

    Ok(CreateTodo::new(name, body, due_date.clone()))
}

fn verify_update(payload: Option<&Map<String, Value>>) -> Result<TodoPatch, ContractError> {
    let payload = payload.ok_or(ContractError::NoUpdateData)?;
    let patch = TodoPatch {
        name: non_blank_str(payload.get("name")).map(str::to_string),
        body: non_blank_str(payload.get("body")).map(str::to_string),
        due_date: truthy(payload.get("dueDate")).cloned(),
    };

    if patch.is_empty() {
        return Err(ContractError::NoUpdateData);
    }
    Ok(patch)
}

fn verify_share(payload: Option<&Map<String, Value>>) -> Result<StreamId, ContractError> {
    let recipient = payload
        .and_then(|payload| payload.get("stream"))
        .and_then(Value::as_str)
        .map(StreamId::new)
        .ok_or(ContractError::MissingRecipient)?;

    if !recipient.has_ledger_length() {
        return Err(ContractError::MissingRecipient);
    }
    Ok(recipient)
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}
