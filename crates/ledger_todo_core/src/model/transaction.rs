//! Transaction envelope as submitted to the ledger.
//!
//! # Responsibility
//! - Mirror the ledger wire shape (`$namespace`, `$contract`, `$entry`,
//!   `$i`, `$o`, `$sigs`, `$selfsign`).
//! - Provide builders for the three todo transaction shapes.
//!
//! # Invariants
//! - Stream maps keep insertion order, so the first key of `$i` is the
//!   acting stream and the first key of `$o` is the target stream.
//! - The envelope is never mutated while a transaction is processed.

use crate::model::stream::StreamId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Namespace used by todo transactions built in this crate.
pub const DEFAULT_NAMESPACE: &str = "todo";
/// Contract name used by todo transactions built in this crate.
pub const TODO_CONTRACT: &str = "todo";

/// Ordered mapping of stream id to payload.
pub type StreamMap = Map<String, Value>;

/// Body of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    #[serde(rename = "$namespace")]
    pub namespace: String,
    #[serde(rename = "$contract", default)]
    pub contract: String,
    /// Raw entry name; parsed into `Entry` during verification.
    #[serde(rename = "$entry", default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(rename = "$i", default)]
    pub inputs: StreamMap,
    #[serde(rename = "$o", default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<StreamMap>,
}

impl TransactionEnvelope {
    /// Empty envelope for the todo contract with the given entry.
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            contract: TODO_CONTRACT.to_string(),
            entry: Some(entry.into()),
            inputs: StreamMap::new(),
            outputs: None,
        }
    }

    /// `create`: payload travels under the acting identity in `$i`.
    pub fn create(identity: &StreamId, todo: &CreateTodo) -> Self {
        let mut envelope = Self::new("create");
        envelope
            .inputs
            .insert(identity.to_string(), payload_value(todo));
        envelope
    }

    /// `update`: blank `$i` for the signer, patch under the todo in `$o`.
    pub fn update(identity: &StreamId, todo_stream: &StreamId, patch: &TodoPatch) -> Self {
        Self::with_output(
            "update",
            identity,
            todo_stream,
            payload_value(patch),
        )
    }

    /// `share`: blank `$i` for the signer, recipient under the todo in `$o`.
    pub fn share(identity: &StreamId, todo_stream: &StreamId, recipient: &StreamId) -> Self {
        let payload = ShareTodo {
            stream: recipient.to_string(),
        };
        Self::with_output("share", identity, todo_stream, payload_value(&payload))
    }

    fn with_output(
        entry: &str,
        identity: &StreamId,
        target: &StreamId,
        payload: Value,
    ) -> Self {
        let mut envelope = Self::new(entry);
        envelope
            .inputs
            .insert(identity.to_string(), Value::Object(Map::new()));
        let mut outputs = StreamMap::new();
        outputs.insert(target.to_string(), payload);
        envelope.outputs = Some(outputs);
        envelope
    }

    /// First stream of `$i`: the stream that signed the transaction.
    pub fn acting_stream(&self) -> Option<StreamId> {
        self.inputs.keys().next().map(|key| StreamId::new(key.as_str()))
    }

    /// First stream of `$o`, when outputs are present.
    pub fn output_stream(&self) -> Option<StreamId> {
        self.outputs
            .as_ref()
            .and_then(|outputs| outputs.keys().next())
            .map(|key| StreamId::new(key.as_str()))
    }

    pub fn acting_payload(&self) -> Option<&Value> {
        self.inputs.values().next()
    }

    pub fn output_payload(&self) -> Option<&Value> {
        self.outputs
            .as_ref()
            .and_then(|outputs| outputs.values().next())
    }
}

/// Envelope plus signatures as received by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(rename = "$tx")]
    pub tx: TransactionEnvelope,
    /// Signature per signing stream id.
    #[serde(rename = "$sigs", default)]
    pub sigs: BTreeMap<String, String>,
    /// Set when the transaction is signed by keys not yet on the ledger.
    #[serde(rename = "$selfsign", default)]
    pub self_sign: bool,
}

impl SignedTransaction {
    pub fn new(tx: TransactionEnvelope) -> Self {
        Self {
            tx,
            sigs: BTreeMap::new(),
            self_sign: false,
        }
    }

    /// Attaches a signature for `stream`.
    pub fn signed_by(mut self, stream: &StreamId, signature: impl Into<String>) -> Self {
        self.sigs.insert(stream.to_string(), signature.into());
        self
    }

    /// Returns whether a non-empty signature exists for `stream`.
    pub fn has_signature_from(&self, stream: &StreamId) -> bool {
        self.sigs
            .get(stream.as_str())
            .is_some_and(|signature| !signature.trim().is_empty())
    }
}

/// Payload for creating a todo item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub name: String,
    pub body: String,
    /// Opaque date value, stored as received.
    pub due_date: Value,
}

impl CreateTodo {
    pub fn new(name: impl Into<String>, body: impl Into<String>, due_date: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            due_date: due_date.into(),
        }
    }
}

/// Partial replacement of todo fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Value>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.body.is_none() && self.due_date.is_none()
    }
}

/// Payload for sharing a todo item with another stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTodo {
    pub stream: String,
}

fn payload_value<T: Serialize>(payload: &T) -> Value {
    // Payload types only hold strings and JSON values.
    serde_json::to_value(payload).unwrap_or(Value::Null)
}
