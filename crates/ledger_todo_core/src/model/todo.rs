//! Todo state document.
//!
//! # Responsibility
//! - Define the persisted shape of a todo stream.
//! - Provide the field-level mutations used by contract commits.
//!
//! # Invariants
//! - `owner` is set once at creation and never rewritten.
//! - `shared_with` only grows; entries are never removed or deduplicated.
//! - `kind` is `"<namespace>.todo"` and set once at creation.
//! - Document keys outside the typed fields survive a read/write cycle.

use crate::model::stream::StreamId;
use crate::model::transaction::{CreateTodo, TodoPatch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Suffix appended to the transaction namespace to form the todo type.
pub const TODO_TYPE_SUFFIX: &str = ".todo";

/// State document stored on a todo stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoState {
    pub owner: StreamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub due_date: Value,
    /// Serialized as `type` to match the ledger document.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub shared_with: Vec<StreamId>,
    /// Keys written by other parties; carried through commits untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TodoState {
    /// Builds the initial document for a freshly created todo.
    pub fn created(owner: StreamId, namespace: &str, todo: CreateTodo) -> Self {
        Self {
            owner,
            name: todo.name,
            body: todo.body,
            due_date: todo.due_date,
            kind: todo_type(namespace),
            shared_with: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Overwrites each field present in `patch`.
    pub fn apply_patch(&mut self, patch: TodoPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }

    /// Appends `recipient` to `shared_with` without a duplicate check.
    pub fn share_with(&mut self, recipient: StreamId) {
        self.shared_with.push(recipient);
    }

    pub fn is_owned_by(&self, stream: &StreamId) -> bool {
        &self.owner == stream
    }

    /// Returns whether `stream` owns the item or appears in `shared_with`.
    pub fn is_visible_to(&self, stream: &StreamId) -> bool {
        self.is_owned_by(stream) || self.shared_with.contains(stream)
    }

    /// Reads a todo from a raw stream document; `None` for any other shape.
    pub fn from_document(document: &Value) -> Option<Self> {
        let state = serde_json::from_value::<Self>(document.clone()).ok()?;
        is_todo_type(&state.kind).then_some(state)
    }

    pub fn to_document(&self) -> Value {
        // Field types are strings and JSON values only.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `"<namespace>.todo"`.
pub fn todo_type(namespace: &str) -> String {
    format!("{namespace}{TODO_TYPE_SUFFIX}")
}

pub fn is_todo_type(kind: &str) -> bool {
    kind.ends_with(TODO_TYPE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::{todo_type, TodoState};
    use crate::model::stream::StreamId;
    use crate::model::transaction::{CreateTodo, TodoPatch};
    use serde_json::json;

    fn sample() -> TodoState {
        TodoState::created(
            StreamId::new("S1"),
            "todo",
            CreateTodo::new("Buy milk", "2% milk", "2024-01-01"),
        )
    }

    #[test]
    fn document_uses_ledger_field_names() {
        let json = sample().to_document();
        assert_eq!(
            json,
            json!({
                "owner": "S1",
                "name": "Buy milk",
                "body": "2% milk",
                "dueDate": "2024-01-01",
                "type": "todo.todo",
                "sharedWith": []
            })
        );
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut state = sample();
        state.apply_patch(TodoPatch {
            due_date: Some(json!("2024-02-02")),
            ..TodoPatch::default()
        });

        assert_eq!(state.name, "Buy milk");
        assert_eq!(state.body, "2% milk");
        assert_eq!(state.due_date, json!("2024-02-02"));
        assert_eq!(state.owner, StreamId::new("S1"));
    }

    #[test]
    fn from_document_rejects_non_todo_streams() {
        let identity = json!({ "type": "identity", "name": "alice" });
        assert_eq!(TodoState::from_document(&identity), None);

        let wrong_type = json!({
            "owner": "S1", "name": "n", "body": "b", "dueDate": 1, "type": "todo.note"
        });
        assert_eq!(TodoState::from_document(&wrong_type), None);
    }

    #[test]
    fn sparse_document_with_owner_still_reads_as_todo() {
        let sparse = json!({ "owner": "S1", "name": "n", "body": "b", "type": "todo.todo" });
        let state = TodoState::from_document(&sparse).expect("owned todo should parse");

        assert!(state.is_owned_by(&StreamId::new("S1")));
        assert_eq!(state.due_date, json!(null));
        assert!(state.shared_with.is_empty());
    }

    #[test]
    fn unknown_keys_survive_patch_and_write() {
        let stored = json!({
            "owner": "S1", "name": "n", "body": "b", "dueDate": "d",
            "type": "todo.todo", "sharedWith": [], "_rev": "3-abc", "priority": 2
        });
        let mut state = TodoState::from_document(&stored).expect("stored todo should parse");
        state.apply_patch(TodoPatch {
            name: Some("x".to_string()),
            ..TodoPatch::default()
        });

        let written = state.to_document();
        assert_eq!(written["name"], json!("x"));
        assert_eq!(written["priority"], json!(2));
        assert_eq!(written["_rev"], json!("3-abc"));
    }

    #[test]
    fn visibility_covers_owner_and_recipients() {
        let mut state = sample();
        state.share_with(StreamId::new("S2"));

        assert!(state.is_visible_to(&StreamId::new("S1")));
        assert!(state.is_visible_to(&StreamId::new("S2")));
        assert!(!state.is_visible_to(&StreamId::new("S3")));
        assert_eq!(todo_type("acme"), "acme.todo");
    }
}
