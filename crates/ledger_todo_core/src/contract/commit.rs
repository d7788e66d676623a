//! Commit phase: computes the new state. Side effects are returned to the
//! host as a `StateChange`, never applied here.

use crate::contract::vote::Authorized;
use crate::model::stream::StreamId;
use crate::model::todo::TodoState;

/// Change the host must apply once the transaction is agreed on.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Allocate a new stream holding `state` and copy the authority of
    /// `authority_from` onto it.
    Create {
        authority_from: StreamId,
        state: TodoState,
    },
    /// Replace the state of an existing stream.
    Replace { stream: StreamId, state: TodoState },
}

impl StateChange {
    pub fn state(&self) -> &TodoState {
        match self {
            Self::Create { state, .. } | Self::Replace { state, .. } => state,
        }
    }
}

/// Produces the state change for an authorized transaction. Infallible.
pub fn commit(authorized: Authorized) -> StateChange {
    match authorized {
        Authorized::Create {
            namespace,
            owner,
            todo,
        } => StateChange::Create {
            authority_from: owner.clone(),
            state: TodoState::created(owner, &namespace, todo),
        },
        Authorized::Update {
            target,
            mut current,
            patch,
        } => {
            current.apply_patch(patch);
            StateChange::Replace {
                stream: target,
                state: current,
            }
        }
        Authorized::Share {
            target,
            mut current,
            recipient,
        } => {
            current.share_with(recipient);
            StateChange::Replace {
                stream: target,
                state: current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{commit, StateChange};
    use crate::contract::vote::Authorized;
    use crate::model::stream::StreamId;
    use crate::model::todo::TodoState;
    use crate::model::transaction::{CreateTodo, TodoPatch};
    use serde_json::json;

    fn existing() -> TodoState {
        TodoState::created(
            StreamId::new("S1"),
            "todo",
            CreateTodo::new("Buy milk", "2% milk", "2024-01-01"),
        )
    }

    #[test]
    fn create_builds_fresh_document() {
        let change = commit(Authorized::Create {
            namespace: "acme".to_string(),
            owner: StreamId::new("S1"),
            todo: CreateTodo::new("Buy milk", "2% milk", "2024-01-01"),
        });

        match change {
            StateChange::Create {
                authority_from,
                state,
            } => {
                assert_eq!(authority_from, StreamId::new("S1"));
                assert_eq!(state.owner, StreamId::new("S1"));
                assert_eq!(state.kind, "acme.todo");
                assert!(state.shared_with.is_empty());
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[test]
    fn update_replaces_only_given_fields() {
        let change = commit(Authorized::Update {
            target: StreamId::new("T1"),
            current: existing(),
            patch: TodoPatch {
                name: Some("Buy oat milk".to_string()),
                ..TodoPatch::default()
            },
        });

        let state = change.state();
        assert_eq!(state.name, "Buy oat milk");
        assert_eq!(state.body, "2% milk");
        assert_eq!(state.due_date, json!("2024-01-01"));
    }

    #[test]
    fn share_appends_recipient() {
        let recipient = StreamId::new("b".repeat(64));
        let change = commit(Authorized::Share {
            target: StreamId::new("T1"),
            current: existing(),
            recipient: recipient.clone(),
        });

        assert_eq!(
            change,
            StateChange::Replace {
                stream: StreamId::new("T1"),
                state: TodoState {
                    shared_with: vec![recipient],
                    ..existing()
                },
            }
        );
    }
}
