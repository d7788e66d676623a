//! Vote phase: ownership authorization against current state. Pure.

use crate::contract::error::ContractError;
use crate::contract::verify::{Action, VerifiedTransaction};
use crate::model::stream::StreamId;
use crate::model::todo::TodoState;
use crate::model::transaction::{CreateTodo, TodoPatch};

/// Transaction approved by the vote phase, bundled with the state it was
/// judged against. Only values of this type can be committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorized {
    Create {
        namespace: String,
        owner: StreamId,
        todo: CreateTodo,
    },
    Update {
        target: StreamId,
        current: TodoState,
        patch: TodoPatch,
    },
    Share {
        target: StreamId,
        current: TodoState,
        recipient: StreamId,
    },
}

/// Approves or rejects `verified` given the target's current state.
///
/// `current` is `None` when the target stream does not hold a todo, which
/// fails the ownership check for update/share.
pub fn vote(
    verified: &VerifiedTransaction,
    current: Option<&TodoState>,
) -> Result<(), ContractError> {
    match &verified.action {
        Action::Create { .. } => Ok(()),
        Action::Update { .. } | Action::Share { .. } => {
            let is_owner = match (verified.acting.as_ref(), current) {
                (Some(acting), Some(state)) => state.is_owned_by(acting),
                _ => false,
            };
            if is_owner {
                Ok(())
            } else {
                Err(ContractError::NotOwner(verified.entry()))
            }
        }
    }
}

/// Runs `vote` and, on approval, takes ownership of the verified data.
pub fn authorize(
    verified: VerifiedTransaction,
    current: Option<TodoState>,
) -> Result<Authorized, ContractError> {
    vote(&verified, current.as_ref())?;

    let entry = verified.entry();
    let authorized = match (verified.action, current) {
        (Action::Create { owner, todo }, _) => Authorized::Create {
            namespace: verified.namespace,
            owner,
            todo,
        },
        (Action::Update { target, patch }, Some(current)) => Authorized::Update {
            target,
            current,
            patch,
        },
        (Action::Share { target, recipient }, Some(current)) => Authorized::Share {
            target,
            current,
            recipient,
        },
        // `vote` already rejects update/share without current state.
        (_, None) => return Err(ContractError::NotOwner(entry)),
    };
    Ok(authorized)
}

#[cfg(test)]
mod tests {
    use super::{authorize, vote, Authorized};
    use crate::contract::entry::Entry;
    use crate::contract::error::ContractError;
    use crate::contract::verify::{Action, VerifiedTransaction};
    use crate::model::stream::StreamId;
    use crate::model::todo::TodoState;
    use crate::model::transaction::{CreateTodo, TodoPatch};

    fn owned_by(owner: &str) -> TodoState {
        TodoState::created(StreamId::new(owner), "todo", CreateTodo::new("n", "b", "d"))
    }

    fn update_from(acting: Option<&str>) -> VerifiedTransaction {
        VerifiedTransaction {
            namespace: "todo".to_string(),
            acting: acting.map(StreamId::new),
            action: Action::Update {
                target: StreamId::new("T1"),
                patch: TodoPatch {
                    name: Some("x".to_string()),
                    ..TodoPatch::default()
                },
            },
        }
    }

    #[test]
    fn create_is_always_approved() {
        let verified = VerifiedTransaction {
            namespace: "todo".to_string(),
            acting: Some(StreamId::new("S1")),
            action: Action::Create {
                owner: StreamId::new("S1"),
                todo: CreateTodo::new("n", "b", "d"),
            },
        };
        assert_eq!(vote(&verified, None), Ok(()));
    }

    #[test]
    fn owner_may_update() {
        assert_eq!(vote(&update_from(Some("S1")), Some(&owned_by("S1"))), Ok(()));
    }

    #[test]
    fn non_owner_or_missing_state_is_rejected() {
        let expected = Err(ContractError::NotOwner(Entry::Update));
        assert_eq!(vote(&update_from(Some("S2")), Some(&owned_by("S1"))), expected);
        assert_eq!(vote(&update_from(Some("S1")), None), expected);
        assert_eq!(vote(&update_from(None), Some(&owned_by("S1"))), expected);
    }

    #[test]
    fn share_uses_same_ownership_rule() {
        let verified = VerifiedTransaction {
            namespace: "todo".to_string(),
            acting: Some(StreamId::new("S2")),
            action: Action::Share {
                target: StreamId::new("T1"),
                recipient: StreamId::new("a".repeat(64)),
            },
        };
        assert_eq!(
            vote(&verified, Some(&owned_by("S1"))),
            Err(ContractError::NotOwner(Entry::Share))
        );
    }

    #[test]
    fn authorize_carries_current_state_forward() {
        let authorized = authorize(update_from(Some("S1")), Some(owned_by("S1"))).expect("owner should be authorized");
        match authorized {
            Authorized::Update { target, current, .. } => {
                assert_eq!(target, StreamId::new("T1"));
                assert_eq!(current.owner, StreamId::new("S1"));
            }
            other => panic!("unexpected authorization: {other:?}"),
        }

        assert_eq!(
            authorize(update_from(Some("S1")), None).expect_err("missing todo should be rejected"),
            ContractError::NotOwner(Entry::Update)
        );
    }
}
