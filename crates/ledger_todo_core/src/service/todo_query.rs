//! Todo read-side use-cases.
//!
//! # Responsibility
//! - List todos created by, or shared with, the session identity.
//! - Look up one todo by stream id with visibility checks.
//!
//! # Invariants
//! - Every query is scoped by an explicit `Session`.
//! - A todo is visible only to its owner and its `sharedWith` members.
//! - Non-todo streams never appear in results.

use crate::model::stream::StreamId;
use crate::model::todo::TodoState;
use crate::repo::stream_repo::{RepoResult, StreamRecord, StreamRepository, TodoListQuery};
use crate::service::session::Session;
use serde_json::Value;

/// Read model for todo list/detail use-cases.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoRecord {
    pub stream_id: StreamId,
    pub owner: StreamId,
    pub name: String,
    pub body: String,
    pub due_date: Value,
    pub shared_with: Vec<StreamId>,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl TodoRecord {
    fn from_stream(record: StreamRecord) -> Option<Self> {
        let state = TodoState::from_document(&record.state)?;
        Some(Self::from_state(record, state))
    }

    fn from_state(record: StreamRecord, state: TodoState) -> Self {
        Self {
            stream_id: record.id,
            owner: state.owner,
            name: state.name,
            body: state.body,
            due_date: state.due_date,
            shared_with: state.shared_with,
            updated_at: record.updated_at,
        }
    }
}

/// Query facade over a stream repository.
pub struct TodoQueryService<R: StreamRepository> {
    repo: R,
}

impl<R: StreamRepository> TodoQueryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Todos owned by the session identity.
    pub fn created_todos(
        &self,
        session: &Session,
        limit: Option<u32>,
    ) -> RepoResult<Vec<TodoRecord>> {
        self.list(TodoListQuery {
            owner: Some(session.identity().clone()),
            limit,
            ..TodoListQuery::default()
        })
    }

    /// Todos whose `sharedWith` contains the session identity.
    pub fn shared_todos(
        &self,
        session: &Session,
        limit: Option<u32>,
    ) -> RepoResult<Vec<TodoRecord>> {
        self.list(TodoListQuery {
            shared_with: Some(session.identity().clone()),
            limit,
            ..TodoListQuery::default()
        })
    }

    /// One todo by stream id; `None` when missing, not a todo, or not
    /// visible to the session identity.
    pub fn find_todo(
        &self,
        session: &Session,
        id: &StreamId,
    ) -> RepoResult<Option<TodoRecord>> {
        let Some(record) = self.repo.get_stream(id)? else {
            return Ok(None);
        };
        let visible = TodoState::from_document(&record.state)
            .filter(|state| state.is_visible_to(session.identity()));
        Ok(visible.map(|state| TodoRecord::from_state(record, state)))
    }

    fn list(&self, query: TodoListQuery) -> RepoResult<Vec<TodoRecord>> {
        Ok(self
            .repo
            .list_todos(&query)?
            .into_iter()
            .filter_map(TodoRecord::from_stream)
            .collect())
    }
}
