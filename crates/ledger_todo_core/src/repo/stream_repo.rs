//! Stream repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist stream state documents and authority metadata.
//! - Maintain the `stream_shares` index mirroring each todo's `sharedWith`.
//! - Answer todo list queries by owner and by shared-with membership.
//!
//! # Invariants
//! - `streams.owner` / `streams.kind` always mirror the stored document.
//! - `stream_shares` holds one row per `sharedWith` position, duplicates
//!   included.
//! - Multi-statement writes expect the caller to hold a transaction.

use crate::db::DbError;
use crate::model::stream::{Authority, StreamId};
use crate::model::todo::TODO_TYPE_SUFFIX;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const STREAM_SELECT_SQL: &str = "SELECT
    id,
    state,
    authority,
    created_at,
    updated_at
FROM streams";

const TODOS_DEFAULT_LIMIT: u32 = 50;
const TODOS_LIMIT_MAX: u32 = 200;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for stream persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(StreamId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "stream not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stream data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Stored stream row.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub id: StreamId,
    /// Raw state document.
    pub state: Value,
    pub authority: Option<Authority>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Query options for listing todo streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoListQuery {
    /// Only todos whose `owner` equals this stream.
    pub owner: Option<StreamId>,
    /// Only todos whose `sharedWith` contains this stream.
    pub shared_with: Option<StreamId>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for stream storage.
pub trait StreamRepository {
    /// Inserts a new stream; fails if the id already exists.
    fn insert_stream(
        &self,
        id: &StreamId,
        state: &Value,
        authority: Option<&Authority>,
    ) -> RepoResult<()>;
    /// Replaces the state document of an existing stream.
    fn update_state(&self, id: &StreamId, state: &Value) -> RepoResult<()>;
    /// Replaces the authority of an existing stream.
    fn set_authority(&self, id: &StreamId, authority: Option<&Authority>) -> RepoResult<()>;
    fn get_stream(&self, id: &StreamId) -> RepoResult<Option<StreamRecord>>;
    /// Lists todo streams sorted by `updated_at DESC, id ASC`.
    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<StreamRecord>>;
}

/// SQLite-backed stream repository.
pub struct SqliteStreamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStreamRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StreamRepository for SqliteStreamRepository<'_> {
    fn insert_stream(
        &self,
        id: &StreamId,
        state: &Value,
        authority: Option<&Authority>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO streams (id, kind, owner, state, authority)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.as_str(),
                document_str(state, "type"),
                document_str(state, "owner"),
                state.to_string(),
                encode_authority(authority)?,
            ],
        )?;
        self.replace_shares(id, state)?;
        Ok(())
    }

    fn update_state(&self, id: &StreamId, state: &Value) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE streams
             SET
                kind = ?1,
                owner = ?2,
                state = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![
                document_str(state, "type"),
                document_str(state, "owner"),
                state.to_string(),
                id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }

        self.replace_shares(id, state)?;
        Ok(())
    }

    fn set_authority(&self, id: &StreamId, authority: Option<&Authority>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE streams
             SET
                authority = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![encode_authority(authority)?, id.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn get_stream(&self, id: &StreamId) -> RepoResult<Option<StreamRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("{STREAM_SELECT_SQL} WHERE id = ?1;"),
                [id.as_str()],
                read_raw_row,
            )
            .optional()?;

        raw.map(RawStreamRow::parse).transpose()
    }

    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<StreamRecord>> {
        // GLOB is case-sensitive, matching `is_todo_type`.
        let mut sql = format!("{STREAM_SELECT_SQL} WHERE kind GLOB ?");
        let mut bind_values: Vec<SqlValue> =
            vec![SqlValue::Text(format!("*{TODO_TYPE_SUFFIX}"))];

        if let Some(owner) = &query.owner {
            sql.push_str(" AND owner = ?");
            bind_values.push(SqlValue::Text(owner.to_string()));
        }

        if let Some(recipient) = &query.shared_with {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM stream_shares
                    WHERE stream_shares.stream_id = streams.id
                      AND stream_shares.recipient = ?
                )",
            );
            bind_values.push(SqlValue::Text(recipient.to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC LIMIT ? OFFSET ?");
        bind_values.push(SqlValue::Integer(i64::from(normalize_todo_limit(
            query.limit,
        ))));
        bind_values.push(SqlValue::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(read_raw_row(row)?.parse()?);
        }

        Ok(records)
    }
}

impl SqliteStreamRepository<'_> {
    fn replace_shares(&self, id: &StreamId, state: &Value) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM stream_shares WHERE stream_id = ?1;", [id.as_str()])?;

        let recipients = state
            .get("sharedWith")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut stmt = self.conn.prepare(
            "INSERT INTO stream_shares (stream_id, position, recipient) VALUES (?1, ?2, ?3);",
        )?;
        for (position, recipient) in recipients.iter().enumerate() {
            let recipient = recipient.as_str().ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "sharedWith[{position}] of stream {id} is not a string"
                ))
            })?;
            let position = i64::try_from(position).map_err(|_| {
                RepoError::InvalidData(format!("sharedWith of stream {id} is too long"))
            })?;
            stmt.execute(params![id.as_str(), position, recipient])?;
        }
        Ok(())
    }
}

/// Effective list limit: default when absent, clamped to the maximum.
pub fn normalize_todo_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => TODOS_DEFAULT_LIMIT,
        Some(value) => value.min(TODOS_LIMIT_MAX),
    }
}

struct RawStreamRow {
    id: String,
    state: String,
    authority: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RawStreamRow {
    fn parse(self) -> RepoResult<StreamRecord> {
        let state = serde_json::from_str::<Value>(&self.state).map_err(|err| {
            RepoError::InvalidData(format!("invalid state json for stream {}: {err}", self.id))
        })?;
        let authority = match self.authority {
            Some(text) => Some(serde_json::from_str::<Authority>(&text).map_err(|err| {
                RepoError::InvalidData(format!(
                    "invalid authority json for stream {}: {err}",
                    self.id
                ))
            })?),
            None => None,
        };

        Ok(StreamRecord {
            id: StreamId::new(self.id),
            state,
            authority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawStreamRow> {
    Ok(RawStreamRow {
        id: row.get("id")?,
        state: row.get("state")?,
        authority: row.get("authority")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn document_str<'a>(state: &'a Value, field: &str) -> Option<&'a str> {
    state.get(field).and_then(Value::as_str)
}

fn encode_authority(authority: Option<&Authority>) -> RepoResult<Option<String>> {
    authority
        .map(|authority| {
            serde_json::to_string(authority)
                .map_err(|err| RepoError::InvalidData(format!("unencodable authority: {err}")))
        })
        .transpose()
}
