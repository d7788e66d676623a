//! `LedgerHost` over the SQLite stream repository.

use super::{HostError, LedgerHost};
use crate::model::stream::StreamId;
use crate::repo::stream_repo::{SqliteStreamRepository, StreamRepository};
use log::debug;
use serde_json::Value;

impl LedgerHost for SqliteStreamRepository<'_> {
    fn resolve_stream(&self, id: &StreamId) -> Result<Option<Value>, HostError> {
        Ok(self.get_stream(id)?.map(|record| record.state))
    }

    fn create_stream(&self, state: &Value) -> Result<StreamId, HostError> {
        let id = StreamId::mint();
        self.insert_stream(&id, state, None)?;
        debug!("event=stream_create module=host status=ok stream={id}");
        Ok(id)
    }

    fn copy_authority(&self, from: &StreamId, to: &StreamId) -> Result<(), HostError> {
        let parent = self
            .get_stream(from)?
            .ok_or_else(|| HostError::StreamNotFound(from.clone()))?;
        self.set_authority(to, parent.authority.as_ref())?;
        Ok(())
    }

    fn write_stream(&self, id: &StreamId, state: &Value) -> Result<(), HostError> {
        self.update_state(id, state)?;
        Ok(())
    }
}
