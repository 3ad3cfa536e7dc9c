use std::sync::Arc;

use crate::vectors::table::ReleaseStats;
use crate::vectors::{EmbeddingTable, LoadSettings, VectorError};

/// Per-process host state. The table is only ever replaced or released as a
/// whole; readers get an `Arc` handle.
pub struct HostState {
    pub settings: Option<LoadSettings>,
    pub table: Option<Arc<EmbeddingTable>>,
    pub should_exit: bool,
}

impl HostState {
    pub fn new() -> Self {
        Self {
            settings: None,
            table: None,
            should_exit: false,
        }
    }

    /// Shared handle to the loaded table, if any.
    pub fn table(&self) -> Option<Arc<EmbeddingTable>> {
        self.table.clone()
    }

    /// Release the loaded table. Refused while other handles are alive, so no
    /// averaging can still be reading it.
    pub fn release(&mut self) -> Result<Option<ReleaseStats>, VectorError> {
        let Some(table) = self.table.take() else {
            return Ok(None);
        };
        match Arc::try_unwrap(table) {
            Ok(table) => {
                self.settings = None;
                Ok(Some(table.release()))
            }
            Err(shared) => {
                let handles = Arc::strong_count(&shared);
                self.table = Some(shared);
                Err(VectorError::configuration(format!(
                    "embedding table is still in use ({handles} handles)"
                )))
            }
        }
    }
}
