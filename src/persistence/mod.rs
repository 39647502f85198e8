//! Persistence of assigned grid cells.
//!
//! The engine only knows the [`CellPersister`] contract: insert one cell,
//! get back its identifier or an error. Two adapters ship with the crate:
//! [`MemoryPersister`] for tests and embedding, and [`SqliteStore`] for the
//! local relational store, which also serves the roster lookups.

mod memory;
mod sqlite;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::EngineResult;
use crate::models::{CellId, CellRecord};

pub use memory::{MemoryPersister, StoredCell};
pub use sqlite::SqliteStore;

/// Writes assigned cells.
#[async_trait]
pub trait CellPersister: Send + Sync {
    /// Stores one cell and returns its identifier.
    async fn insert_cell(&self, cell: &CellRecord) -> EngineResult<CellId>;

    /// Stores every cell, returning one result per cell in input order.
    ///
    /// The default issues all inserts concurrently and waits for every one
    /// of them; a failed insert does not stop or undo its siblings.
    /// Implementations that can write atomically should override this.
    async fn insert_batch(&self, cells: &[CellRecord]) -> Vec<EngineResult<CellId>> {
        join_all(cells.iter().map(|cell| self.insert_cell(cell))).await
    }
}
