//! In-memory cell store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::EngineResult;
use crate::models::{CellId, CellRecord};

use super::CellPersister;

/// A cell together with the identifier it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCell {
    /// Identifier handed back by the insert.
    pub id: CellId,
    /// The stored record.
    pub cell: CellRecord,
}

/// Keeps cells in process memory, numbering them from 1.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    cells: Mutex<Vec<StoredCell>>,
}

impl MemoryPersister {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored cell in insertion order.
    pub async fn cells(&self) -> Vec<StoredCell> {
        self.cells.lock().await.clone()
    }

    /// Returns the cells stored for one schedule.
    pub async fn cells_for_schedule(&self, schedule_id: i64) -> Vec<StoredCell> {
        self.cells
            .lock()
            .await
            .iter()
            .filter(|stored| stored.cell.schedule_id == schedule_id)
            .cloned()
            .collect()
    }

    /// Number of stored cells.
    pub async fn len(&self) -> usize {
        self.cells.lock().await.len()
    }

    /// Returns true when nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.cells.lock().await.is_empty()
    }
}

#[async_trait]
impl CellPersister for MemoryPersister {
    async fn insert_cell(&self, cell: &CellRecord) -> EngineResult<CellId> {
        let mut cells = self.cells.lock().await;
        let id = cells.len() as CellId + 1;
        cells.push(StoredCell {
            id,
            cell: cell.clone(),
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn cell(schedule_id: i64, student_id: i64, column_number: u32) -> CellRecord {
        CellRecord {
            center_id: 1,
            schedule_id,
            instructor_id: None,
            student_id,
            time_start: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            time_end: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            column_number,
        }
    }

    #[tokio::test]
    async fn test_insert_cell_numbers_from_one() {
        let store = MemoryPersister::new();
        assert!(store.is_empty().await);

        assert_eq!(store.insert_cell(&cell(1, 5, 1)).await.unwrap(), 1);
        assert_eq!(store.insert_cell(&cell(1, 6, 2)).await.unwrap(), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_default_batch_returns_one_result_per_cell() {
        let store = MemoryPersister::new();
        let cells = vec![cell(1, 5, 1), cell(2, 6, 1), cell(1, 7, 2)];

        let results = store.insert_batch(&cells).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(store.cells_for_schedule(1).await.len(), 2);
    }
}
