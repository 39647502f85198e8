//! SQLite-backed store for the roster, session types and grid cells.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::engine::{LookupCache, LookupSource};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CellId, CellRecord, SessionType, StudentRecord, format_time_of_day, parse_time_of_day,
};

use super::{CellPersister, StoredCell};

/// The local relational store.
///
/// Serves student and session-type lookups from its tables and persists
/// grid cells. A batch of cells is written inside one transaction, so an
/// import either stores every cell or none of them.
///
/// The [`LookupSource`] methods query the database on the calling thread.
/// From async code, call [`preload_lookups`](SqliteStore::preload_lookups)
/// before an import so the tables are read on the blocking pool and the
/// import resolves rows from the warm cache.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> EngineResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| EngineError::Persistence {
            message: "database connection lock poisoned".to_string(),
        })
    }

    /// Inserts or replaces a roster entry.
    pub fn upsert_student(&self, student: &StudentRecord) -> EngineResult<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO students(id, first_name, last_name, active)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                student.id,
                student.first_name,
                student.last_name,
                student.active
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces a session type.
    pub fn upsert_session_type(&self, session_type: &SessionType) -> EngineResult<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO session_types(id, name, alias, duration_minutes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_type.id,
                session_type.name,
                session_type.alias,
                session_type.duration_minutes
            ],
        )?;
        Ok(())
    }

    /// Returns the cells stored for one schedule, by time then column.
    pub fn cells_for_schedule(&self, schedule_id: i64) -> EngineResult<Vec<StoredCell>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, center_id, schedule_id, instructor_id, student_id,
                    time_start, time_end, column_number
             FROM schedule_cells
             WHERE schedule_id = ?1
             ORDER BY time_start, column_number",
        )?;
        let rows = stmt
            .query_map([schedule_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, u32>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, center_id, schedule_id, instructor_id, student_id, start, end, column)| {
                    Ok(StoredCell {
                        id,
                        cell: CellRecord {
                            center_id,
                            schedule_id,
                            instructor_id,
                            student_id,
                            time_start: parse_time_of_day(&start)?,
                            time_end: parse_time_of_day(&end)?,
                            column_number: column,
                        },
                    })
                },
            )
            .collect()
    }

    /// Reads both lookup tables on the blocking pool and warms `cache`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LookupSource`] if either table cannot be read.
    pub async fn preload_lookups(&self, cache: &mut LookupCache) -> EngineResult<()> {
        let store = self.clone();
        let (students, session_types) = tokio::task::spawn_blocking(move || {
            let conn = store.lock()?;
            Ok::<_, EngineError>((read_students(&conn)?, read_session_types(&conn)?))
        })
        .await
        .map_err(|err| EngineError::LookupSource {
            message: format!("lookup task failed: {}", err),
        })??;

        debug!(
            students = students.len(),
            session_types = session_types.len(),
            "Preloaded lookup tables"
        );
        cache.warm(students, session_types);
        Ok(())
    }

    fn insert_batch_blocking(&self, cells: &[CellRecord]) -> EngineResult<Vec<CellId>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(cells.len());
        for cell in cells {
            ids.push(insert_cell_row(&tx, cell)?);
        }
        tx.commit()?;
        debug!(cells = ids.len(), "Committed cell batch");
        Ok(ids)
    }
}

fn init_schema(conn: &Connection) -> EngineResult<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_types(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            alias TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule_cells(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            center_id INTEGER NOT NULL,
            schedule_id INTEGER NOT NULL,
            instructor_id INTEGER,
            student_id INTEGER,
            time_start TEXT NOT NULL,
            time_end TEXT NOT NULL,
            column_number INTEGER NOT NULL CHECK (column_number >= 1)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedule_cells_schedule ON schedule_cells(schedule_id)",
        [],
    )?;

    Ok(())
}

fn insert_cell_row(conn: &Connection, cell: &CellRecord) -> rusqlite::Result<CellId> {
    conn.execute(
        "INSERT INTO schedule_cells(
            center_id, schedule_id, instructor_id, student_id,
            time_start, time_end, column_number
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            cell.center_id,
            cell.schedule_id,
            cell.instructor_id,
            cell.student_id,
            format_time_of_day(cell.time_start),
            format_time_of_day(cell.time_end),
            cell.column_number
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn lookup_error(error: rusqlite::Error) -> EngineError {
    EngineError::LookupSource {
        message: error.to_string(),
    }
}

fn join_error(error: tokio::task::JoinError) -> EngineError {
    EngineError::Persistence {
        message: format!("database task failed: {}", error),
    }
}

fn read_students(conn: &Connection) -> EngineResult<Vec<StudentRecord>> {
    let mut stmt = conn
        .prepare("SELECT id, first_name, last_name, active FROM students ORDER BY id")
        .map_err(lookup_error)?;
    let students = stmt
        .query_map([], |row| {
            Ok(StudentRecord {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                active: row.get(3)?,
            })
        })
        .map_err(lookup_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(lookup_error)?;
    Ok(students)
}

fn read_session_types(conn: &Connection) -> EngineResult<Vec<SessionType>> {
    let mut stmt = conn
        .prepare("SELECT id, name, alias, duration_minutes FROM session_types ORDER BY id")
        .map_err(lookup_error)?;
    let session_types = stmt
        .query_map([], |row| {
            Ok(SessionType {
                id: row.get(0)?,
                name: row.get(1)?,
                alias: row.get(2)?,
                duration_minutes: row.get(3)?,
            })
        })
        .map_err(lookup_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(lookup_error)?;
    Ok(session_types)
}

impl LookupSource for SqliteStore {
    fn students(&self) -> EngineResult<Vec<StudentRecord>> {
        read_students(&*self.lock()?)
    }

    fn session_types(&self) -> EngineResult<Vec<SessionType>> {
        read_session_types(&*self.lock()?)
    }
}

#[async_trait]
impl CellPersister for SqliteStore {
    async fn insert_cell(&self, cell: &CellRecord) -> EngineResult<CellId> {
        let store = self.clone();
        let cell = cell.clone();
        tokio::task::spawn_blocking(move || -> EngineResult<CellId> {
            let conn = store.lock()?;
            Ok(insert_cell_row(&conn, &cell)?)
        })
        .await
        .map_err(join_error)?
    }

    async fn insert_batch(&self, cells: &[CellRecord]) -> Vec<EngineResult<CellId>> {
        let store = self.clone();
        let owned = cells.to_vec();
        let outcome = tokio::task::spawn_blocking(move || store.insert_batch_blocking(&owned))
            .await
            .map_err(join_error)
            .and_then(|result| result);

        match outcome {
            Ok(ids) => ids.into_iter().map(Ok).collect(),
            Err(err) => {
                let rolled_back = EngineError::Persistence {
                    message: format!("batch rolled back: {}", err),
                };
                vec![Err(rolled_back); cells.len()]
            }
        }
    }
}
