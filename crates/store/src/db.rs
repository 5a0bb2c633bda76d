use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use duckdb::{Connection, params};
use querylog_core::error::{QueryLogError, Result};

use crate::schema::qualified_name;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| QueryLogError::Io(format!("failed to create db dir: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| QueryLogError::Store(format!("failed to open duckdb: {e}")))?;
        conn.execute_batch("PRAGMA threads=4;")
            .map_err(|e| QueryLogError::Store(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| QueryLogError::Store(format!("failed to open in-memory db: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    pub fn table_exists(&self, database: &str, table: &str) -> Result<bool> {
        table_exists_in(&self.conn(), database, table)
    }

    pub fn count_rows(&self, database: &str, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", qualified_name(database, table));
        scalar_usize(&self.conn(), &sql)
    }
}

pub(crate) fn scalar_usize(conn: &Connection, sql: &str) -> Result<usize> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|v| v as usize)
        .map_err(|e| QueryLogError::Store(format!("query failed: {e}")))
}

pub(crate) fn table_exists_in(conn: &Connection, database: &str, table: &str) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_schema = ? AND table_name = ?",
        params![database, table],
        |row| row.get::<_, i64>(0),
    )
    .map(|v| v > 0)
    .map_err(|e| QueryLogError::Store(format!("table lookup failed: {e}")))
}

pub(crate) fn table_columns(
    conn: &Connection,
    database: &str,
    table: &str,
) -> Result<Vec<(String, String)>> {
    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type FROM information_schema.columns
             WHERE table_schema = ? AND table_name = ?
             ORDER BY ordinal_position",
        )
        .map_err(|e| QueryLogError::Store(format!("prepare column lookup failed: {e}")))?;

    let rows = stmt
        .query_map(params![database, table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| QueryLogError::Store(format!("column lookup failed: {e}")))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| QueryLogError::Store(format!("column lookup failed: {e}")))
}
