use duckdb::{Connection, params};
use querylog_core::error::{QueryLogError, Result};
use querylog_core::model::record::Record;
use querylog_core::schema::TableSchema;
use querylog_core::sink::{TableHandle, TableSink};
use tracing::info;

use crate::Store;
use crate::db::{table_columns, table_exists_in};
use crate::schema::{
    columns_match, create_index_sql, create_schema_sql, create_table_sql, insert_sql,
    rename_table_sql,
};

pub struct QueryLogSink {
    store: Store,
    database: String,
    table: String,
}

impl QueryLogSink {
    pub fn new(store: Store, database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            store,
            database: database.into(),
            table: table.into(),
        }
    }
}

impl TableSink for QueryLogSink {
    fn ensure_compatible(&mut self, schema: &TableSchema) -> Result<TableHandle> {
        let conn = self.store.conn();
        conn.execute_batch(&create_schema_sql(&self.database))
            .map_err(|e| QueryLogError::Store(format!("create schema failed: {e}")))?;

        if table_exists_in(&conn, &self.database, &self.table)? {
            let existing = table_columns(&conn, &self.database, &self.table)?;
            if !columns_match(schema, &existing) {
                let renamed = next_free_name(&conn, &self.database, &self.table)?;
                conn.execute(&rename_table_sql(&self.database, &self.table, &renamed), [])
                    .map_err(|e| {
                        QueryLogError::Schema(format!(
                            "rename of incompatible table {} failed: {e}",
                            self.table
                        ))
                    })?;
                info!(
                    table = %self.table,
                    renamed_to = %renamed,
                    "query log table has an incompatible schema, renamed it aside"
                );
                create_table(&conn, &self.database, &self.table, schema)?;
            }
        } else {
            create_table(&conn, &self.database, &self.table, schema)?;
        }

        Ok(TableHandle {
            database: self.database.clone(),
            table: self.table.clone(),
        })
    }

    fn insert_rows(&mut self, handle: &TableHandle, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.store.conn();
        let tx = conn
            .transaction()
            .map_err(|e| QueryLogError::Store(format!("begin tx failed: {e}")))?;

        {
            let mut stmt = tx
                .prepare(&insert_sql(handle, &TableSchema::for_records()))
                .map_err(|e| QueryLogError::Store(format!("prepare insert failed: {e}")))?;

            for record in records {
                stmt.execute(params![
                    record.kind.code(),
                    record.event_time.to_rfc3339(),
                    record.query_start_time.to_rfc3339(),
                    record.duration_ms as i64,
                    record.read_rows as i64,
                    record.read_bytes as i64,
                    record.result_rows as i64,
                    record.result_bytes as i64,
                    record.query_text,
                    record.interface.code(),
                    record.http_method.code(),
                    record.client_address.to_string(),
                    record.user,
                    record.query_id,
                ])
                .map_err(|e| QueryLogError::Store(format!("insert record failed: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| QueryLogError::Store(format!("commit failed: {e}")))
    }
}

fn create_table(
    conn: &Connection,
    database: &str,
    table: &str,
    schema: &TableSchema,
) -> Result<()> {
    conn.execute_batch(&format!(
        "{};\n{};",
        create_table_sql(database, table, schema),
        create_index_sql(database, table, schema),
    ))
    .map_err(|e| QueryLogError::Store(format!("create table failed: {e}")))
}

fn next_free_name(conn: &Connection, database: &str, table: &str) -> Result<String> {
    let mut n = 1u32;
    loop {
        let candidate = format!("{table}_{n}");
        if !table_exists_in(conn, database, &candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}
