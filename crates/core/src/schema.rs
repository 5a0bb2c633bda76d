#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
}

/// Column layout of the destination table, in declaration order. The
/// compatibility check compares this list against what the storage engine
/// reports for an existing table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub columns: &'static [ColumnDef],
}

const RECORD_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "kind", sql_type: "INTEGER" },
    ColumnDef { name: "event_time", sql_type: "TIMESTAMP" },
    ColumnDef { name: "query_start_time", sql_type: "TIMESTAMP" },
    ColumnDef { name: "duration_ms", sql_type: "BIGINT" },
    ColumnDef { name: "read_rows", sql_type: "BIGINT" },
    ColumnDef { name: "read_bytes", sql_type: "BIGINT" },
    ColumnDef { name: "result_rows", sql_type: "BIGINT" },
    ColumnDef { name: "result_bytes", sql_type: "BIGINT" },
    ColumnDef { name: "query_text", sql_type: "VARCHAR" },
    ColumnDef { name: "interface", sql_type: "INTEGER" },
    ColumnDef { name: "http_method", sql_type: "INTEGER" },
    ColumnDef { name: "client_address", sql_type: "VARCHAR" },
    // "user" is a reserved word in SQL, so the column diverges from the
    // record field name.
    ColumnDef { name: "user_name", sql_type: "VARCHAR" },
    ColumnDef { name: "query_id", sql_type: "VARCHAR" },
];

impl TableSchema {
    pub fn for_records() -> Self {
        Self { columns: RECORD_COLUMNS }
    }

    pub fn time_column(&self) -> &'static str {
        "event_time"
    }
}
