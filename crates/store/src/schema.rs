use querylog_core::schema::TableSchema;
use querylog_core::sink::TableHandle;

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified_name(database: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(database), quote_ident(table))
}

pub fn create_schema_sql(database: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(database))
}

pub fn create_table_sql(database: &str, table: &str, schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|c| format!("{} {} NOT NULL", quote_ident(c.name), c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", qualified_name(database, table), columns)
}

pub fn create_index_sql(database: &str, table: &str, schema: &TableSchema) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        quote_ident(&format!("idx_{}_{}", table, schema.time_column())),
        qualified_name(database, table),
        quote_ident(schema.time_column()),
    )
}

pub fn rename_table_sql(database: &str, table: &str, new_table: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {}",
        qualified_name(database, table),
        quote_ident(new_table),
    )
}

pub fn insert_sql(handle: &TableHandle, schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; schema.columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_name(&handle.database, &handle.table),
        columns,
        placeholders,
    )
}

pub fn columns_match(schema: &TableSchema, existing: &[(String, String)]) -> bool {
    schema.columns.len() == existing.len()
        && schema
            .columns
            .iter()
            .zip(existing)
            .all(|(want, (name, sql_type))| {
                want.name == name && want.sql_type.eq_ignore_ascii_case(sql_type)
            })
}
