use crate::error::Result;
use crate::model::record::Record;
use crate::schema::TableSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub database: String,
    pub table: String,
}

/// Seam between the log writer and the table engine. Implementations own
/// creation-if-absent, the schema check with its rename-aside fallback, and
/// batch insertion. Methods are synchronous; the writer task is the only
/// caller.
pub trait TableSink: Send {
    fn ensure_compatible(&mut self, schema: &TableSchema) -> Result<TableHandle>;

    fn insert_rows(&mut self, handle: &TableHandle, records: &[Record]) -> Result<()>;
}
