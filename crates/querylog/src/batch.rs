use querylog_core::model::record::Record;

/// Records drained from the channel since the last flush. Owned by the
/// writer task only, so no locking.
pub(crate) struct Batch {
    records: Vec<Record>,
    capacity: usize,
}

impl Batch {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn drain(&mut self) -> Vec<Record> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
