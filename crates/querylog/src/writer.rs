use std::time::Duration;

use querylog_core::Result;
use querylog_core::model::record::{Record, RecordKind};
use querylog_core::schema::TableSchema;
use querylog_core::sink::{TableHandle, TableSink};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::batch::Batch;

/// The single consumer of the record channel. Sink failures are contained
/// here: the batch they carried is dropped and the loop keeps running.
pub(crate) struct LogWriter {
    rx: mpsc::Receiver<Record>,
    sink: Box<dyn TableSink>,
    schema: TableSchema,
    table: Option<TableHandle>,
    batch: Batch,
    flush_interval: Duration,
}

enum Pop {
    Record(Record),
    Deadline,
    Closed,
}

impl LogWriter {
    pub(crate) fn new(
        rx: mpsc::Receiver<Record>,
        sink: Box<dyn TableSink>,
        flush_interval: Duration,
        queue_capacity: usize,
    ) -> Self {
        Self {
            rx,
            sink,
            schema: TableSchema::for_records(),
            table: None,
            batch: Batch::with_capacity(queue_capacity),
            flush_interval,
        }
    }

    pub(crate) async fn run(mut self) {
        // The deadline is measured from the end of the previous flush
        // attempt, so a slow flush never shrinks the next window below zero.
        let mut last_flush = Instant::now();
        loop {
            match self.wait_next(last_flush).await {
                Pop::Record(record) => {
                    if record.kind == RecordKind::Shutdown {
                        self.flush();
                        break;
                    }
                    self.batch.append(record);
                }
                Pop::Closed => {
                    self.flush();
                    break;
                }
                Pop::Deadline => {}
            }

            if !self.batch.is_empty() && last_flush.elapsed() >= self.flush_interval {
                self.flush();
                last_flush = Instant::now();
            }
        }
        debug!("query log writer stopped");
    }

    async fn wait_next(&mut self, last_flush: Instant) -> Pop {
        if self.batch.is_empty() {
            return match self.rx.recv().await {
                Some(record) => Pop::Record(record),
                None => Pop::Closed,
            };
        }

        let budget = self.flush_interval.saturating_sub(last_flush.elapsed());
        if budget.is_zero() {
            return Pop::Deadline;
        }
        match timeout(budget, self.rx.recv()).await {
            Ok(Some(record)) => Pop::Record(record),
            Ok(None) => Pop::Closed,
            Err(_) => Pop::Deadline,
        }
    }

    fn flush(&mut self) {
        let records = self.batch.drain();
        if records.is_empty() {
            return;
        }
        if let Err(e) = self.write_batch(&records) {
            warn!(
                error = %e,
                dropped = records.len(),
                "query log flush failed, batch discarded"
            );
            // Force re-resolution on the next flush; the table may have been
            // dropped or recreated underneath us.
            self.table = None;
        } else {
            debug!(rows = records.len(), "query log batch flushed");
        }
    }

    fn write_batch(&mut self, records: &[Record]) -> Result<()> {
        let handle = match &self.table {
            Some(handle) => handle.clone(),
            None => {
                let handle = self.sink.ensure_compatible(&self.schema)?;
                self.table = Some(handle.clone());
                handle
            }
        };
        self.sink.insert_rows(&handle, records)
    }
}
