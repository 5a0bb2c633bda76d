mod batch;
mod writer;

use std::time::Duration;

use querylog_core::config::{Config, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_CAPACITY};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::writer::LogWriter;

pub use querylog_core::model::record::{HttpMethod, Interface, Record, RecordKind};
pub use querylog_core::schema::TableSchema;
pub use querylog_core::sink::{TableHandle, TableSink};
pub use querylog_core::{QueryLogError, Result, config, time};
pub use querylog_store::{QueryLogSink, Store};

#[derive(Debug, Clone)]
pub struct QueryLogConfig {
    pub flush_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl From<&Config> for QueryLogConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            flush_interval: cfg.flush_interval,
            queue_capacity: cfg.queue_capacity,
        }
    }
}

/// Entry point for query-execution code. Submitting is fire-and-forget:
/// records travel through a bounded channel to a single background writer,
/// and storage failures never reach the producer.
pub struct QueryLog {
    tx: mpsc::Sender<Record>,
    writer: Option<JoinHandle<()>>,
}

impl QueryLog {
    pub fn new(store: Store, database: &str, table: &str, cfg: QueryLogConfig) -> Self {
        Self::with_sink(Box::new(QueryLogSink::new(store, database, table)), cfg)
    }

    pub fn with_sink(sink: Box<dyn TableSink>, cfg: QueryLogConfig) -> Self {
        let capacity = cfg.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let writer = tokio::spawn(LogWriter::new(rx, sink, cfg.flush_interval, capacity).run());
        Self {
            tx,
            writer: Some(writer),
        }
    }

    /// Queue a record for persistence. Waits only while the channel is at
    /// capacity; nothing about storage ever surfaces here.
    pub async fn submit(&self, record: Record) {
        if record.is_shutdown() {
            debug!("ignoring caller-submitted shutdown record");
            return;
        }
        if self.tx.send(record).await.is_err() {
            warn!("query log record dropped: writer already stopped");
        }
    }

    /// Push the shutdown sentinel and wait for the writer to finish its
    /// final flush. Every record submitted before this call has then either
    /// been flushed or discarded by an observed failure. Idempotent.
    ///
    /// Dropping the façade without calling this also stops the writer (the
    /// closed channel triggers a final flush), but nothing waits for it.
    pub async fn shutdown(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        let _ = self.tx.send(Record::shutdown()).await;
        if writer.await.is_err() {
            warn!("query log writer task panicked during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testkit::{RecordingSink, finish_record, start_record};

    use super::*;

    fn cfg(flush_ms: u64, capacity: usize) -> QueryLogConfig {
        QueryLogConfig {
            flush_interval: Duration::from_millis(flush_ms),
            queue_capacity: capacity,
        }
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.query_id.clone()).collect()
    }

    #[tokio::test]
    async fn shutdown_flushes_everything_in_order() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(5_000, 16));

        for i in 0..5 {
            log.submit(finish_record(i)).await;
        }
        log.shutdown().await;

        assert_eq!(sink.insert_attempts(), 1);
        assert_eq!(
            ids(&sink.flushed_records()),
            vec!["q-0", "q-1", "q-2", "q-3", "q-4"]
        );
    }

    #[tokio::test]
    async fn deadline_flush_then_shutdown_flush() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(200, 16));

        for i in 0..3 {
            log.submit(finish_record(i)).await;
        }
        // past the first deadline but still inside the second window
        tokio::time::sleep(Duration::from_millis(250)).await;
        for i in 3..5 {
            log.submit(finish_record(i)).await;
        }
        log.shutdown().await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(ids(&calls[0]), vec!["q-0", "q-1", "q-2"]);
        assert_eq!(ids(&calls[1]), vec!["q-3", "q-4"]);
    }

    #[tokio::test]
    async fn record_arriving_after_idle_window_flushes_immediately() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(50, 16));

        log.submit(finish_record(0)).await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        // the rolling deadline elapsed while idle, so this record does not
        // wait out another full interval
        log.submit(finish_record(1)).await;
        for _ in 0..100 {
            if sink.calls().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.calls().len(), 2);
        assert_eq!(ids(&sink.flushed_records()), vec!["q-0", "q-1"]);

        log.shutdown().await;
        assert_eq!(sink.calls().len(), 2);
    }

    #[tokio::test]
    async fn quiet_shutdown_never_touches_the_sink() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(50, 16));

        tokio::time::sleep(Duration::from_millis(200)).await;
        log.shutdown().await;

        assert_eq!(sink.ensure_calls(), 0);
        assert_eq!(sink.insert_attempts(), 0);
    }

    #[tokio::test]
    async fn failed_batches_are_dropped_not_retried() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(100, 16));

        sink.set_fail_inserts(true);
        log.submit(finish_record(0)).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        sink.set_fail_inserts(false);
        log.submit(finish_record(1)).await;
        log.shutdown().await;

        assert_eq!(sink.insert_attempts(), 2);
        assert_eq!(ids(&sink.flushed_records()), vec!["q-1"]);
        // the failure cleared the cached handle, so resolution ran again
        assert_eq!(sink.ensure_calls(), 2);
    }

    #[tokio::test]
    async fn ensure_failure_is_contained() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(100, 16));

        sink.set_fail_ensure(true);
        log.submit(finish_record(0)).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        sink.set_fail_ensure(false);
        log.submit(finish_record(1)).await;
        log.shutdown().await;

        assert_eq!(ids(&sink.flushed_records()), vec!["q-1"]);
        assert_eq!(sink.insert_attempts(), 1);
    }

    #[tokio::test]
    async fn always_failing_sink_never_escapes() {
        let sink = RecordingSink::new();
        sink.set_fail_inserts(true);
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(50, 16));

        for i in 0..10 {
            log.submit(finish_record(i)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        log.shutdown().await;

        assert!(sink.flushed_records().is_empty());
        assert!(sink.insert_attempts() >= 1);
    }

    #[tokio::test]
    async fn non_sentinel_records_do_not_stop_writer() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(50, 16));

        log.submit(start_record(0)).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        log.submit(finish_record(1)).await;
        log.shutdown().await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(ids(&sink.flushed_records()), vec!["q-0", "q-1"]);
    }

    #[tokio::test]
    async fn caller_submitted_sentinel_is_ignored() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(5_000, 16));

        log.submit(Record::shutdown()).await;
        log.submit(finish_record(0)).await;
        log.shutdown().await;

        assert_eq!(ids(&sink.flushed_records()), vec!["q-0"]);
    }

    #[tokio::test]
    async fn tiny_queue_applies_backpressure_without_deadlock() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(50, 1));

        let submit_a = async {
            for i in 0..4 {
                log.submit(finish_record(i)).await;
            }
        };
        let submit_b = async {
            for i in 4..8 {
                log.submit(finish_record(i)).await;
            }
        };
        tokio::join!(submit_a, submit_b);
        log.shutdown().await;

        let mut got = ids(&sink.flushed_records());
        got.sort();
        let mut want: Vec<String> = (0..8).map(|i| format!("q-{i}")).collect();
        want.sort();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let sink = RecordingSink::new();
        let mut log = QueryLog::with_sink(Box::new(sink.clone()), cfg(5_000, 16));

        log.submit(finish_record(0)).await;
        log.shutdown().await;
        log.shutdown().await;

        assert_eq!(sink.insert_attempts(), 1);
    }

    #[tokio::test]
    async fn drop_without_shutdown_still_flushes() {
        let sink = RecordingSink::new();
        let log = QueryLog::with_sink(Box::new(sink.clone()), cfg(5_000, 16));

        log.submit(finish_record(0)).await;
        drop(log);

        for _ in 0..100 {
            if !sink.flushed_records().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(ids(&sink.flushed_records()), vec!["q-0"]);
    }
}
