use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use querylog_core::error::{QueryLogError, Result};
use querylog_core::model::record::{HttpMethod, Interface, Record, RecordKind};
use querylog_core::schema::TableSchema;
use querylog_core::sink::{TableHandle, TableSink};

/// In-memory `TableSink` double: records every successful batch, counts
/// every attempt, and fails on demand. Clones share state, so tests keep a
/// clone and hand the original to the writer.
#[derive(Clone, Default)]
pub struct RecordingSink {
    state: Arc<SinkState>,
}

#[derive(Default)]
struct SinkState {
    calls: Mutex<Vec<Vec<Record>>>,
    insert_attempts: AtomicUsize,
    ensure_calls: AtomicUsize,
    fail_inserts: AtomicBool,
    fail_ensure: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Vec<Record>> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn flushed_records(&self) -> Vec<Record> {
        self.calls().into_iter().flatten().collect()
    }

    pub fn insert_attempts(&self) -> usize {
        self.state.insert_attempts.load(Ordering::SeqCst)
    }

    pub fn ensure_calls(&self) -> usize {
        self.state.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.state.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_ensure(&self, fail: bool) {
        self.state.fail_ensure.store(fail, Ordering::SeqCst);
    }
}

impl TableSink for RecordingSink {
    fn ensure_compatible(&mut self, _schema: &TableSchema) -> Result<TableHandle> {
        self.state.ensure_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_ensure.load(Ordering::SeqCst) {
            return Err(QueryLogError::Store("injected ensure failure".to_string()));
        }
        Ok(TableHandle {
            database: "system".to_string(),
            table: "query_log".to_string(),
        })
    }

    fn insert_rows(&mut self, _handle: &TableHandle, records: &[Record]) -> Result<()> {
        self.state.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_inserts.load(Ordering::SeqCst) {
            return Err(QueryLogError::Store("injected insert failure".to_string()));
        }
        self.state.calls.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}

pub fn start_record(i: usize) -> Record {
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    Record {
        kind: RecordKind::QueryStart,
        event_time: base + Duration::seconds(i as i64),
        query_start_time: base + Duration::seconds(i as i64),
        duration_ms: 0,
        read_rows: 0,
        read_bytes: 0,
        result_rows: 0,
        result_bytes: 0,
        query_text: format!("SELECT {i}"),
        interface: Interface::Tcp,
        http_method: HttpMethod::Unknown,
        client_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        user: "default".to_string(),
        query_id: format!("q-{i}"),
    }
}

pub fn finish_record(i: usize) -> Record {
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    Record {
        kind: RecordKind::QueryFinish,
        event_time: base + Duration::seconds(i as i64),
        query_start_time: base,
        duration_ms: 12 + i as u64,
        read_rows: 1_000,
        read_bytes: 65_536,
        result_rows: 10,
        result_bytes: 512,
        query_text: format!("SELECT {i}"),
        interface: Interface::Http,
        http_method: HttpMethod::Post,
        client_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        user: "default".to_string(),
        query_id: format!("q-{i}"),
    }
}
