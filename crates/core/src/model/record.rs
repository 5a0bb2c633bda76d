use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Shutdown = 0,
    QueryStart = 1,
    QueryFinish = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interface {
    Tcp = 1,
    Http = 2,
    OlapHttp = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Unknown = 0,
    Get = 1,
    Post = 2,
}

impl RecordKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Interface {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl HttpMethod {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// One loggable query event. Which fields are meaningful depends on `kind`:
/// the counters and `query_start_time` are filled for `QueryFinish` only,
/// and a `Shutdown` record is a pure control signal that is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    pub event_time: DateTime<Utc>,
    pub query_start_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub read_rows: u64,
    pub read_bytes: u64,
    pub result_rows: u64,
    pub result_bytes: u64,
    pub query_text: String,
    pub interface: Interface,
    pub http_method: HttpMethod,
    pub client_address: IpAddr,
    pub user: String,
    pub query_id: String,
}

impl Record {
    pub fn shutdown() -> Self {
        Self {
            kind: RecordKind::Shutdown,
            event_time: DateTime::UNIX_EPOCH,
            query_start_time: DateTime::UNIX_EPOCH,
            duration_ms: 0,
            read_rows: 0,
            read_bytes: 0,
            result_rows: 0,
            result_bytes: 0,
            query_text: String::new(),
            interface: Interface::Tcp,
            http_method: HttpMethod::Unknown,
            client_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            user: String::new(),
            query_id: String::new(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.kind == RecordKind::Shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_codes_are_stable() {
        assert_eq!(RecordKind::Shutdown.code(), 0);
        assert_eq!(RecordKind::QueryStart.code(), 1);
        assert_eq!(RecordKind::QueryFinish.code(), 2);

        assert_eq!(Interface::Tcp.code(), 1);
        assert_eq!(Interface::Http.code(), 2);
        assert_eq!(Interface::OlapHttp.code(), 3);

        assert_eq!(HttpMethod::Unknown.code(), 0);
        assert_eq!(HttpMethod::Get.code(), 1);
        assert_eq!(HttpMethod::Post.code(), 2);
    }

    #[test]
    fn shutdown_record_is_empty() {
        let sentinel = Record::shutdown();
        assert!(sentinel.is_shutdown());
        assert_eq!(sentinel.event_time, DateTime::UNIX_EPOCH);
        assert_eq!(sentinel.duration_ms, 0);
        assert!(sentinel.query_text.is_empty());
        assert!(sentinel.user.is_empty());
        assert!(sentinel.query_id.is_empty());
    }
}
