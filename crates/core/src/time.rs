use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use crate::error::{QueryLogError, Result};

/// Event timestamps are stored at seconds resolution.
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}

pub fn now_seconds() -> DateTime<Utc> {
    truncate_to_seconds(Utc::now())
}

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| QueryLogError::Config(format!("invalid duration {input}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_subsecond_part() {
        let ts = DateTime::parse_from_rfc3339("2026-03-01T12:30:45.678901Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            truncate_to_seconds(ts).to_rfc3339(),
            "2026-03-01T12:30:45+00:00"
        );
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(now_seconds().nanosecond(), 0);
    }

    #[test]
    fn parses_duration() {
        assert_eq!(parse_duration_str("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration_str("5s").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_invalid_duration() {
        assert!(parse_duration_str("soon").is_err());
    }
}
