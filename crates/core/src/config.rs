use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QueryLogError, Result};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(7500);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub database: String,
    pub table: String,
    pub flush_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_root = env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(home).join(".local/share"));

        Self {
            db_path: data_root.join("querylog/querylog.duckdb"),
            database: "system".to_string(),
            table: "query_log".to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    db_path: Option<PathBuf>,
    database: Option<String>,
    table: Option<String>,
    flush_interval: Option<String>,
    queue_capacity: Option<usize>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("QUERYLOG_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("querylog/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| QueryLogError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| QueryLogError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let queue_capacity = match env::var("QUERYLOG_QUEUE_CAPACITY") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            QueryLogError::Config(format!("bad QUERYLOG_QUEUE_CAPACITY in environment: {e}"))
        })?),
        Err(_) => None,
    };

    Ok(ConfigOverrides {
        db_path: env::var("QUERYLOG_DB_PATH").ok().map(PathBuf::from),
        database: env::var("QUERYLOG_DATABASE").ok(),
        table: env::var("QUERYLOG_TABLE").ok(),
        flush_interval: env::var("QUERYLOG_FLUSH_INTERVAL").ok(),
        queue_capacity,
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.db_path {
        cfg.db_path = v;
    }
    if let Some(v) = overrides.database {
        cfg.database = v;
    }
    if let Some(v) = overrides.table {
        cfg.table = v;
    }
    if let Some(v) = overrides.flush_interval {
        cfg.flush_interval = humantime::parse_duration(&v).map_err(|e| {
            QueryLogError::Config(format!("bad flush_interval in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.queue_capacity {
        if v == 0 {
            return Err(QueryLogError::Config(format!(
                "queue_capacity in {source} must be at least 1"
            )));
        }
        cfg.queue_capacity = v;
    }
    Ok(())
}
