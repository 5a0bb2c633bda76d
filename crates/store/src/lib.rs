pub mod db;
pub mod schema;
pub mod sink;

pub use db::Store;
pub use sink::QueryLogSink;
