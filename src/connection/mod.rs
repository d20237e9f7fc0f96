//! Driver seam: data sources, connections and prepared statement handles.
//!
//! The engine never talks to a database directly. Everything it needs from a
//! driver is expressed by the three traits below; [`memory`] provides a
//! scripted in-process implementation.

pub mod memory;

use std::time::Duration;

use crate::core::{Result, Value};
use crate::result::ResultSet;

pub use memory::{DriverStats, ExecutedStatement, ExecutionKind, MemoryDatabase};

/// Hands out connections.
pub trait DataSource: Send + Sync {
    fn connection(&self) -> Result<Box<dyn Connection>>;
}

/// One physical connection.
pub trait Connection: Send {
    /// Prepare a statement handle for `sql` (positional `?` placeholders).
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>>;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;

    fn is_auto_commit(&self) -> bool;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// A prepared statement handle.
///
/// Handles hold driver resources and must be closed exactly once by whoever
/// owns them.
pub trait Statement: Send {
    fn sql(&self) -> &str;

    /// Bind a value to a 1-based placeholder position.
    fn bind(&mut self, index: usize, value: &Value) -> Result<()>;

    fn clear_parameters(&mut self);

    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;

    fn set_fetch_size(&mut self, rows: u32) -> Result<()>;

    fn execute_query(&mut self) -> Result<ResultSet>;

    /// Execute a write, returning the affected row count.
    fn execute_update(&mut self) -> Result<u64>;

    /// Queue the currently bound parameters as one batch entry.
    fn add_batch(&mut self) -> Result<()>;

    /// Run all queued entries in order, returning one update count per entry.
    fn execute_batch(&mut self) -> Result<Vec<u64>>;

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}
