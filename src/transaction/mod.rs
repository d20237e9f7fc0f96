// ============================================================================
// Transaction Module
// ============================================================================
//
// A transaction owns at most one connection, opened lazily on first use, and
// decides whether commit/rollback reach the driver.
//
// ============================================================================

pub mod local;

use std::time::Duration;

use crate::connection::Connection;
use crate::core::Result;

pub use local::LocalTransaction;

pub trait Transaction: Send {
    /// The transaction's connection, opened on first call.
    fn connection(&mut self) -> Result<&mut dyn Connection>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Release the connection. Further calls to `connection` open a new one.
    fn close(&mut self) -> Result<()>;

    /// Time left before the transaction deadline, if one was set.
    fn timeout(&self) -> Option<Duration>;
}
