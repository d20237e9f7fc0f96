//! Sessions: the unit of work mapper calls run in.
//!
//! A [`SqlSession`] owns one executor (and through it one transaction). Open
//! sessions from a [`SqlSessionFactory`]; get mapper instances from the
//! session with [`DefaultSqlSession::get_mapper`].

mod default;
mod factory;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Configuration;
use crate::core::{Parameter, Result, Row, RowBounds, Value};
use crate::executor::{BatchResult, Cursor, ResultHandler};

pub use default::DefaultSqlSession;
pub use factory::SqlSessionFactory;

/// Statement-level operations of a session.
///
/// Mapper methods resolve to exactly one of these.
pub trait SqlSession {
    /// At most one row; more than one is [`Error::TooManyResults`](crate::Error::TooManyResults).
    fn select_one(&self, statement: &str, parameter: &Parameter) -> Result<Option<Row>>;

    fn select_list(&self, statement: &str, parameter: &Parameter) -> Result<Vec<Row>> {
        self.select_list_with_bounds(statement, parameter, RowBounds::DEFAULT)
    }

    fn select_list_with_bounds(&self, statement: &str, parameter: &Parameter, bounds: RowBounds) -> Result<Vec<Row>>;

    /// Rows keyed by the value of column `key`.
    fn select_map(
        &self,
        statement: &str,
        parameter: &Parameter,
        key: &str,
        bounds: RowBounds,
    ) -> Result<HashMap<Value, Row>>;

    fn select_cursor(&self, statement: &str, parameter: &Parameter, bounds: RowBounds) -> Result<Cursor>;

    /// Feed rows to `handler` until it stops or the rows run out.
    fn select_with_handler(
        &self,
        statement: &str,
        parameter: &Parameter,
        bounds: RowBounds,
        handler: &mut dyn ResultHandler,
    ) -> Result<()>;

    fn insert(&self, statement: &str, parameter: &Parameter) -> Result<u64>;

    fn update(&self, statement: &str, parameter: &Parameter) -> Result<u64>;

    fn delete(&self, statement: &str, parameter: &Parameter) -> Result<u64>;

    /// Execute pending batch statements.
    fn flush_statements(&self) -> Result<Vec<BatchResult>>;

    fn commit(&self, force: bool) -> Result<()>;

    fn rollback(&self, force: bool) -> Result<()>;

    fn close(&self);

    fn is_closed(&self) -> bool;

    fn configuration(&self) -> &Arc<Configuration>;
}
