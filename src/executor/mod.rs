//! Statement execution engine.
//!
//! An [`Executor`] owns one transaction and runs mapped statements through
//! the acquire → prepare → parameterize → execute → close lifecycle of an
//! [`ExecutionContext`]. What happens to statement handles between calls is
//! decided by the [`StatementPolicy`] plugged into [`BaseExecutor`].

mod base;
pub mod context;
mod parameter;
mod result;
mod statement;
pub mod policy;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::core::{Parameter, Result, Row, RowBounds};
use crate::mapping::MappedStatement;

pub use base::{BaseExecutor, BatchExecutor, ReuseExecutor, SimpleExecutor};
pub use context::{ExecutionContext, Phase, StatementGuard};
pub use parameter::{DefaultParameterHandler, ParameterHandler};
pub use policy::{BatchStatements, ReuseStatements, SimpleStatements, StatementPolicy};
pub use result::{Cursor, DefaultResultSetHandler, ResultContext, ResultHandler, ResultSetHandler};
pub use statement::{PreparedStatementHandler, StatementHandler};

/// Which statement policy a new executor gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutorType {
    #[default]
    Simple,
    Reuse,
    Batch,
}

impl fmt::Display for ExecutorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "SIMPLE"),
            Self::Reuse => write!(f, "REUSE"),
            Self::Batch => write!(f, "BATCH"),
        }
    }
}

pub trait Executor: Send {
    /// Run a write, returning the affected row count.
    fn update(&mut self, statement: &Arc<MappedStatement>, parameter: &Parameter) -> Result<u64>;

    fn query(
        &mut self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Vec<Row>>;

    fn query_cursor(
        &mut self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Cursor>;

    /// Execute pending work. With `is_rollback` pending work is discarded instead.
    fn flush_statements(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>>;

    fn commit(&mut self, required: bool) -> Result<()>;

    fn rollback(&mut self, required: bool) -> Result<()>;

    /// Release everything. Never fails; problems are logged.
    fn close(&mut self, force_rollback: bool);

    fn is_closed(&self) -> bool;
}

/// One accumulated batch group: a statement and the parameters submitted to it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    statement_id: String,
    sql: String,
    parameters: Vec<Parameter>,
    update_counts: Vec<u64>,
}

impl BatchResult {
    pub fn new(statement_id: impl Into<String>, sql: impl Into<String>, parameter: Parameter) -> Self {
        Self {
            statement_id: statement_id.into(),
            sql: sql.into(),
            parameters: vec![parameter],
            update_counts: Vec::new(),
        }
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    /// One count per submitted parameter, filled in by the flush.
    pub fn update_counts(&self) -> &[u64] {
        &self.update_counts
    }

    pub fn set_update_counts(&mut self, counts: Vec<u64>) {
        self.update_counts = counts;
    }
}
