use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::{Cursor, ParameterHandler, ResultSetHandler, StatementGuard};
use crate::config::Configuration;
use crate::connection::{Connection, Statement};
use crate::core::{Parameter, Result, Row, RowBounds};
use crate::mapping::{BoundSql, MappedStatement};

/// Drives one statement handle on behalf of an executor.
pub trait StatementHandler: Send {
    /// Create and configure a handle; `transaction_timeout` caps the query timeout.
    /// The handle is closed when the returned guard drops.
    fn prepare(
        &self,
        connection: &mut dyn Connection,
        transaction_timeout: Option<Duration>,
    ) -> Result<StatementGuard>;

    fn parameterize(&self, statement: &mut dyn Statement) -> Result<()>;

    fn batch(&self, statement: &mut dyn Statement) -> Result<()>;

    fn update(&self, statement: &mut dyn Statement) -> Result<u64>;

    fn query(&self, statement: &mut dyn Statement) -> Result<Vec<Row>>;

    fn query_cursor(&self, statement: &mut dyn Statement) -> Result<Cursor>;

    fn bound_sql(&self) -> &BoundSql;

    fn mapped_statement(&self) -> &Arc<MappedStatement>;

    fn parameter(&self) -> &Parameter;
}

/// Statement handler for positional prepared statements.
pub struct PreparedStatementHandler {
    configuration: Arc<Configuration>,
    mapped_statement: Arc<MappedStatement>,
    parameter: Parameter,
    bound_sql: BoundSql,
    parameter_handler: Box<dyn ParameterHandler>,
    result_set_handler: Box<dyn ResultSetHandler>,
}

impl PreparedStatementHandler {
    pub fn new(
        configuration: Arc<Configuration>,
        mapped_statement: Arc<MappedStatement>,
        parameter: Parameter,
        bounds: RowBounds,
    ) -> Self {
        let bound_sql = mapped_statement.bound_sql(&parameter);
        let parameter_handler =
            configuration.new_parameter_handler(Arc::clone(&mapped_statement), parameter.clone(), bound_sql.clone());
        let result_set_handler = configuration.new_result_set_handler(Arc::clone(&mapped_statement), bounds);

        Self {
            configuration,
            mapped_statement,
            parameter,
            bound_sql,
            parameter_handler,
            result_set_handler,
        }
    }

    /// Effective query timeout: statement, else default, never beyond the transaction.
    fn query_timeout(&self, transaction_timeout: Option<Duration>) -> Option<Duration> {
        let timeout = self
            .mapped_statement
            .timeout()
            .or(self.configuration.settings().default_statement_timeout);
        match (timeout, transaction_timeout) {
            (Some(t), Some(tx)) => Some(t.min(tx)),
            (None, tx) => tx,
            (t, None) => t,
        }
    }

    fn configure(&self, statement: &mut dyn Statement, transaction_timeout: Option<Duration>) -> Result<()> {
        if let Some(timeout) = self.query_timeout(transaction_timeout) {
            statement.set_query_timeout(Some(timeout))?;
        }
        let fetch_size = self
            .mapped_statement
            .fetch_size()
            .or(self.configuration.settings().default_fetch_size);
        if let Some(rows) = fetch_size {
            statement.set_fetch_size(rows)?;
        }
        Ok(())
    }
}

impl StatementHandler for PreparedStatementHandler {
    fn prepare(
        &self,
        connection: &mut dyn Connection,
        transaction_timeout: Option<Duration>,
    ) -> Result<StatementGuard> {
        debug!("==>  Preparing: {}", self.bound_sql.sql());
        let mut guard = StatementGuard::new(connection.prepare(self.bound_sql.sql())?);
        self.configure(guard.statement(), transaction_timeout)?;
        Ok(guard)
    }

    fn parameterize(&self, statement: &mut dyn Statement) -> Result<()> {
        self.parameter_handler.set_parameters(statement)
    }

    fn batch(&self, statement: &mut dyn Statement) -> Result<()> {
        statement.add_batch()
    }

    fn update(&self, statement: &mut dyn Statement) -> Result<u64> {
        let count = statement.execute_update()?;
        debug!("<==    Updates: {}", count);
        Ok(count)
    }

    fn query(&self, statement: &mut dyn Statement) -> Result<Vec<Row>> {
        let result_set = statement.execute_query()?;
        self.result_set_handler.handle_result_sets(&result_set)
    }

    fn query_cursor(&self, statement: &mut dyn Statement) -> Result<Cursor> {
        let result_set = statement.execute_query()?;
        self.result_set_handler.handle_cursor_result_sets(&result_set)
    }

    fn bound_sql(&self) -> &BoundSql {
        &self.bound_sql
    }

    fn mapped_statement(&self) -> &Arc<MappedStatement> {
        &self.mapped_statement
    }

    fn parameter(&self) -> &Parameter {
        &self.parameter
    }
}
