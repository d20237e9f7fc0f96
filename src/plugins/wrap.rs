use std::sync::Arc;
use std::time::Duration;

use super::{ArgValue, Invocation, InvocationTarget, Outcome, RegisteredInterceptor, TargetKind};
use crate::connection::{Connection, Statement};
use crate::core::{Parameter, Result, Row, RowBounds};
use crate::executor::{
    BatchResult, Cursor, Executor, ParameterHandler, ResultSetHandler, StatementGuard, StatementHandler,
};
use crate::mapping::{BoundSql, MappedStatement};
use crate::result::ResultSet;

fn into_count(outcome: Outcome) -> std::result::Result<u64, Outcome> {
    match outcome {
        Outcome::Count(n) => Ok(n),
        other => Err(other),
    }
}

fn into_rows(outcome: Outcome) -> std::result::Result<Vec<Row>, Outcome> {
    match outcome {
        Outcome::Rows(rows) => Ok(rows),
        other => Err(other),
    }
}

fn into_cursor(outcome: Outcome) -> std::result::Result<Cursor, Outcome> {
    match outcome {
        Outcome::Cursor(cursor) => Ok(cursor),
        other => Err(other),
    }
}

fn into_batch(outcome: Outcome) -> std::result::Result<Vec<BatchResult>, Outcome> {
    match outcome {
        Outcome::Batch(results) => Ok(results),
        other => Err(other),
    }
}

fn into_unit(outcome: Outcome) -> std::result::Result<(), Outcome> {
    match outcome {
        Outcome::Unit => Ok(()),
        other => Err(other),
    }
}

fn into_statement(outcome: Outcome) -> std::result::Result<StatementGuard, Outcome> {
    match outcome {
        Outcome::Statement(statement) => Ok(statement),
        other => Err(other),
    }
}

/// Executor wrapped by one interceptor.
pub struct ExecutorPlugin {
    target: Box<dyn Executor>,
    plugin: Arc<RegisteredInterceptor>,
}

impl ExecutorPlugin {
    pub fn new(target: Box<dyn Executor>, plugin: Arc<RegisteredInterceptor>) -> Self {
        Self { target, plugin }
    }

    fn intercepts(&self, method: &str) -> bool {
        self.plugin.intercepts(TargetKind::Executor, method)
    }
}

impl Executor for ExecutorPlugin {
    fn update(&mut self, statement: &Arc<MappedStatement>, parameter: &Parameter) -> Result<u64> {
        if !self.intercepts("update") {
            return self.target.update(statement, parameter);
        }
        let target = &mut self.target;
        let args = vec![
            ArgValue::Statement(Arc::clone(statement)),
            ArgValue::Parameter(parameter.clone()),
        ];
        let invocation = Invocation::new(InvocationTarget::Executor, "update", args, move || {
            target.update(statement, parameter).map(Outcome::Count)
        });
        self.plugin.invoke(invocation, "Count", into_count)
    }

    fn query(
        &mut self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Vec<Row>> {
        if !self.intercepts("query") {
            return self.target.query(statement, parameter, bounds);
        }
        let target = &mut self.target;
        let args = vec![
            ArgValue::Statement(Arc::clone(statement)),
            ArgValue::Parameter(parameter.clone()),
            ArgValue::RowBounds(bounds),
        ];
        let invocation = Invocation::new(InvocationTarget::Executor, "query", args, move || {
            target.query(statement, parameter, bounds).map(Outcome::Rows)
        });
        self.plugin.invoke(invocation, "Rows", into_rows)
    }

    fn query_cursor(
        &mut self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Cursor> {
        if !self.intercepts("query_cursor") {
            return self.target.query_cursor(statement, parameter, bounds);
        }
        let target = &mut self.target;
        let args = vec![
            ArgValue::Statement(Arc::clone(statement)),
            ArgValue::Parameter(parameter.clone()),
            ArgValue::RowBounds(bounds),
        ];
        let invocation = Invocation::new(InvocationTarget::Executor, "query_cursor", args, move || {
            target
                .query_cursor(statement, parameter, bounds)
                .map(Outcome::Cursor)
        });
        self.plugin.invoke(invocation, "Cursor", into_cursor)
    }

    fn flush_statements(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>> {
        if !self.intercepts("flush_statements") {
            return self.target.flush_statements(is_rollback);
        }
        let target = &mut self.target;
        let args = vec![ArgValue::Flag(is_rollback)];
        let invocation = Invocation::new(InvocationTarget::Executor, "flush_statements", args, move || {
            target.flush_statements(is_rollback).map(Outcome::Batch)
        });
        self.plugin.invoke(invocation, "Batch", into_batch)
    }

    fn commit(&mut self, required: bool) -> Result<()> {
        if !self.intercepts("commit") {
            return self.target.commit(required);
        }
        let target = &mut self.target;
        let invocation = Invocation::new(InvocationTarget::Executor, "commit", vec![ArgValue::Flag(required)], move || {
            target.commit(required).map(|()| Outcome::Unit)
        });
        self.plugin.invoke(invocation, "Unit", into_unit)
    }

    fn rollback(&mut self, required: bool) -> Result<()> {
        if !self.intercepts("rollback") {
            return self.target.rollback(required);
        }
        let target = &mut self.target;
        let invocation = Invocation::new(InvocationTarget::Executor, "rollback", vec![ArgValue::Flag(required)], move || {
            target.rollback(required).map(|()| Outcome::Unit)
        });
        self.plugin.invoke(invocation, "Unit", into_unit)
    }

    fn close(&mut self, force_rollback: bool) {
        self.target.close(force_rollback)
    }

    fn is_closed(&self) -> bool {
        self.target.is_closed()
    }
}

/// Statement handler wrapped by one interceptor.
pub struct StatementHandlerPlugin {
    target: Box<dyn StatementHandler>,
    plugin: Arc<RegisteredInterceptor>,
}

impl StatementHandlerPlugin {
    pub fn new(target: Box<dyn StatementHandler>, plugin: Arc<RegisteredInterceptor>) -> Self {
        Self { target, plugin }
    }

    fn invocation_target(&self) -> InvocationTarget<'_> {
        InvocationTarget::StatementHandler(&*self.target)
    }

    fn intercepts(&self, method: &str) -> bool {
        self.plugin.intercepts(TargetKind::StatementHandler, method)
    }
}

impl StatementHandler for StatementHandlerPlugin {
    fn prepare(
        &self,
        connection: &mut dyn Connection,
        transaction_timeout: Option<Duration>,
    ) -> Result<StatementGuard> {
        if !self.intercepts("prepare") {
            return self.target.prepare(connection, transaction_timeout);
        }
        let target = &self.target;
        let args = vec![ArgValue::Connection, ArgValue::Timeout(transaction_timeout)];
        let invocation = Invocation::new(self.invocation_target(), "prepare", args, move || {
            target
                .prepare(&mut *connection, transaction_timeout)
                .map(Outcome::Statement)
        });
        self.plugin.invoke(invocation, "Statement", into_statement)
    }

    fn parameterize(&self, statement: &mut dyn Statement) -> Result<()> {
        if !self.intercepts("parameterize") {
            return self.target.parameterize(statement);
        }
        let target = &self.target;
        let args = vec![ArgValue::Sql(statement.sql().to_string())];
        let invocation = Invocation::new(self.invocation_target(), "parameterize", args, move || {
            target.parameterize(&mut *statement).map(|()| Outcome::Unit)
        });
        self.plugin.invoke(invocation, "Unit", into_unit)
    }

    fn batch(&self, statement: &mut dyn Statement) -> Result<()> {
        if !self.intercepts("batch") {
            return self.target.batch(statement);
        }
        let target = &self.target;
        let args = vec![ArgValue::Sql(statement.sql().to_string())];
        let invocation = Invocation::new(self.invocation_target(), "batch", args, move || {
            target.batch(&mut *statement).map(|()| Outcome::Unit)
        });
        self.plugin.invoke(invocation, "Unit", into_unit)
    }

    fn update(&self, statement: &mut dyn Statement) -> Result<u64> {
        if !self.intercepts("update") {
            return self.target.update(statement);
        }
        let target = &self.target;
        let args = vec![ArgValue::Sql(statement.sql().to_string())];
        let invocation = Invocation::new(self.invocation_target(), "update", args, move || {
            target.update(&mut *statement).map(Outcome::Count)
        });
        self.plugin.invoke(invocation, "Count", into_count)
    }

    fn query(&self, statement: &mut dyn Statement) -> Result<Vec<Row>> {
        if !self.intercepts("query") {
            return self.target.query(statement);
        }
        let target = &self.target;
        let args = vec![ArgValue::Sql(statement.sql().to_string())];
        let invocation = Invocation::new(self.invocation_target(), "query", args, move || {
            target.query(&mut *statement).map(Outcome::Rows)
        });
        self.plugin.invoke(invocation, "Rows", into_rows)
    }

    fn query_cursor(&self, statement: &mut dyn Statement) -> Result<Cursor> {
        if !self.intercepts("query_cursor") {
            return self.target.query_cursor(statement);
        }
        let target = &self.target;
        let args = vec![ArgValue::Sql(statement.sql().to_string())];
        let invocation = Invocation::new(self.invocation_target(), "query_cursor", args, move || {
            target.query_cursor(&mut *statement).map(Outcome::Cursor)
        });
        self.plugin.invoke(invocation, "Cursor", into_cursor)
    }

    fn bound_sql(&self) -> &BoundSql {
        self.target.bound_sql()
    }

    fn mapped_statement(&self) -> &Arc<MappedStatement> {
        self.target.mapped_statement()
    }

    fn parameter(&self) -> &Parameter {
        self.target.parameter()
    }
}

/// Parameter handler wrapped by one interceptor.
pub struct ParameterHandlerPlugin {
    target: Box<dyn ParameterHandler>,
    plugin: Arc<RegisteredInterceptor>,
}

impl ParameterHandlerPlugin {
    pub fn new(target: Box<dyn ParameterHandler>, plugin: Arc<RegisteredInterceptor>) -> Self {
        Self { target, plugin }
    }

    fn invocation_target(&self) -> InvocationTarget<'_> {
        InvocationTarget::ParameterHandler(&*self.target)
    }
}

impl ParameterHandler for ParameterHandlerPlugin {
    fn parameter_object(&self) -> &Parameter {
        self.target.parameter_object()
    }

    fn set_parameters(&self, statement: &mut dyn Statement) -> Result<()> {
        if !self.plugin.intercepts(TargetKind::ParameterHandler, "set_parameters") {
            return self.target.set_parameters(statement);
        }
        let target = &self.target;
        let args = vec![
            ArgValue::Sql(statement.sql().to_string()),
            ArgValue::Parameter(target.parameter_object().clone()),
        ];
        let invocation = Invocation::new(self.invocation_target(), "set_parameters", args, move || {
            target.set_parameters(&mut *statement).map(|()| Outcome::Unit)
        });
        self.plugin.invoke(invocation, "Unit", into_unit)
    }
}

/// Result-set handler wrapped by one interceptor.
pub struct ResultSetHandlerPlugin {
    target: Box<dyn ResultSetHandler>,
    plugin: Arc<RegisteredInterceptor>,
}

impl ResultSetHandlerPlugin {
    pub fn new(target: Box<dyn ResultSetHandler>, plugin: Arc<RegisteredInterceptor>) -> Self {
        Self { target, plugin }
    }

    fn invocation_target(&self) -> InvocationTarget<'_> {
        InvocationTarget::ResultSetHandler(&*self.target)
    }

    fn intercepts(&self, method: &str) -> bool {
        self.plugin.intercepts(TargetKind::ResultSetHandler, method)
    }
}

impl ResultSetHandler for ResultSetHandlerPlugin {
    fn handle_result_sets(&self, result_set: &ResultSet) -> Result<Vec<Row>> {
        if !self.intercepts("handle_result_sets") {
            return self.target.handle_result_sets(result_set);
        }
        let target = &self.target;
        let args = vec![ArgValue::ResultSet(result_set.clone())];
        let invocation = Invocation::new(self.invocation_target(), "handle_result_sets", args, move || {
            target.handle_result_sets(result_set).map(Outcome::Rows)
        });
        self.plugin.invoke(invocation, "Rows", into_rows)
    }

    fn handle_cursor_result_sets(&self, result_set: &ResultSet) -> Result<Cursor> {
        if !self.intercepts("handle_cursor_result_sets") {
            return self.target.handle_cursor_result_sets(result_set);
        }
        let target = &self.target;
        let args = vec![ArgValue::ResultSet(result_set.clone())];
        let invocation = Invocation::new(self.invocation_target(), "handle_cursor_result_sets", args, move || {
            target.handle_cursor_result_sets(result_set).map(Outcome::Cursor)
        });
        self.plugin.invoke(invocation, "Cursor", into_cursor)
    }
}
