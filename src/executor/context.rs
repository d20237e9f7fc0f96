use std::time::Instant;

use log::{debug, warn};
use tracing::Span;

use super::{Cursor, StatementHandler};
use crate::connection::Statement;
use crate::core::{Error, Result, Row};
use crate::transaction::Transaction;

/// Lifecycle phase of one statement execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ConnectionAcquired,
    StatementPrepared,
    Parameterized,
    Executed,
    Closed,
}

/// Owns a statement handle and closes it exactly once.
pub struct StatementGuard {
    statement: Box<dyn Statement>,
    released: bool,
}

impl StatementGuard {
    pub fn new(statement: Box<dyn Statement>) -> Self {
        Self {
            statement,
            released: false,
        }
    }

    pub fn statement(&mut self) -> &mut dyn Statement {
        self.statement.as_mut()
    }

    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    pub fn is_closed(&self) -> bool {
        self.statement.is_closed()
    }

    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.statement.close()
    }
}

impl Drop for StatementGuard {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            close_quietly(self.statement.as_mut());
        }
    }
}

/// Close a handle on a path that is already failing or cleaning up.
fn close_quietly(statement: &mut dyn Statement) {
    if let Err(e) = statement.close() {
        warn!("Error closing statement '{}': {}", statement.sql(), e);
    }
}

enum Handle<'s> {
    Owned(StatementGuard),
    // borrowed from an executor cache; the cache closes it
    Leased(&'s mut dyn Statement),
}

/// Per-call execution state: the handle in use, the current phase and the
/// timing span. Dropping the context releases whatever it still holds.
pub struct ExecutionContext<'s> {
    statement_id: String,
    phase: Phase,
    handle: Option<Handle<'s>>,
    span: Span,
    started: Instant,
}

impl<'s> ExecutionContext<'s> {
    pub fn begin(statement_id: &str) -> Self {
        Self {
            statement_id: statement_id.to_string(),
            phase: Phase::Idle,
            handle: None,
            span: tracing::info_span!(
                "statement",
                id = %statement_id,
                elapsed_us = tracing::field::Empty
            ),
            started: Instant::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    /// Idle → StatementPrepared: acquire the connection and prepare a fresh
    /// handle owned by this context.
    pub fn prepare(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<()> {
        let _enter = self.span.clone().entered();
        let timeout = transaction.timeout();
        let connection = transaction.connection()?;
        self.phase = Phase::ConnectionAcquired;

        let guard = handler.prepare(connection, timeout)?;
        self.handle = Some(Handle::Owned(guard));
        self.phase = Phase::StatementPrepared;
        Ok(())
    }

    /// Prepare and bind in one step.
    pub fn open(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<()> {
        self.prepare(transaction, handler)?;
        self.parameterize(handler)
    }

    /// Idle → ConnectionAcquired for calls that run on a cached handle.
    pub fn acquire(&mut self, transaction: &mut dyn Transaction) -> Result<()> {
        transaction.connection()?;
        self.phase = Phase::ConnectionAcquired;
        Ok(())
    }

    /// Use a handle owned by someone else; it is never closed by this context.
    pub fn lease(&mut self, statement: &'s mut dyn Statement) {
        self.handle = Some(Handle::Leased(statement));
        self.phase = Phase::StatementPrepared;
    }

    /// StatementPrepared → Parameterized. A failed bind releases the handle at once.
    pub fn parameterize(&mut self, handler: &dyn StatementHandler) -> Result<()> {
        let _enter = self.span.clone().entered();
        let result = handler.parameterize(self.statement()?);
        match result {
            Ok(()) => {
                self.phase = Phase::Parameterized;
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    pub fn update(&mut self, handler: &dyn StatementHandler) -> Result<u64> {
        let _enter = self.span.clone().entered();
        let count = handler.update(self.statement()?)?;
        self.phase = Phase::Executed;
        Ok(count)
    }

    pub fn query(&mut self, handler: &dyn StatementHandler) -> Result<Vec<Row>> {
        let _enter = self.span.clone().entered();
        let rows = handler.query(self.statement()?)?;
        self.phase = Phase::Executed;
        Ok(rows)
    }

    pub fn query_cursor(&mut self, handler: &dyn StatementHandler) -> Result<Cursor> {
        let _enter = self.span.clone().entered();
        let cursor = handler.query_cursor(self.statement()?)?;
        self.phase = Phase::Executed;
        Ok(cursor)
    }

    /// Queue the bound parameters as a batch entry.
    pub fn batch(&mut self, handler: &dyn StatementHandler) -> Result<()> {
        let _enter = self.span.clone().entered();
        handler.batch(self.statement()?)?;
        self.phase = Phase::Executed;
        Ok(())
    }

    /// Hand an owned handle over to the caller instead of closing it.
    pub fn retain(mut self) -> Result<StatementGuard> {
        match self.handle.take() {
            Some(Handle::Owned(guard)) => {
                self.phase = Phase::Closed;
                Ok(guard)
            }
            Some(leased @ Handle::Leased(_)) => {
                self.handle = Some(leased);
                Err(Error::Database(format!(
                    "statement '{}' holds a borrowed handle",
                    self.statement_id
                )))
            }
            None => Err(no_handle(&self.statement_id)),
        }
    }

    /// Release the handle. Safe to call in any phase, any number of times.
    pub fn close(&mut self) {
        match self.handle.take() {
            Some(Handle::Owned(guard)) => drop(guard),
            Some(Handle::Leased(statement)) => statement.clear_parameters(),
            None => {}
        }

        if self.phase != Phase::Idle && self.phase != Phase::Closed {
            let elapsed = self.started.elapsed();
            self.span.record("elapsed_us", elapsed.as_micros() as u64);
            debug!("<==  {} finished in {:?}", self.statement_id, elapsed);
        }
        self.phase = Phase::Closed;
    }

    fn statement(&mut self) -> Result<&mut dyn Statement> {
        match self.handle.as_mut() {
            Some(Handle::Owned(guard)) => Ok(guard.statement()),
            Some(Handle::Leased(statement)) => Ok(&mut **statement),
            None => Err(no_handle(&self.statement_id)),
        }
    }
}

fn no_handle(statement_id: &str) -> Error {
    Error::Database(format!("no statement prepared for '{}'", statement_id))
}

impl Drop for ExecutionContext<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{Configuration, Settings};
    use crate::connection::{DataSource, MemoryDatabase};
    use crate::core::{Parameter, RowBounds};
    use crate::mapping::MappedStatement;
    use crate::transaction::LocalTransaction;

    #[test]
    fn test_guard_closes_once() {
        let db = MemoryDatabase::new();
        let mut conn = db.connection().unwrap();

        let guard = StatementGuard::new(conn.prepare("select 1").unwrap());
        guard.close().unwrap();
        assert_eq!(db.stats().statements_closed, 1);

        let guard = StatementGuard::new(conn.prepare("select 2").unwrap());
        drop(guard);
        assert_eq!(db.stats().statements_closed, 2);
    }

    #[test]
    fn test_close_from_idle_is_noop() {
        let mut ctx = ExecutionContext::begin("UserMapper.findAll");
        assert_eq!(ctx.phase(), Phase::Idle);
        ctx.close();
        ctx.close();
        assert_eq!(ctx.phase(), Phase::Closed);
    }

    #[test]
    fn test_missing_handle_is_an_error() {
        let configuration = Arc::new(Configuration::new(Settings::default()));
        let statement = Arc::new(MappedStatement::select("UserMapper.findAll", "select * from user").unwrap());
        let handler = configuration.new_statement_handler(statement, Parameter::Null, RowBounds::DEFAULT);

        let mut ctx = ExecutionContext::begin("UserMapper.findAll");
        match ctx.query(handler.as_ref()) {
            Err(Error::Database(message)) => assert!(message.contains("UserMapper.findAll")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(ctx.retain().is_err());
    }

    #[test]
    fn test_acquire_before_lease() {
        let db = MemoryDatabase::new();
        let mut tx = LocalTransaction::new(Arc::new(db.clone()), false);
        let mut conn = db.connection().unwrap();
        let mut statement = conn.prepare("select 1").unwrap();

        let mut ctx = ExecutionContext::begin("x");
        ctx.acquire(&mut tx).unwrap();
        assert_eq!(ctx.phase(), Phase::ConnectionAcquired);
        ctx.lease(statement.as_mut());
        assert_eq!(ctx.phase(), Phase::StatementPrepared);
        ctx.close();
        assert_eq!(ctx.phase(), Phase::Closed);
        drop(ctx);

        // one connection for the transaction, one for the handle
        assert_eq!(db.stats().connections_opened, 2);
        assert!(!statement.is_closed());
    }

    #[test]
    fn test_leased_handle_survives_close() {
        let db = MemoryDatabase::new();
        let mut conn = db.connection().unwrap();
        let mut statement = conn.prepare("select ?").unwrap();
        {
            let mut ctx = ExecutionContext::begin("x");
            ctx.lease(statement.as_mut());
            assert_eq!(ctx.phase(), Phase::StatementPrepared);
            assert!(ctx.retain().is_err());
        }
        assert!(!statement.is_closed());
        assert_eq!(db.stats().statements_closed, 0);
    }
}
