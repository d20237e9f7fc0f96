use std::num::NonZeroUsize;

use log::debug;
use lru::LruCache;

use super::StatementPolicy;
use crate::connection::Statement;
use crate::core::{Error, Result, Row};
use crate::executor::{BatchResult, Cursor, ExecutionContext, StatementGuard, StatementHandler};
use crate::transaction::Transaction;

/// Keeps prepared handles open, keyed by SQL text, until the unit of work ends.
pub struct ReuseStatements {
    statements: LruCache<String, StatementGuard>,
}

impl ReuseStatements {
    /// `capacity` of `None` keeps every handle until flush.
    pub fn new(capacity: Option<usize>) -> Self {
        let statements = match capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self { statements }
    }

    /// Number of handles currently cached.
    pub fn cached(&self) -> usize {
        self.statements.len()
    }

    fn statement(
        &mut self,
        transaction: &mut dyn Transaction,
        handler: &dyn StatementHandler,
    ) -> Result<&mut dyn Statement> {
        let sql = handler.bound_sql().sql().to_string();

        if self.statements.peek(&sql).is_some_and(|s| s.is_closed()) {
            self.statements.pop(&sql);
        }

        if !self.statements.contains(&sql) {
            let timeout = transaction.timeout();
            let guard = handler.prepare(transaction.connection()?, timeout)?;
            if let Some((evicted_sql, _evicted)) = self.statements.push(sql.clone(), guard) {
                debug!("Evicting cached statement: {}", evicted_sql);
            }
        }

        match self.statements.get_mut(&sql) {
            Some(guard) => Ok(guard.statement()),
            None => Err(Error::Database(format!("statement cache lost '{}'", sql))),
        }
    }
}

impl Default for ReuseStatements {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StatementPolicy for ReuseStatements {
    fn do_update(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<u64> {
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.acquire(transaction)?;
        ctx.lease(self.statement(transaction, handler)?);
        ctx.parameterize(handler)?;
        ctx.update(handler)
    }

    fn do_query(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<Vec<Row>> {
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.acquire(transaction)?;
        ctx.lease(self.statement(transaction, handler)?);
        ctx.parameterize(handler)?;
        ctx.query(handler)
    }

    fn do_query_cursor(
        &mut self,
        transaction: &mut dyn Transaction,
        handler: &dyn StatementHandler,
    ) -> Result<Cursor> {
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.acquire(transaction)?;
        ctx.lease(self.statement(transaction, handler)?);
        ctx.parameterize(handler)?;
        ctx.query_cursor(handler)
    }

    fn do_flush_statements(&mut self, _is_rollback: bool) -> Result<Vec<BatchResult>> {
        // dropping a guard closes its handle
        self.statements.clear();
        Ok(Vec::new())
    }
}
