use log::debug;

use super::StatementPolicy;
use crate::core::{Error, Result, Row};
use crate::executor::{BatchResult, Cursor, ExecutionContext, StatementGuard, StatementHandler};
use crate::transaction::Transaction;

/// Accumulates updates into batches; reads flush pending work first.
///
/// Consecutive updates with the same SQL text and statement id share one
/// handle and one [`BatchResult`].
#[derive(Default)]
pub struct BatchStatements {
    statements: Vec<StatementGuard>,
    results: Vec<BatchResult>,
    current_sql: Option<String>,
    current_statement: Option<String>,
}

impl BatchStatements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of statement groups waiting for a flush.
    pub fn pending(&self) -> usize {
        self.results.len()
    }

    fn continues_current(&self, sql: &str, statement_id: &str) -> bool {
        self.current_sql.as_deref() == Some(sql) && self.current_statement.as_deref() == Some(statement_id)
    }
}

impl StatementPolicy for BatchStatements {
    fn do_update(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<u64> {
        let sql = handler.bound_sql().sql();
        let statement_id = handler.mapped_statement().id();

        if self.continues_current(sql, statement_id) {
            if let (Some(guard), Some(result)) = (self.statements.last_mut(), self.results.last_mut()) {
                let mut ctx = ExecutionContext::begin(statement_id);
                ctx.acquire(transaction)?;
                ctx.lease(guard.statement());
                ctx.parameterize(handler)?;
                ctx.batch(handler)?;
                result.add_parameter(handler.parameter().clone());
                return Ok(0);
            }
        }

        let mut ctx = ExecutionContext::begin(statement_id);
        ctx.open(transaction, handler)?;
        ctx.batch(handler)?;
        let guard = ctx.retain()?;

        self.statements.push(guard);
        self.results
            .push(BatchResult::new(statement_id, sql, handler.parameter().clone()));
        self.current_sql = Some(sql.to_string());
        self.current_statement = Some(statement_id.to_string());
        Ok(0)
    }

    fn do_query(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<Vec<Row>> {
        self.do_flush_statements(false)?;
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.open(transaction, handler)?;
        ctx.query(handler)
    }

    fn do_query_cursor(
        &mut self,
        transaction: &mut dyn Transaction,
        handler: &dyn StatementHandler,
    ) -> Result<Cursor> {
        self.do_flush_statements(false)?;
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.open(transaction, handler)?;
        ctx.query_cursor(handler)
    }

    fn do_flush_statements(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>> {
        let statements = std::mem::take(&mut self.statements);
        let results = std::mem::take(&mut self.results);
        self.current_sql = None;
        self.current_statement = None;

        if is_rollback {
            if !results.is_empty() {
                debug!("Discarding {} pending batch group(s)", results.len());
            }
            return Ok(Vec::new());
        }

        let mut executed = Vec::with_capacity(results.len());
        for (mut guard, mut result) in statements.into_iter().zip(results) {
            let _span = tracing::info_span!("batch", id = %result.statement_id()).entered();
            match guard.statement().execute_batch() {
                Ok(counts) => {
                    debug!(
                        "<==    Batch: {} ({} entries)",
                        result.statement_id(),
                        counts.len()
                    );
                    result.set_update_counts(counts);
                    executed.push(result);
                }
                Err(source) => {
                    // remaining guards drop here and close their handles
                    return Err(Error::Batch {
                        statement: result.statement_id().to_string(),
                        sql: result.sql().to_string(),
                        executed,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(executed)
    }
}
