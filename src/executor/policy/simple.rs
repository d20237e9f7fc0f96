use super::StatementPolicy;
use crate::core::{Result, Row};
use crate::executor::{BatchResult, Cursor, ExecutionContext, StatementHandler};
use crate::transaction::Transaction;

/// A fresh handle per call, closed before the call returns.
#[derive(Debug, Default)]
pub struct SimpleStatements;

impl StatementPolicy for SimpleStatements {
    fn do_update(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<u64> {
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.open(transaction, handler)?;
        ctx.update(handler)
    }

    fn do_query(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<Vec<Row>> {
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.open(transaction, handler)?;
        ctx.query(handler)
    }

    fn do_query_cursor(
        &mut self,
        transaction: &mut dyn Transaction,
        handler: &dyn StatementHandler,
    ) -> Result<Cursor> {
        let mut ctx = ExecutionContext::begin(handler.mapped_statement().id());
        ctx.open(transaction, handler)?;
        ctx.query_cursor(handler)
    }

    fn do_flush_statements(&mut self, _is_rollback: bool) -> Result<Vec<BatchResult>> {
        Ok(Vec::new())
    }
}
