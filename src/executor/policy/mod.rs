//! What an executor does with statement handles between calls.

mod batch;
mod reuse;
mod simple;

use super::{BatchResult, Cursor, StatementHandler};
use crate::core::{Result, Row};
use crate::transaction::Transaction;

pub use batch::BatchStatements;
pub use reuse::ReuseStatements;
pub use simple::SimpleStatements;

pub trait StatementPolicy: Send {
    fn do_update(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<u64>;

    fn do_query(&mut self, transaction: &mut dyn Transaction, handler: &dyn StatementHandler) -> Result<Vec<Row>>;

    fn do_query_cursor(
        &mut self,
        transaction: &mut dyn Transaction,
        handler: &dyn StatementHandler,
    ) -> Result<Cursor>;

    fn do_flush_statements(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>>;
}
