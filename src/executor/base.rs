use std::sync::Arc;

use log::{debug, warn};

use super::policy::{BatchStatements, ReuseStatements, SimpleStatements, StatementPolicy};
use super::{BatchResult, Cursor, Executor, StatementHandler};
use crate::config::Configuration;
use crate::core::{Error, Parameter, Result, Row, RowBounds};
use crate::mapping::MappedStatement;
use crate::transaction::Transaction;

/// Executor lifecycle shared by every statement policy.
pub struct BaseExecutor<P: StatementPolicy> {
    configuration: Arc<Configuration>,
    transaction: Box<dyn Transaction>,
    policy: P,
    closed: bool,
}

pub type SimpleExecutor = BaseExecutor<SimpleStatements>;
pub type ReuseExecutor = BaseExecutor<ReuseStatements>;
pub type BatchExecutor = BaseExecutor<BatchStatements>;

impl<P: StatementPolicy> BaseExecutor<P> {
    pub fn with_policy(configuration: Arc<Configuration>, transaction: Box<dyn Transaction>, policy: P) -> Self {
        Self {
            configuration,
            transaction,
            policy,
            closed: false,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        Ok(())
    }

    fn statement_handler(
        &self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Box<dyn StatementHandler> {
        self.configuration
            .new_statement_handler(Arc::clone(statement), parameter.clone(), bounds)
    }
}

impl SimpleExecutor {
    pub fn new(configuration: Arc<Configuration>, transaction: Box<dyn Transaction>) -> Self {
        Self::with_policy(configuration, transaction, SimpleStatements)
    }
}

impl ReuseExecutor {
    pub fn new(configuration: Arc<Configuration>, transaction: Box<dyn Transaction>) -> Self {
        let capacity = configuration.settings().statement_cache_capacity;
        Self::with_policy(configuration, transaction, ReuseStatements::new(capacity))
    }
}

impl BatchExecutor {
    pub fn new(configuration: Arc<Configuration>, transaction: Box<dyn Transaction>) -> Self {
        Self::with_policy(configuration, transaction, BatchStatements::new())
    }
}

impl<P: StatementPolicy> Executor for BaseExecutor<P> {
    fn update(&mut self, statement: &Arc<MappedStatement>, parameter: &Parameter) -> Result<u64> {
        self.ensure_open()?;
        let handler = self.statement_handler(statement, parameter, RowBounds::DEFAULT);
        self.policy.do_update(self.transaction.as_mut(), handler.as_ref())
    }

    fn query(
        &mut self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Vec<Row>> {
        self.ensure_open()?;
        let handler = self.statement_handler(statement, parameter, bounds);
        self.policy.do_query(self.transaction.as_mut(), handler.as_ref())
    }

    fn query_cursor(
        &mut self,
        statement: &Arc<MappedStatement>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Cursor> {
        self.ensure_open()?;
        let handler = self.statement_handler(statement, parameter, bounds);
        self.policy.do_query_cursor(self.transaction.as_mut(), handler.as_ref())
    }

    fn flush_statements(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>> {
        self.ensure_open()?;
        self.policy.do_flush_statements(is_rollback)
    }

    fn commit(&mut self, required: bool) -> Result<()> {
        self.ensure_open()?;
        self.flush_statements(false)?;
        if required {
            self.transaction.commit()?;
        }
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> Result<()> {
        self.ensure_open()?;
        let discarded = self.policy.do_flush_statements(true);
        if required {
            self.transaction.rollback()?;
        }
        discarded.map(|_| ())
    }

    fn close(&mut self, force_rollback: bool) {
        if self.closed {
            return;
        }
        if let Err(e) = self.rollback(force_rollback) {
            warn!("Unexpected exception on closing transaction. Cause: {}", e);
        }
        if let Err(e) = self.transaction.close() {
            warn!("Error closing transaction: {}", e);
        }
        self.closed = true;
        debug!("Executor closed");
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<P: StatementPolicy> Drop for BaseExecutor<P> {
    fn drop(&mut self) {
        self.close(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, Settings};
    use crate::connection::MemoryDatabase;
    use crate::transaction::LocalTransaction;

    fn setup(db: &MemoryDatabase) -> (Arc<Configuration>, Box<dyn Transaction>) {
        let mut configuration = Configuration::new(Settings::default());
        configuration
            .add_mapped_statement(
                MappedStatement::insert("UserMapper.insert", "insert into user (name) values (#{name})").unwrap(),
            )
            .unwrap();
        let tx = Box::new(LocalTransaction::new(Arc::new(db.clone()), false));
        (Arc::new(configuration), tx)
    }

    #[test]
    fn test_closed_executor_rejects_calls() {
        let db = MemoryDatabase::new();
        let (configuration, tx) = setup(&db);
        let statement = configuration.mapped_statement("UserMapper.insert").unwrap();

        let mut executor = SimpleExecutor::new(configuration, tx);
        executor.close(false);
        assert!(executor.is_closed());
        assert!(matches!(
            executor.update(&statement, &Parameter::from("alice")),
            Err(Error::ExecutorClosed)
        ));
        assert!(matches!(executor.commit(true), Err(Error::ExecutorClosed)));
        // second close is a no-op
        executor.close(true);
    }

    #[test]
    fn test_commit_flushes_pending_batch() {
        let db = MemoryDatabase::new();
        let (configuration, tx) = setup(&db);
        let statement = configuration.mapped_statement("UserMapper.insert").unwrap();

        let mut executor = BatchExecutor::new(configuration, tx);
        executor.update(&statement, &Parameter::from("alice")).unwrap();
        assert_eq!(executor.policy().pending(), 1);
        assert!(db.executed().is_empty());

        executor.commit(true).unwrap();
        assert_eq!(executor.policy().pending(), 0);
        assert_eq!(db.executed().len(), 1);
        assert_eq!(db.stats().commits, 1);
    }

    #[test]
    fn test_close_releases_connection_and_handles() {
        let db = MemoryDatabase::new();
        let (configuration, tx) = setup(&db);
        let statement = configuration.mapped_statement("UserMapper.insert").unwrap();

        let mut executor = ReuseExecutor::new(configuration, tx);
        executor.update(&statement, &Parameter::from("a")).unwrap();
        executor.update(&statement, &Parameter::from("b")).unwrap();
        assert_eq!(executor.policy().cached(), 1);

        executor.close(true);
        let stats = db.stats();
        assert_eq!(stats.statements_prepared, 1);
        assert_eq!(stats.open_statements(), 0);
        assert_eq!(stats.open_connections(), 0);
        assert_eq!(stats.rollbacks, 1);
    }
}
