use std::cell::{Cell, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use uuid::Uuid;

use super::SqlSession;
use crate::binding::Mapper;
use crate::config::Configuration;
use crate::core::{BindingError, Error, Parameter, Result, Row, RowBounds, Value};
use crate::executor::{BatchResult, Cursor, Executor, ResultContext, ResultHandler};

/// Session backed by one executor.
///
/// Writes mark the session dirty; `commit(false)` and `rollback(false)` only
/// reach the transaction when the session is dirty and not auto-committing.
pub struct DefaultSqlSession {
    id: Uuid,
    configuration: Arc<Configuration>,
    executor: RefCell<Box<dyn Executor>>,
    auto_commit: bool,
    dirty: Cell<bool>,
    closed: Cell<bool>,
}

impl DefaultSqlSession {
    pub fn new(configuration: Arc<Configuration>, executor: Box<dyn Executor>, auto_commit: bool) -> Self {
        let id = Uuid::new_v4();
        debug!("[{}] Session opened (autocommit={})", id, auto_commit);
        Self {
            id,
            configuration,
            executor: RefCell::new(executor),
            auto_commit,
            dirty: Cell::new(false),
            closed: Cell::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// True after a write that has not been committed or rolled back yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// A mapper instance bound to this session.
    pub fn get_mapper<M: Mapper>(&self) -> Result<M::Instance<'_>> {
        self.configuration.get_mapper::<M>(self)
    }

    fn executor(&self) -> Result<RefMut<'_, Box<dyn Executor>>> {
        self.executor.try_borrow_mut().map_err(|_| Error::SessionBusy)
    }

    fn is_commit_or_rollback_required(&self, force: bool) -> bool {
        (!self.auto_commit && self.dirty.get()) || force
    }

    fn write(&self, statement: &str, parameter: &Parameter) -> Result<u64> {
        let ms = self.configuration.mapped_statement(statement)?;
        self.dirty.set(true);
        self.executor()?.update(&ms, parameter)
    }
}

impl SqlSession for DefaultSqlSession {
    fn select_one(&self, statement: &str, parameter: &Parameter) -> Result<Option<Row>> {
        let mut rows = self.select_list(statement, parameter)?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            found => Err(Error::TooManyResults { found }),
        }
    }

    fn select_list_with_bounds(&self, statement: &str, parameter: &Parameter, bounds: RowBounds) -> Result<Vec<Row>> {
        let ms = self.configuration.mapped_statement(statement)?;
        self.executor()?.query(&ms, parameter, bounds)
    }

    fn select_map(
        &self,
        statement: &str,
        parameter: &Parameter,
        key: &str,
        bounds: RowBounds,
    ) -> Result<HashMap<Value, Row>> {
        let rows = self.select_list_with_bounds(statement, parameter, bounds)?;
        let mut map = HashMap::with_capacity(rows.len());
        for row in rows {
            let value = row.get(key).cloned().ok_or_else(|| BindingError::MapKeyNotFound {
                id: statement.to_string(),
                key: key.to_string(),
            })?;
            // later rows win on duplicate keys
            map.insert(value, row);
        }
        Ok(map)
    }

    fn select_cursor(&self, statement: &str, parameter: &Parameter, bounds: RowBounds) -> Result<Cursor> {
        let ms = self.configuration.mapped_statement(statement)?;
        self.executor()?.query_cursor(&ms, parameter, bounds)
    }

    fn select_with_handler(
        &self,
        statement: &str,
        parameter: &Parameter,
        bounds: RowBounds,
        handler: &mut dyn ResultHandler,
    ) -> Result<()> {
        let cursor = self.select_cursor(statement, parameter, bounds)?;
        let mut context = ResultContext::new();
        for row in cursor {
            context.next_row();
            handler.handle_result(row, &mut context);
            if context.is_stopped() {
                break;
            }
        }
        Ok(())
    }

    fn insert(&self, statement: &str, parameter: &Parameter) -> Result<u64> {
        self.write(statement, parameter)
    }

    fn update(&self, statement: &str, parameter: &Parameter) -> Result<u64> {
        self.write(statement, parameter)
    }

    fn delete(&self, statement: &str, parameter: &Parameter) -> Result<u64> {
        self.write(statement, parameter)
    }

    fn flush_statements(&self) -> Result<Vec<BatchResult>> {
        self.executor()?.flush_statements(false)
    }

    fn commit(&self, force: bool) -> Result<()> {
        let required = self.is_commit_or_rollback_required(force);
        self.executor()?.commit(required)?;
        self.dirty.set(false);
        debug!("[{}] Committed (required={})", self.id, required);
        Ok(())
    }

    fn rollback(&self, force: bool) -> Result<()> {
        let required = self.is_commit_or_rollback_required(force);
        self.executor()?.rollback(required)?;
        self.dirty.set(false);
        debug!("[{}] Rolled back (required={})", self.id, required);
        Ok(())
    }

    fn close(&self) {
        if self.closed.get() {
            return;
        }
        let force_rollback = self.is_commit_or_rollback_required(false);
        match self.executor.try_borrow_mut() {
            Ok(mut executor) => executor.close(force_rollback),
            Err(_) => {
                warn!("[{}] Session closed while a statement was running", self.id);
                return;
            }
        }
        self.dirty.set(false);
        self.closed.set(true);
        debug!("[{}] Session closed", self.id);
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }
}

impl Drop for DefaultSqlSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for DefaultSqlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultSqlSession")
            .field("id", &self.id)
            .field("auto_commit", &self.auto_commit)
            .field("dirty", &self.dirty.get())
            .field("closed", &self.closed.get())
            .finish_non_exhaustive()
    }
}
