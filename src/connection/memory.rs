use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::trace;

use super::{Connection, DataSource, Statement};
use crate::core::{Error, Result, Value};
use crate::result::ResultSet;

type QueryFn = Arc<dyn Fn(&[Value]) -> Result<ResultSet> + Send + Sync>;
type UpdateFn = Arc<dyn Fn(&[Value]) -> Result<u64> + Send + Sync>;

/// Counters kept by the in-memory driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub connections_opened: usize,
    pub connections_closed: usize,
    pub statements_prepared: usize,
    /// Every `close()` call on a statement handle, including repeated ones.
    pub statements_closed: usize,
    pub queries: usize,
    pub updates: usize,
    pub batches: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

impl DriverStats {
    pub fn open_statements(&self) -> usize {
        self.statements_prepared.saturating_sub(self.statements_closed)
    }

    pub fn open_connections(&self) -> usize {
        self.connections_opened.saturating_sub(self.connections_closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    Query,
    Update,
    Batch,
}

/// One statement execution as seen by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<Value>,
    pub kind: ExecutionKind,
    pub timeout: Option<Duration>,
    pub fetch_size: Option<u32>,
}

#[derive(Default)]
struct Shared {
    queries: HashMap<String, QueryFn>,
    updates: HashMap<String, UpdateFn>,
    stats: DriverStats,
    executed: Vec<ExecutedStatement>,
    refuse_connections: bool,
    next_connection_id: u64,
}

/// Scripted in-process database.
///
/// Queries and updates are answered by callbacks registered per SQL text.
/// Unscripted queries return an empty result set and unscripted updates
/// report one affected row. Every execution is recorded.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` queries with the given callback.
    pub fn on_query<F>(&self, sql: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<ResultSet> + Send + Sync + 'static,
    {
        if let Ok(mut shared) = self.shared.lock() {
            shared.queries.insert(sql.into(), Arc::new(handler));
        }
        self
    }

    /// Answer `sql` updates (and batch entries) with the given callback.
    pub fn on_update<F>(&self, sql: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<u64> + Send + Sync + 'static,
    {
        if let Ok(mut shared) = self.shared.lock() {
            shared.updates.insert(sql.into(), Arc::new(handler));
        }
        self
    }

    /// Make subsequent `connection()` calls fail.
    pub fn refuse_connections(&self, refuse: bool) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.refuse_connections = refuse;
        }
    }

    pub fn stats(&self) -> DriverStats {
        self.shared.lock().map(|s| s.stats).unwrap_or_default()
    }

    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.shared
            .lock()
            .map(|s| s.executed.clone())
            .unwrap_or_default()
    }

    pub fn clear_executed(&self) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.executed.clear();
        }
    }
}

impl DataSource for MemoryDatabase {
    fn connection(&self) -> Result<Box<dyn Connection>> {
        let mut shared = self.shared.lock()?;
        if shared.refuse_connections {
            return Err(Error::Connection("connection refused".into()));
        }
        shared.next_connection_id += 1;
        shared.stats.connections_opened += 1;
        let id = shared.next_connection_id;
        trace!("memory connection {} opened", id);

        Ok(Box::new(MemoryConnection {
            id,
            shared: Arc::clone(&self.shared),
            auto_commit: true,
            closed: false,
        }))
    }
}

struct MemoryConnection {
    id: u64,
    shared: Arc<Mutex<Shared>>,
    auto_commit: bool,
    closed: bool,
}

impl MemoryConnection {
    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Connection(format!("connection {} is closed", self.id)));
        }
        Ok(())
    }
}

impl Connection for MemoryConnection {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>> {
        self.check_open()?;
        self.shared.lock()?.stats.statements_prepared += 1;

        Ok(Box::new(MemoryStatement {
            sql: sql.to_string(),
            shared: Arc::clone(&self.shared),
            params: vec![None; sql.matches('?').count()],
            batch: Vec::new(),
            timeout: None,
            fetch_size: None,
            closed: false,
        }))
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.check_open()?;
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn commit(&mut self) -> Result<()> {
        self.check_open()?;
        self.shared.lock()?.stats.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.check_open()?;
        self.shared.lock()?.stats.rollbacks += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.shared.lock()?.stats.connections_closed += 1;
        trace!("memory connection {} closed", self.id);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct MemoryStatement {
    sql: String,
    shared: Arc<Mutex<Shared>>,
    params: Vec<Option<Value>>,
    batch: Vec<Vec<Value>>,
    timeout: Option<Duration>,
    fetch_size: Option<u32>,
    closed: bool,
}

impl MemoryStatement {
    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Database(format!("statement '{}' is closed", self.sql)));
        }
        Ok(())
    }

    fn bound_values(&self) -> Result<Vec<Value>> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                p.clone()
                    .ok_or_else(|| Error::Database(format!("no value bound for parameter {}", i + 1)))
            })
            .collect()
    }

    fn record(&self, shared: &mut Shared, params: Vec<Value>, kind: ExecutionKind) {
        shared.executed.push(ExecutedStatement {
            sql: self.sql.clone(),
            params,
            kind,
            timeout: self.timeout,
            fetch_size: self.fetch_size,
        });
    }

    fn run_update(&self, handler: Option<&UpdateFn>, params: &[Value]) -> Result<u64> {
        match handler {
            Some(handler) => handler(params),
            None => Ok(1),
        }
    }
}

impl Statement for MemoryStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
        self.check_open()?;
        let len = self.params.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.params.get_mut(i))
            .ok_or_else(|| {
                Error::Database(format!(
                    "parameter index {} out of range (statement has {})",
                    index, len
                ))
            })?;
        *slot = Some(value.clone());
        Ok(())
    }

    fn clear_parameters(&mut self) {
        self.params.iter_mut().for_each(|p| *p = None);
    }

    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.check_open()?;
        self.timeout = timeout;
        Ok(())
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        self.check_open()?;
        self.fetch_size = Some(rows);
        Ok(())
    }

    fn execute_query(&mut self) -> Result<ResultSet> {
        self.check_open()?;
        let params = self.bound_values()?;
        let handler = {
            let mut shared = self.shared.lock()?;
            shared.stats.queries += 1;
            self.record(&mut shared, params.clone(), ExecutionKind::Query);
            shared.queries.get(&self.sql).cloned()
        };
        match handler {
            Some(handler) => handler(&params),
            None => Ok(ResultSet::empty()),
        }
    }

    fn execute_update(&mut self) -> Result<u64> {
        self.check_open()?;
        let params = self.bound_values()?;
        let handler = {
            let mut shared = self.shared.lock()?;
            shared.stats.updates += 1;
            self.record(&mut shared, params.clone(), ExecutionKind::Update);
            shared.updates.get(&self.sql).cloned()
        };
        self.run_update(handler.as_ref(), &params)
    }

    fn add_batch(&mut self) -> Result<()> {
        self.check_open()?;
        let params = self.bound_values()?;
        self.batch.push(params);
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>> {
        self.check_open()?;
        let entries = std::mem::take(&mut self.batch);
        let handler = {
            let mut shared = self.shared.lock()?;
            shared.stats.batches += 1;
            shared.updates.get(&self.sql).cloned()
        };

        let mut counts = Vec::with_capacity(entries.len());
        for params in entries {
            {
                let mut shared = self.shared.lock()?;
                self.record(&mut shared, params.clone(), ExecutionKind::Batch);
            }
            counts.push(self.run_update(handler.as_ref(), &params)?);
        }
        Ok(counts)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.batch.clear();
        self.shared.lock()?.stats.statements_closed += 1;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
