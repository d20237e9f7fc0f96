use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::Transaction;
use crate::connection::{Connection, DataSource};
use crate::core::Result;

/// Transaction driven directly through the connection's commit and rollback.
pub struct LocalTransaction {
    data_source: Arc<dyn DataSource>,
    connection: Option<Box<dyn Connection>>,
    auto_commit: bool,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl LocalTransaction {
    pub fn new(data_source: Arc<dyn DataSource>, auto_commit: bool) -> Self {
        Self {
            data_source,
            connection: None,
            auto_commit,
            timeout: None,
            deadline: None,
        }
    }

    /// Deadline measured from the moment the connection is opened
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn open_connection(&mut self) -> Result<Box<dyn Connection>> {
        let mut connection = self.data_source.connection()?;
        if connection.is_auto_commit() != self.auto_commit {
            debug!("Setting autocommit to {} on connection", self.auto_commit);
            connection.set_auto_commit(self.auto_commit)?;
        }
        self.deadline = self.timeout.map(|t| Instant::now() + t);
        Ok(connection)
    }
}

impl Transaction for LocalTransaction {
    fn connection(&mut self) -> Result<&mut dyn Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.open_connection()?,
        };
        Ok(self.connection.insert(connection).as_mut())
    }

    fn commit(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.as_mut() {
            if !connection.is_auto_commit() {
                debug!("Committing connection");
                connection.commit()?;
            }
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.as_mut() {
            if !connection.is_auto_commit() {
                debug!("Rolling back connection");
                connection.rollback()?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            if !connection.is_auto_commit() {
                // connections go back with autocommit restored
                if let Err(e) = connection.set_auto_commit(true) {
                    warn!("Error resetting autocommit before closing the connection: {}", e);
                }
            }
            debug!("Closing connection");
            connection.close()?;
        }
        self.deadline = None;
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MemoryDatabase;

    #[test]
    fn test_connection_opened_lazily_and_reused() {
        let db = MemoryDatabase::new();
        let mut tx = LocalTransaction::new(Arc::new(db.clone()), false);
        assert_eq!(db.stats().connections_opened, 0);

        tx.connection().unwrap();
        tx.connection().unwrap();
        assert_eq!(db.stats().connections_opened, 1);
        assert!(!tx.connection().unwrap().is_auto_commit());

        tx.close().unwrap();
        assert_eq!(db.stats().connections_closed, 1);
    }

    #[test]
    fn test_auto_commit_skips_commit_and_rollback() {
        let db = MemoryDatabase::new();
        let mut tx = LocalTransaction::new(Arc::new(db.clone()), true);
        tx.connection().unwrap();
        tx.commit().unwrap();
        tx.rollback().unwrap();

        let stats = db.stats();
        assert_eq!(stats.commits, 0);
        assert_eq!(stats.rollbacks, 0);
    }

    #[test]
    fn test_commit_reaches_driver_when_manual() {
        let db = MemoryDatabase::new();
        let mut tx = LocalTransaction::new(Arc::new(db.clone()), false);
        // nothing opened yet, nothing to commit
        tx.commit().unwrap();
        assert_eq!(db.stats().commits, 0);

        tx.connection().unwrap();
        tx.commit().unwrap();
        tx.rollback().unwrap();
        assert_eq!(db.stats().commits, 1);
        assert_eq!(db.stats().rollbacks, 1);
    }

    #[test]
    fn test_timeout_counts_down_from_open() {
        let db = MemoryDatabase::new();
        let mut tx = LocalTransaction::new(Arc::new(db), true).with_timeout(Duration::from_secs(30));
        assert_eq!(tx.timeout(), None);

        tx.connection().unwrap();
        let left = tx.timeout().unwrap();
        assert!(left <= Duration::from_secs(30));
        assert!(left > Duration::from_secs(25));
    }
}
