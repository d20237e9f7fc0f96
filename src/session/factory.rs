use std::sync::Arc;

use log::debug;

use super::DefaultSqlSession;
use crate::config::Configuration;
use crate::core::{Error, Result};
use crate::executor::ExecutorType;
use crate::transaction::LocalTransaction;

/// Opens sessions against a frozen configuration.
#[derive(Debug, Clone)]
pub struct SqlSessionFactory {
    configuration: Arc<Configuration>,
}

impl SqlSessionFactory {
    /// Freeze `configuration`. Settings are validated here.
    pub fn new(configuration: Configuration) -> Result<Self> {
        configuration.settings().validate()?;
        Ok(Self {
            configuration: Arc::new(configuration),
        })
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Session with the configured default executor and auto-commit mode.
    pub fn open_session(&self) -> Result<DefaultSqlSession> {
        let settings = self.configuration.settings();
        self.open_session_with(settings.default_executor_type, settings.auto_commit)
    }

    pub fn open_session_with(&self, executor_type: ExecutorType, auto_commit: bool) -> Result<DefaultSqlSession> {
        let environment = self.configuration.get_environment().ok_or_else(|| {
            Error::InvalidConfiguration("no environment configured; sessions need a data source".to_string())
        })?;

        debug!(
            "Opening {} session on environment '{}' (autocommit={})",
            executor_type,
            environment.id(),
            auto_commit
        );
        let transaction = LocalTransaction::new(Arc::clone(environment.data_source()), auto_commit);
        let executor = self.configuration.new_executor(Box::new(transaction), executor_type);
        Ok(DefaultSqlSession::new(
            Arc::clone(&self.configuration),
            executor,
            auto_commit,
        ))
    }
}
