use std::time::Duration;

use serde::Deserialize;

use crate::core::{Error, Result};
use crate::executor::ExecutorType;

/// Runtime settings shared by every session of a configuration.
///
/// Loadable from JSON; missing keys keep their defaults:
///
/// ```ignore
/// let settings = Settings::from_json(r#"{
///     "default_executor_type": "REUSE",
///     "default_statement_timeout": 30,
///     "statement_cache_capacity": 64
/// }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Executor used by `open_session()`
    pub default_executor_type: ExecutorType,

    /// Query timeout for statements that declare none (seconds in JSON)
    #[serde(with = "duration_secs")]
    pub default_statement_timeout: Option<Duration>,

    /// Fetch size hint for statements that declare none
    pub default_fetch_size: Option<u32>,

    /// Maximum open handles kept by the reuse executor; unbounded when absent
    pub statement_cache_capacity: Option<usize>,

    /// Auto-commit mode of sessions opened with `open_session()`
    pub auto_commit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_executor_type: ExecutorType::Simple,
            default_statement_timeout: None,
            default_fetch_size: None,
            statement_cache_capacity: None,
            auto_commit: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default executor type
    pub fn default_executor_type(mut self, executor_type: ExecutorType) -> Self {
        self.default_executor_type = executor_type;
        self
    }

    /// Set the default statement timeout
    pub fn default_statement_timeout(mut self, timeout: Duration) -> Self {
        self.default_statement_timeout = Some(timeout);
        self
    }

    /// Set the default fetch size
    pub fn default_fetch_size(mut self, rows: u32) -> Self {
        self.default_fetch_size = Some(rows);
        self
    }

    /// Bound the reuse executor's statement cache
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = Some(capacity);
        self
    }

    /// Set the default auto-commit mode
    pub fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfiguration(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_statement_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfiguration(
                "default_statement_timeout must be > 0".to_string(),
            ));
        }

        if self.default_fetch_size == Some(0) {
            return Err(Error::InvalidConfiguration(
                "default_fetch_size must be > 0".to_string(),
            ));
        }

        if self.statement_cache_capacity == Some(0) {
            return Err(Error::InvalidConfiguration(
                "statement_cache_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
