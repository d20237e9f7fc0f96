use thiserror::Error;

use crate::executor::BatchResult;

/// Crate-wide error type.
///
/// | Category | Variants | Surfaced |
/// |----------|----------|----------|
/// | Registration | [`Error::Registration`] | at setup, never retried |
/// | Binding | [`Error::Binding`] | on method resolution |
/// | Per call | `ParameterBinding`, `TooManyResults` | execution aborted, handle released |
/// | Execution | `Connection`, `Database`, `Batch` | propagated unchanged |
/// | Plugin | [`Error::Plugin`] | configuration at setup, outcome mismatches per call |
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("Error setting parameter #{index} ('{property}') of statement '{statement}': {reason}")]
    ParameterBinding {
        statement: String,
        index: usize,
        property: String,
        reason: String,
    },

    #[error("Expected one result (or none) to be returned by select_one(), but found: {found}")]
    TooManyResults { found: usize },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(
        "Batch flush failed on statement '{statement}' after {} group(s) executed: {source}",
        .executed.len()
    )]
    Batch {
        statement: String,
        sql: String,
        executed: Vec<BatchResult>,
        #[source]
        source: Box<Error>,
    },

    #[error("Executor was closed")]
    ExecutorClosed,

    #[error("Session is already executing a statement")]
    SessionBusy,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Failures while registering mappers and statement descriptors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Type {mapper} is already known to the mapper registry")]
    AlreadyRegistered { mapper: String },

    #[error("Type {mapper} is not known to the mapper registry")]
    NotRegistered { mapper: String },

    #[error("Mapped statements collection already contains value for {id}")]
    DuplicateStatement { id: String },

    #[error("Mapper {mapper} declares method '{method}' more than once")]
    DuplicateMethod { mapper: String, method: String },

    #[error("Error resolving mapper {mapper}: {source}")]
    Resolution {
        mapper: String,
        #[source]
        source: BindingError,
    },

    #[error("Error getting mapper instance of {mapper}. Cause: {source}")]
    Instance {
        mapper: String,
        #[source]
        source: Box<Error>,
    },
}

/// Failures binding a mapper method to a statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Invalid bound statement (not found): {id}")]
    StatementNotFound { id: String },

    #[error("Method '{id}' takes {count} unnamed parameters; each parameter needs an explicit name")]
    AmbiguousParameterBinding { id: String, count: usize },

    #[error("Method '{method}' is not declared by mapper {mapper}")]
    MethodNotFound { mapper: String, method: String },

    #[error("Unknown execution method for: {id}")]
    UnknownCommand { id: String },

    #[error("Mapper method '{id}' has an unsupported return shape {shape} for a {command} statement")]
    UnsupportedReturn {
        id: String,
        shape: String,
        command: String,
    },

    #[error("Method '{id}': {reason}")]
    Arguments { id: String, reason: String },

    #[error("Mapper method returned {found}, expected {expected}")]
    ResultShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Map key column '{key}' not found in a row returned by '{id}'")]
    MapKeyNotFound { id: String, key: String },
}

/// Interceptor registration and dispatch failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("Interceptor '{interceptor}' is misconfigured: {reason}")]
    Configuration { interceptor: String, reason: String },

    #[error("Interceptor '{interceptor}' returned {found} from {target}.{method}, expected {expected}")]
    UnexpectedOutcome {
        interceptor: String,
        target: &'static str,
        method: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Connection(err.to_string())
    }
}
