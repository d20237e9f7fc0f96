//! Interceptors around executors and statement handlers.
//!
//! An [`Interceptor`] declares the `(target, method)` pairs it cares about.
//! The [`InterceptorChain`] wraps each target once per interested
//! interceptor, in registration order, so the last registered interceptor is
//! the outermost one and sees each call first.
//!
//! ```ignore
//! struct Audit;
//!
//! impl Interceptor for Audit {
//!     fn signatures(&self) -> Vec<Signature> {
//!         vec![Signature::new(TargetKind::Executor, "update")]
//!     }
//!
//!     fn intercept(&self, mut invocation: Invocation<'_>) -> Result<Outcome> {
//!         log::info!("{} {:?}", invocation.method(), invocation.args());
//!         invocation.proceed()
//!     }
//! }
//! ```

mod chain;
mod invocation;
mod wrap;

use std::fmt;

use crate::core::Result;

pub use chain::{InterceptorChain, RegisteredInterceptor};
pub use invocation::{ArgValue, Invocation, InvocationTarget, Outcome};
pub use wrap::{ExecutorPlugin, ParameterHandlerPlugin, ResultSetHandlerPlugin, StatementHandlerPlugin};

/// Interceptable target interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    Executor,
    StatementHandler,
    ParameterHandler,
    ResultSetHandler,
}

impl TargetKind {
    /// Methods of the target that can be intercepted.
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            Self::Executor => &[
                "update",
                "query",
                "query_cursor",
                "flush_statements",
                "commit",
                "rollback",
            ],
            Self::StatementHandler => &[
                "prepare",
                "parameterize",
                "batch",
                "update",
                "query",
                "query_cursor",
            ],
            Self::ParameterHandler => &["set_parameters"],
            Self::ResultSetHandler => &["handle_result_sets", "handle_cursor_result_sets"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Executor => "Executor",
            Self::StatementHandler => "StatementHandler",
            Self::ParameterHandler => "ParameterHandler",
            Self::ResultSetHandler => "ResultSetHandler",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One intercepted method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub target: TargetKind,
    pub method: &'static str,
}

impl Signature {
    pub fn new(target: TargetKind, method: &'static str) -> Self {
        Self { target, method }
    }
}

pub trait Interceptor: Send + Sync {
    /// Name for logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Methods this interceptor wants to see. Must not be empty.
    fn signatures(&self) -> Vec<Signature>;

    /// Handle one intercepted call. Calling [`Invocation::proceed`] runs the
    /// next layer; not calling it short-circuits the call.
    fn intercept(&self, invocation: Invocation<'_>) -> Result<Outcome>;
}
