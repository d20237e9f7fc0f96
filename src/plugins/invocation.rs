use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::TargetKind;
use crate::core::{Parameter, Result, Row, RowBounds};
use crate::executor::{BatchResult, Cursor, ParameterHandler, ResultSetHandler, StatementGuard, StatementHandler};
use crate::mapping::MappedStatement;
use crate::result::ResultSet;

/// Snapshot of one argument of an intercepted call.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Statement(Arc<MappedStatement>),
    Parameter(Parameter),
    RowBounds(RowBounds),
    Flag(bool),
    /// SQL text of the statement handle passed to the call
    Sql(String),
    Timeout(Option<Duration>),
    Connection,
    ResultSet(ResultSet),
}

/// Return value of an intercepted call, one variant per return type.
pub enum Outcome {
    Unit,
    Count(u64),
    Rows(Vec<Row>),
    Cursor(Cursor),
    Batch(Vec<BatchResult>),
    /// A prepared handle; dropping the outcome closes it.
    Statement(StatementGuard),
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "Unit",
            Self::Count(_) => "Count",
            Self::Rows(_) => "Rows",
            Self::Cursor(_) => "Cursor",
            Self::Batch(_) => "Batch",
            Self::Statement(_) => "Statement",
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "Unit"),
            Self::Count(n) => f.debug_tuple("Count").field(n).finish(),
            Self::Rows(rows) => f.debug_tuple("Rows").field(rows).finish(),
            Self::Cursor(cursor) => f.debug_tuple("Cursor").field(cursor).finish(),
            Self::Batch(results) => f.debug_tuple("Batch").field(results).finish(),
            Self::Statement(guard) => f.debug_tuple("Statement").field(&guard.sql()).finish(),
        }
    }
}

/// The object whose method was intercepted.
///
/// Handlers are shared for the duration of the call, so an interceptor can
/// read the mapped statement, bound SQL or parameter object they carry.
/// The executor is exclusively borrowed by `proceed`; its call arguments
/// are in [`Invocation::args`] instead.
#[derive(Clone, Copy)]
pub enum InvocationTarget<'a> {
    Executor,
    StatementHandler(&'a dyn StatementHandler),
    ParameterHandler(&'a dyn ParameterHandler),
    ResultSetHandler(&'a dyn ResultSetHandler),
}

impl InvocationTarget<'_> {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Executor => TargetKind::Executor,
            Self::StatementHandler(_) => TargetKind::StatementHandler,
            Self::ParameterHandler(_) => TargetKind::ParameterHandler,
            Self::ResultSetHandler(_) => TargetKind::ResultSetHandler,
        }
    }

    pub fn statement_handler(&self) -> Option<&dyn StatementHandler> {
        match self {
            Self::StatementHandler(handler) => Some(*handler),
            _ => None,
        }
    }

    pub fn parameter_handler(&self) -> Option<&dyn ParameterHandler> {
        match self {
            Self::ParameterHandler(handler) => Some(*handler),
            _ => None,
        }
    }

    pub fn result_set_handler(&self) -> Option<&dyn ResultSetHandler> {
        match self {
            Self::ResultSetHandler(handler) => Some(*handler),
            _ => None,
        }
    }
}

impl fmt::Display for InvocationTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

impl fmt::Debug for InvocationTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.statement_handler() {
            Some(handler) => f
                .debug_tuple("StatementHandler")
                .field(&handler.mapped_statement().id())
                .finish(),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// An intercepted call in flight.
pub struct Invocation<'a> {
    target: InvocationTarget<'a>,
    method: &'static str,
    args: Vec<ArgValue>,
    proceed: Box<dyn FnMut() -> Result<Outcome> + 'a>,
}

impl<'a> Invocation<'a> {
    pub fn new<F>(target: InvocationTarget<'a>, method: &'static str, args: Vec<ArgValue>, proceed: F) -> Self
    where
        F: FnMut() -> Result<Outcome> + 'a,
    {
        Self {
            target,
            method,
            args,
            proceed: Box::new(proceed),
        }
    }

    pub fn target(&self) -> InvocationTarget<'a> {
        self.target
    }

    pub fn kind(&self) -> TargetKind {
        self.target.kind()
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// Run the next layer with the original arguments. May be called more than once.
    pub fn proceed(&mut self) -> Result<Outcome> {
        (self.proceed)()
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
