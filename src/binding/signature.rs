use std::fmt;

use crate::core::{Parameter, RowBounds, Value};

/// How one argument position is passed to the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// Bound under an explicit name (plus the generic `paramN` alias)
    Named(&'static str),
    /// Only allowed as the single value argument of a method
    Unnamed,
    /// Paging bounds, kept out of the parameter object
    RowBounds,
}

/// Declared return type of a mapper method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    /// Affected row count
    Count,
    /// Affected row count > 0
    Flag,
    /// At most one row
    One,
    Many,
    /// Rows keyed by the value of one column
    Map { key: &'static str },
    Cursor,
    /// Results of flushing pending batches
    Batch,
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Count => write!(f, "count"),
            Self::Flag => write!(f, "flag"),
            Self::One => write!(f, "one"),
            Self::Many => write!(f, "many"),
            Self::Map { key } => write!(f, "map({})", key),
            Self::Cursor => write!(f, "cursor"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// Declaration of one mapper method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: &'static str,
    pub params: Vec<ParamSpec>,
    pub returns: ReturnShape,
}

impl MethodSignature {
    pub fn new(name: &'static str, returns: ReturnShape) -> Self {
        Self {
            name,
            params: Vec::new(),
            returns,
        }
    }

    /// A method that flushes pending batch statements instead of running one.
    pub fn flush(name: &'static str) -> Self {
        Self::new(name, ReturnShape::Batch)
    }

    /// Append a named argument
    pub fn param(mut self, name: &'static str) -> Self {
        self.params.push(ParamSpec::Named(name));
        self
    }

    /// Append an unnamed argument
    pub fn unnamed(mut self) -> Self {
        self.params.push(ParamSpec::Unnamed);
        self
    }

    /// Append a row-bounds argument
    pub fn row_bounds(mut self) -> Self {
        self.params.push(ParamSpec::RowBounds);
        self
    }
}

/// One actual argument of a mapper call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Param(Parameter),
    Bounds(RowBounds),
}

impl Arg {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Param(_) => "parameter",
            Self::Bounds(_) => "row bounds",
        }
    }
}

impl From<RowBounds> for Arg {
    fn from(bounds: RowBounds) -> Self {
        Self::Bounds(bounds)
    }
}

macro_rules! param_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::Param(Parameter::from(value))
                }
            }
        )*
    };
}

param_arg!(Parameter, Value, i64, i32, f64, bool, String, &str);
