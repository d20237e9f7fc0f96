use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Value;

/// A result row: values addressed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs, mostly useful in tests and drivers.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Look a column up by name; exact match first, then ASCII case-insensitive.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(column)))?;
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.iter().map(|(c, v)| format!("{}={}", c, v)).collect();
        write!(f, "{{{}}}", cells.join(", "))
    }
}

/// Paging bounds applied while consuming a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowBounds {
    offset: usize,
    limit: usize,
}

impl RowBounds {
    pub const NO_ROW_OFFSET: usize = 0;
    pub const NO_ROW_LIMIT: usize = usize::MAX;
    pub const DEFAULT: RowBounds = RowBounds {
        offset: Self::NO_ROW_OFFSET,
        limit: Self::NO_ROW_LIMIT,
    };

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The parameter object handed to a statement.
///
/// A scalar binds to every placeholder of its statement; a record is looked
/// up by property name, with dotted paths (`user.name`) walking nested records.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Parameter {
    #[default]
    Null,
    Value(Value),
    Record(BTreeMap<String, Parameter>),
}

impl Parameter {
    /// An empty record, to be filled with [`Parameter::with`].
    pub fn record() -> Self {
        Self::Record(BTreeMap::new())
    }

    /// Add (or replace) a property. A non-record parameter becomes a record.
    pub fn with(self, name: impl Into<String>, value: impl Into<Parameter>) -> Self {
        let mut fields = match self {
            Self::Record(fields) => fields,
            _ => BTreeMap::new(),
        };
        fields.insert(name.into(), value.into());
        Self::Record(fields)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Parameter>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Resolve a dotted property path against nested records.
    pub fn resolve(&self, path: &str) -> Option<&Parameter> {
        path.split('.').try_fold(self, |current, segment| match current {
            Self::Record(fields) => fields.get(segment),
            _ => None,
        })
    }

    /// Top-level property names of a record; empty for scalars.
    pub fn property_names(&self) -> Vec<&str> {
        match self {
            Self::Record(fields) => fields.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Value(v) => write!(f, "{}", v),
            Self::Record(fields) => {
                let cells: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", cells.join(", "))
            }
        }
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<BTreeMap<String, Parameter>> for Parameter {
    fn from(fields: BTreeMap<String, Parameter>) -> Self {
        Self::Record(fields)
    }
}

macro_rules! scalar_parameter {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Parameter {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

scalar_parameter!(i64, i32, f64, bool, String, &str);
