use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::sql_source;
use crate::core::{Error, Parameter, Result};

/// Declared type of a mapped statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlCommandType {
    Unknown,
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for SqlCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Binds one positional placeholder to a property of the parameter object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMapping {
    property: String,
}

impl ParameterMapping {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

/// Executable SQL for one call: `?` placeholders plus their mappings, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSql {
    sql: String,
    parameter_mappings: Vec<ParameterMapping>,
}

impl BoundSql {
    pub fn new(sql: impl Into<String>, parameter_mappings: Vec<ParameterMapping>) -> Self {
        Self {
            sql: sql.into(),
            parameter_mappings,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_mappings(&self) -> &[ParameterMapping] {
        &self.parameter_mappings
    }
}

/// Compiled metadata for one named statement.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStatement {
    id: String,
    command_type: SqlCommandType,
    sql: String,
    parameter_mappings: Vec<ParameterMapping>,
    timeout: Option<Duration>,
    fetch_size: Option<u32>,
}

impl MappedStatement {
    /// Descriptor from already-compiled SQL, as supplied by an external builder.
    pub fn new(
        id: impl Into<String>,
        command_type: SqlCommandType,
        sql: impl Into<String>,
        parameter_mappings: Vec<ParameterMapping>,
    ) -> Self {
        Self {
            id: id.into(),
            command_type,
            sql: sql.into(),
            parameter_mappings,
            timeout: None,
            fetch_size: None,
        }
    }

    /// Start a descriptor from a `#{property}` template.
    pub fn builder(
        id: impl Into<String>,
        command_type: SqlCommandType,
        template: impl Into<String>,
    ) -> MappedStatementBuilder {
        MappedStatementBuilder {
            id: id.into(),
            command_type,
            template: template.into(),
            timeout: None,
            fetch_size: None,
        }
    }

    pub fn select(id: impl Into<String>, template: &str) -> Result<Self> {
        Self::builder(id, SqlCommandType::Select, template).build()
    }

    pub fn insert(id: impl Into<String>, template: &str) -> Result<Self> {
        Self::builder(id, SqlCommandType::Insert, template).build()
    }

    pub fn update(id: impl Into<String>, template: &str) -> Result<Self> {
        Self::builder(id, SqlCommandType::Update, template).build()
    }

    pub fn delete(id: impl Into<String>, template: &str) -> Result<Self> {
        Self::builder(id, SqlCommandType::Delete, template).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Everything before the last `.` of the id.
    pub fn namespace(&self) -> &str {
        self.id.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    pub fn command_type(&self) -> SqlCommandType {
        self.command_type
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    /// Static SQL: every call binds the same text and mappings.
    pub fn bound_sql(&self, _parameter: &Parameter) -> BoundSql {
        BoundSql::new(self.sql.clone(), self.parameter_mappings.clone())
    }
}

pub struct MappedStatementBuilder {
    id: String,
    command_type: SqlCommandType,
    template: String,
    timeout: Option<Duration>,
    fetch_size: Option<u32>,
}

impl MappedStatementBuilder {
    /// Query timeout applied when the statement handle is prepared
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn fetch_size(mut self, rows: u32) -> Self {
        self.fetch_size = Some(rows);
        self
    }

    pub fn build(self) -> Result<MappedStatement> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfiguration("statement id must not be empty".into()));
        }
        let (sql, parameter_mappings) = sql_source::compile(&self.template)?;
        Ok(MappedStatement {
            id: self.id,
            command_type: self.command_type,
            sql,
            parameter_mappings,
            timeout: self.timeout,
            fetch_size: self.fetch_size,
        })
    }
}
