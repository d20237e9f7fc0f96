use std::sync::Arc;

use log::debug;

use crate::connection::Statement;
use crate::core::{Error, Parameter, Result, Value};
use crate::mapping::{BoundSql, MappedStatement, ParameterMapping};

/// Binds a parameter object to the placeholders of a prepared statement.
pub trait ParameterHandler: Send {
    fn parameter_object(&self) -> &Parameter;

    fn set_parameters(&self, statement: &mut dyn Statement) -> Result<()>;
}

pub struct DefaultParameterHandler {
    mapped_statement: Arc<MappedStatement>,
    parameter: Parameter,
    bound_sql: BoundSql,
}

impl DefaultParameterHandler {
    pub fn new(mapped_statement: Arc<MappedStatement>, parameter: Parameter, bound_sql: BoundSql) -> Self {
        Self {
            mapped_statement,
            parameter,
            bound_sql,
        }
    }

    fn binding_error(&self, index: usize, mapping: &ParameterMapping, reason: String) -> Error {
        Error::ParameterBinding {
            statement: self.mapped_statement.id().to_string(),
            index,
            property: mapping.property().to_string(),
            reason,
        }
    }

    /// Value for one mapping. Scalars bind to every placeholder; records are
    /// looked up by property path.
    fn value_for(&self, index: usize, mapping: &ParameterMapping) -> Result<Value> {
        match &self.parameter {
            Parameter::Null => Ok(Value::Null),
            Parameter::Value(value) => Ok(value.clone()),
            Parameter::Record(_) => match self.parameter.resolve(mapping.property()) {
                Some(Parameter::Value(value)) => Ok(value.clone()),
                Some(Parameter::Null) => Ok(Value::Null),
                Some(Parameter::Record(_)) => Err(self.binding_error(
                    index,
                    mapping,
                    "property is a record, not a value".to_string(),
                )),
                None => Err(self.binding_error(
                    index,
                    mapping,
                    format!(
                        "no such property; available parameters are [{}]",
                        self.parameter.property_names().join(", ")
                    ),
                )),
            },
        }
    }
}

impl ParameterHandler for DefaultParameterHandler {
    fn parameter_object(&self) -> &Parameter {
        &self.parameter
    }

    fn set_parameters(&self, statement: &mut dyn Statement) -> Result<()> {
        let mut logged = Vec::with_capacity(self.bound_sql.parameter_mappings().len());
        for (i, mapping) in self.bound_sql.parameter_mappings().iter().enumerate() {
            let index = i + 1;
            let value = self.value_for(index, mapping)?;
            statement
                .bind(index, &value)
                .map_err(|e| self.binding_error(index, mapping, e.to_string()))?;
            logged.push(format!("{}({})", value, value.type_name()));
        }
        debug!("==> Parameters: {}", logged.join(", "));
        Ok(())
    }
}
