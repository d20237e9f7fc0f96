use std::collections::BTreeMap;

use super::{Arg, ParamSpec};
use crate::core::{BindingError, Parameter, RowBounds};

const GENERIC_NAME_PREFIX: &str = "param";

/// Turns the actual arguments of a call into one parameter object.
///
/// - no value arguments: [`Parameter::Null`]
/// - one unnamed value argument: passed through as is
/// - otherwise: a record holding every declared name plus `param1..paramN`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamNameResolver {
    method_id: String,
    specs: Vec<ParamSpec>,
    single_unnamed: bool,
}

impl ParamNameResolver {
    pub fn new(method_id: &str, specs: &[ParamSpec]) -> Result<Self, BindingError> {
        let bounds = specs.iter().filter(|s| **s == ParamSpec::RowBounds).count();
        if bounds > 1 {
            return Err(BindingError::Arguments {
                id: method_id.to_string(),
                reason: format!("declares {} row-bounds parameters, at most one is allowed", bounds),
            });
        }

        let values = specs.len() - bounds;
        let unnamed = specs.iter().filter(|s| **s == ParamSpec::Unnamed).count();
        if values > 1 && unnamed > 0 {
            return Err(BindingError::AmbiguousParameterBinding {
                id: method_id.to_string(),
                count: unnamed,
            });
        }

        Ok(Self {
            method_id: method_id.to_string(),
            specs: specs.to_vec(),
            single_unnamed: unnamed == 1,
        })
    }

    /// Declared names in argument order, row bounds excluded.
    pub fn names(&self) -> Vec<&'static str> {
        self.specs
            .iter()
            .filter_map(|s| match s {
                ParamSpec::Named(name) => Some(*name),
                _ => None,
            })
            .collect()
    }

    pub fn resolve(&self, args: &[Arg]) -> Result<(Parameter, RowBounds), BindingError> {
        if args.len() != self.specs.len() {
            return Err(self.error(format!(
                "expected {} argument(s), got {}",
                self.specs.len(),
                args.len()
            )));
        }

        let mut bounds = RowBounds::DEFAULT;
        let mut values: Vec<(Option<&'static str>, &Parameter)> = Vec::with_capacity(args.len());
        for (position, (spec, arg)) in self.specs.iter().zip(args).enumerate() {
            match (spec, arg) {
                (ParamSpec::RowBounds, Arg::Bounds(b)) => bounds = *b,
                (ParamSpec::Named(name), Arg::Param(p)) => values.push((Some(*name), p)),
                (ParamSpec::Unnamed, Arg::Param(p)) => values.push((None, p)),
                (expected, actual) => {
                    return Err(self.error(format!(
                        "argument {} should be {}, got {}",
                        position + 1,
                        match expected {
                            ParamSpec::RowBounds => "row bounds",
                            _ => "a parameter",
                        },
                        actual.kind()
                    )));
                }
            }
        }

        let parameter = match values.as_slice() {
            [] => Parameter::Null,
            [(None, single)] if self.single_unnamed => (*single).clone(),
            _ => {
                let mut record = BTreeMap::new();
                for (name, value) in &values {
                    if let Some(name) = name {
                        record.insert(name.to_string(), (*value).clone());
                    }
                }
                for (i, (_, value)) in values.iter().enumerate() {
                    let generic = format!("{}{}", GENERIC_NAME_PREFIX, i + 1);
                    // an explicit name wins over the generic alias
                    record.entry(generic).or_insert_with(|| (*value).clone());
                }
                Parameter::Record(record)
            }
        };

        Ok((parameter, bounds))
    }

    fn error(&self, reason: String) -> BindingError {
        BindingError::Arguments {
            id: self.method_id.clone(),
            reason,
        }
    }
}
