use lazy_static::lazy_static;
use regex::Regex;

use super::ParameterMapping;
use crate::core::{Error, Result};

lazy_static! {
    // #{property} or #{property,option=...}
    static ref PLACEHOLDER: Regex = Regex::new(r"#\{([^{}]*)\}").unwrap();
}

/// Compile a `#{property}` template into positional SQL plus its parameter mappings.
///
/// Options after the first comma (`#{id,jdbcType=INTEGER}`) are accepted and ignored.
pub fn compile(template: &str) -> Result<(String, Vec<ParameterMapping>)> {
    let mut sql = String::with_capacity(template.len());
    let mut mappings = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let body = caps.get(1).map_or("", |m| m.as_str());
        let property = body.split(',').next().unwrap_or_default().trim();
        if property.is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "empty parameter placeholder in '{}'",
                template
            )));
        }

        sql.push_str(&template[last..whole.start()]);
        sql.push('?');
        mappings.push(ParameterMapping::new(property));
        last = whole.end();
    }
    sql.push_str(&template[last..]);

    if sql.contains("#{") {
        return Err(Error::InvalidConfiguration(format!(
            "unterminated parameter placeholder in '{}'",
            template
        )));
    }

    Ok((sql, mappings))
}
