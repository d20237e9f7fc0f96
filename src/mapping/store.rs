use std::collections::HashMap;
use std::sync::Arc;

use super::MappedStatement;
use crate::core::{BindingError, RegistrationError, Result};

/// Statement descriptors keyed by their fully-qualified id.
#[derive(Debug, Default, Clone)]
pub struct StatementStore {
    statements: HashMap<String, Arc<MappedStatement>>,
}

impl StatementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Ids are unique; a second registration is rejected.
    pub fn add(&mut self, statement: MappedStatement) -> Result<Arc<MappedStatement>> {
        if self.statements.contains_key(statement.id()) {
            return Err(RegistrationError::DuplicateStatement {
                id: statement.id().to_string(),
            }
            .into());
        }
        let statement = Arc::new(statement);
        self.statements
            .insert(statement.id().to_string(), Arc::clone(&statement));
        Ok(statement)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<MappedStatement>> {
        self.statements.get(id)
    }

    /// Like [`get`](Self::get), but a miss is a binding error.
    pub fn statement(&self, id: &str) -> std::result::Result<Arc<MappedStatement>, BindingError> {
        self.statements
            .get(id)
            .cloned()
            .ok_or_else(|| BindingError::StatementNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.statements.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.statements.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
