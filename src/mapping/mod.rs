//! Statement descriptors: what to run for a given statement id.

pub mod sql_source;
mod statement;
mod store;

pub use statement::{BoundSql, MappedStatement, MappedStatementBuilder, ParameterMapping, SqlCommandType};
pub use store::StatementStore;
