//! The configuration hub: statements, mappers, interceptors and settings.
//!
//! Built once, then frozen into an `Arc` by [`SqlSessionFactory`](crate::session::SqlSessionFactory)
//! and shared read-only by every session, executor and handler.

mod settings;

use std::fmt;
use std::sync::Arc;

use crate::binding::{Mapper, MapperRegistry};
use crate::connection::DataSource;
use crate::core::{Parameter, Result, RowBounds};
use crate::executor::{
    BatchExecutor, DefaultParameterHandler, DefaultResultSetHandler, Executor, ExecutorType, ParameterHandler,
    PreparedStatementHandler, ResultSetHandler, ReuseExecutor, SimpleExecutor, StatementHandler,
};
use crate::mapping::{BoundSql, MappedStatement, StatementStore};
use crate::plugins::{Interceptor, InterceptorChain};
use crate::session::SqlSession;
use crate::transaction::Transaction;

pub use settings::Settings;

/// Where sessions get their connections from.
#[derive(Clone)]
pub struct Environment {
    id: String,
    data_source: Arc<dyn DataSource>,
}

impl Environment {
    pub fn new(id: impl Into<String>, data_source: Arc<dyn DataSource>) -> Self {
        Self {
            id: id.into(),
            data_source,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").field("id", &self.id).finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct Configuration {
    settings: Settings,
    environment: Option<Environment>,
    statements: StatementStore,
    mapper_registry: MapperRegistry,
    interceptor_chain: InterceptorChain,
}

impl Configuration {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Set the environment
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = Some(environment);
    }

    pub fn get_environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn add_mapped_statement(&mut self, statement: MappedStatement) -> Result<Arc<MappedStatement>> {
        self.statements.add(statement)
    }

    /// Look a statement up by id; a miss is `BindingError::StatementNotFound`.
    pub fn mapped_statement(&self, id: &str) -> Result<Arc<MappedStatement>> {
        Ok(self.statements.statement(id)?)
    }

    pub fn has_statement(&self, id: &str) -> bool {
        self.statements.contains(id)
    }

    pub fn statements(&self) -> &StatementStore {
        &self.statements
    }

    // ------------------------------------------------------------------
    // Mappers
    // ------------------------------------------------------------------

    /// Register a mapper; every method must resolve against the statements
    /// already added.
    pub fn add_mapper<M: Mapper>(&mut self) -> Result<()> {
        self.mapper_registry.add_mapper::<M>(&self.statements)
    }

    pub fn has_mapper<M: Mapper>(&self) -> bool {
        self.mapper_registry.has_mapper::<M>()
    }

    pub fn get_mapper<'s, M: Mapper>(&self, session: &'s dyn SqlSession) -> Result<M::Instance<'s>> {
        self.mapper_registry.get_mapper::<M>(session)
    }

    pub fn mapper_registry(&self) -> &MapperRegistry {
        &self.mapper_registry
    }

    // ------------------------------------------------------------------
    // Interceptors
    // ------------------------------------------------------------------

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> Result<()> {
        self.interceptor_chain.add_interceptor(interceptor)
    }

    pub fn interceptor_chain(&self) -> &InterceptorChain {
        &self.interceptor_chain
    }

    // ------------------------------------------------------------------
    // Factories; every product goes through the interceptor chain
    // ------------------------------------------------------------------

    pub fn new_executor(self: &Arc<Self>, transaction: Box<dyn Transaction>, executor_type: ExecutorType) -> Box<dyn Executor> {
        let executor: Box<dyn Executor> = match executor_type {
            ExecutorType::Simple => Box::new(SimpleExecutor::new(Arc::clone(self), transaction)),
            ExecutorType::Reuse => Box::new(ReuseExecutor::new(Arc::clone(self), transaction)),
            ExecutorType::Batch => Box::new(BatchExecutor::new(Arc::clone(self), transaction)),
        };
        self.interceptor_chain.wrap_executor(executor)
    }

    pub fn new_statement_handler(
        self: &Arc<Self>,
        statement: Arc<MappedStatement>,
        parameter: Parameter,
        bounds: RowBounds,
    ) -> Box<dyn StatementHandler> {
        let handler = PreparedStatementHandler::new(Arc::clone(self), statement, parameter, bounds);
        self.interceptor_chain.wrap_statement_handler(Box::new(handler))
    }

    pub fn new_parameter_handler(
        &self,
        statement: Arc<MappedStatement>,
        parameter: Parameter,
        bound_sql: BoundSql,
    ) -> Box<dyn ParameterHandler> {
        let handler = DefaultParameterHandler::new(statement, parameter, bound_sql);
        self.interceptor_chain.wrap_parameter_handler(Box::new(handler))
    }

    pub fn new_result_set_handler(&self, statement: Arc<MappedStatement>, bounds: RowBounds) -> Box<dyn ResultSetHandler> {
        let handler = DefaultResultSetHandler::new(statement, bounds);
        self.interceptor_chain.wrap_result_set_handler(Box::new(handler))
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("settings", &self.settings)
            .field("environment", &self.environment)
            .field("statements", &self.statements.len())
            .field("mappers", &self.mapper_registry.mappers())
            .field("interceptors", &self.interceptor_chain.names())
            .finish()
    }
}
