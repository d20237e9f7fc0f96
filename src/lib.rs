// ============================================================================
// sqlmapper Library
// ============================================================================
//
// SQL mapping core: mapper interfaces bound to mapped statements, an
// interceptor chain around the execution engine, and simple / reuse / batch
// executors over a pluggable driver seam.
//
// ```ignore
// let mut configuration = Configuration::new(Settings::default())
//     .environment(Environment::new("dev", Arc::new(MemoryDatabase::new())));
// configuration.add_mapped_statement(MappedStatement::select(
//     "UserMapper.findUserById",
//     "select id, name from user where id = #{id}",
// )?)?;
// configuration.add_mapper::<UserMapper>()?;
//
// let factory = SqlSessionFactory::new(configuration)?;
// let session = factory.open_session()?;
// let user = session.get_mapper::<UserMapper>()?.find_user_by_id(7)?;
// ```
//
// ============================================================================

pub mod binding;
pub mod config;
pub mod connection;
pub mod core;
pub mod executor;
pub mod mapping;
pub mod plugins;
pub mod result;
pub mod session;
pub mod transaction;

// Re-export main types for convenience
pub use core::{BindingError, Error, Parameter, PluginError, RegistrationError, Result, Row, RowBounds, Value};
pub use result::ResultSet;

pub use binding::{Arg, Mapper, MapperProxy, MapperResult, MethodSignature, ReturnShape};
pub use config::{Configuration, Environment, Settings};
pub use executor::{BatchResult, Cursor, ExecutorType, ResultContext, ResultHandler};
pub use mapping::{MappedStatement, SqlCommandType};
pub use plugins::{Interceptor, Invocation, InvocationTarget, Outcome, Signature, TargetKind};
pub use session::{DefaultSqlSession, SqlSession, SqlSessionFactory};
