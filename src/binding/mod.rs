//! Mapper interfaces bound to mapped statements.
//!
//! A mapper is a plain type implementing [`Mapper`]: it names a namespace,
//! declares its methods, and wraps a [`MapperProxy`] in a typed adapter.
//! Each declared method `m` runs the statement `<NAMESPACE>.m`.
//!
//! ```ignore
//! pub struct UserMapper;
//!
//! impl Mapper for UserMapper {
//!     const NAMESPACE: &'static str = "UserMapper";
//!     type Instance<'s> = Users<'s>;
//!
//!     fn methods() -> Vec<MethodSignature> {
//!         vec![MethodSignature::new("findUserById", ReturnShape::One).param("id")]
//!     }
//!
//!     fn instance(proxy: MapperProxy<'_>) -> Users<'_> {
//!         Users(proxy)
//!     }
//! }
//!
//! pub struct Users<'s>(MapperProxy<'s>);
//!
//! impl Users<'_> {
//!     pub fn find_user_by_id(&self, id: i64) -> Result<Option<Row>> {
//!         self.0.invoke("findUserById", &[id.into()])?.into_one()
//!     }
//! }
//! ```

mod method;
mod params;
mod proxy;
mod registry;
mod signature;

pub use method::{CommandKind, MapperMethod, MapperResult, SqlCommand};
pub use params::ParamNameResolver;
pub use proxy::MapperProxy;
pub use registry::{MapperProxyFactory, MapperRegistry};
pub use signature::{Arg, MethodSignature, ParamSpec, ReturnShape};

/// A data-access interface whose methods are bound to mapped statements.
pub trait Mapper: 'static {
    /// Statement id prefix of every method.
    const NAMESPACE: &'static str;

    /// Typed adapter handed out by `get_mapper`.
    type Instance<'s>;

    /// Declared methods, in any order. Names must be unique.
    fn methods() -> Vec<MethodSignature>;

    fn instance(proxy: MapperProxy<'_>) -> Self::Instance<'_>;
}
