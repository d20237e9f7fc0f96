use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use super::{Arg, MapperMethod, MapperProxyFactory, MapperResult};
use crate::core::{BindingError, Result};
use crate::session::SqlSession;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Dispatch table behind a mapper instance.
///
/// Every call goes through [`invoke`](Self::invoke). Methods are resolved on
/// first use and cached for the lifetime of the proxy; identity, hashing and
/// formatting are answered by the proxy itself.
pub struct MapperProxy<'s> {
    session: &'s dyn SqlSession,
    factory: Arc<MapperProxyFactory>,
    method_cache: RefCell<HashMap<&'static str, Rc<MapperMethod>>>,
    instance_id: u64,
}

impl<'s> MapperProxy<'s> {
    pub(crate) fn new(session: &'s dyn SqlSession, factory: Arc<MapperProxyFactory>) -> Self {
        Self {
            session,
            factory,
            method_cache: RefCell::new(HashMap::new()),
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.factory.namespace()
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn session(&self) -> &'s dyn SqlSession {
        self.session
    }

    /// Call a declared method.
    pub fn invoke(&self, method: &str, args: &[Arg]) -> Result<MapperResult> {
        let mapper_method = self.cached_mapper_method(method)?;
        trace!("{}.{} invoked with {} argument(s)", self.namespace(), method, args.len());
        mapper_method.execute(self.session, args)
    }

    /// The resolved method, from the cache when already resolved.
    pub fn cached_mapper_method(&self, method: &str) -> Result<Rc<MapperMethod>> {
        if let Some(cached) = self.method_cache.borrow().get(method) {
            return Ok(Rc::clone(cached));
        }

        let signature = self
            .factory
            .signature(method)
            .ok_or_else(|| BindingError::MethodNotFound {
                mapper: self.namespace().to_string(),
                method: method.to_string(),
            })?;
        let configuration = self.session.configuration();
        let resolved = Rc::new(MapperMethod::resolve(
            self.namespace(),
            signature,
            configuration.statements(),
        )?);

        self.method_cache
            .borrow_mut()
            .insert(signature.name, Rc::clone(&resolved));
        Ok(resolved)
    }

    /// Number of methods resolved so far.
    pub fn cached_methods(&self) -> usize {
        self.method_cache.borrow().len()
    }
}

impl PartialEq for MapperProxy<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id
    }
}

impl Eq for MapperProxy<'_> {}

impl Hash for MapperProxy<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instance_id.hash(state);
    }
}

impl fmt::Debug for MapperProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperProxy")
            .field("mapper", &self.namespace())
            .field("instance", &self.instance_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MapperProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.namespace(), self.instance_id)
    }
}
