use std::any::TypeId;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::debug;

use super::{Mapper, MapperMethod, MapperProxy, MethodSignature};
use crate::core::{Error, RegistrationError, Result};
use crate::mapping::StatementStore;
use crate::session::SqlSession;

/// Produces proxies for one registered mapper.
#[derive(Debug)]
pub struct MapperProxyFactory {
    namespace: &'static str,
    methods: HashMap<&'static str, MethodSignature>,
}

impl MapperProxyFactory {
    fn new(namespace: &'static str, methods: Vec<MethodSignature>) -> Self {
        Self {
            namespace,
            methods: methods.into_iter().map(|m| (m.name, m)).collect(),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn signature(&self, method: &str) -> Option<&MethodSignature> {
        self.methods.get(method)
    }

    /// A proxy bound to `session`. Fails if the session is closed.
    pub fn new_instance<'s>(self: &Arc<Self>, session: &'s dyn SqlSession) -> Result<MapperProxy<'s>> {
        if session.is_closed() {
            return Err(Error::ExecutorClosed);
        }
        Ok(MapperProxy::new(session, Arc::clone(self)))
    }
}

/// Known mappers, keyed by type.
#[derive(Default)]
pub struct MapperRegistry {
    known: HashMap<TypeId, Arc<MapperProxyFactory>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `M`, resolving every declared method against `store`.
    ///
    /// Nothing is registered unless every method resolves.
    pub fn add_mapper<M: Mapper>(&mut self, store: &StatementStore) -> Result<()> {
        let namespace = M::NAMESPACE;
        if self.known.contains_key(&TypeId::of::<M>()) || self.known.values().any(|f| f.namespace() == namespace) {
            return Err(RegistrationError::AlreadyRegistered {
                mapper: namespace.to_string(),
            }
            .into());
        }

        let methods = M::methods();
        let mut seen = HashSet::with_capacity(methods.len());
        for signature in &methods {
            if !seen.insert(signature.name) {
                return Err(RegistrationError::DuplicateMethod {
                    mapper: namespace.to_string(),
                    method: signature.name.to_string(),
                }
                .into());
            }
            MapperMethod::resolve(namespace, signature, store).map_err(|source| RegistrationError::Resolution {
                mapper: namespace.to_string(),
                source,
            })?;
        }

        debug!("Registered mapper {} ({} methods)", namespace, methods.len());
        self.known
            .insert(TypeId::of::<M>(), Arc::new(MapperProxyFactory::new(namespace, methods)));
        Ok(())
    }

    pub fn has_mapper<M: Mapper>(&self) -> bool {
        self.known.contains_key(&TypeId::of::<M>())
    }

    pub fn get_mapper<'s, M: Mapper>(&self, session: &'s dyn SqlSession) -> Result<M::Instance<'s>> {
        let factory = self
            .known
            .get(&TypeId::of::<M>())
            .ok_or_else(|| RegistrationError::NotRegistered {
                mapper: M::NAMESPACE.to_string(),
            })?;
        let proxy = factory
            .new_instance(session)
            .map_err(|e| RegistrationError::Instance {
                mapper: M::NAMESPACE.to_string(),
                source: Box::new(e),
            })?;
        Ok(M::instance(proxy))
    }

    /// Namespaces of every registered mapper.
    pub fn mappers(&self) -> BTreeSet<&'static str> {
        self.known.values().map(|f| f.namespace()).collect()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.mappers()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ReturnShape;
    use crate::mapping::MappedStatement;

    struct Users;

    impl Mapper for Users {
        const NAMESPACE: &'static str = "UserMapper";
        type Instance<'s> = MapperProxy<'s>;

        fn methods() -> Vec<MethodSignature> {
            vec![MethodSignature::new("findAll", ReturnShape::Many)]
        }

        fn instance(proxy: MapperProxy<'_>) -> MapperProxy<'_> {
            proxy
        }
    }

    struct Broken;

    impl Mapper for Broken {
        const NAMESPACE: &'static str = "BrokenMapper";
        type Instance<'s> = MapperProxy<'s>;

        fn methods() -> Vec<MethodSignature> {
            vec![
                MethodSignature::new("findAll", ReturnShape::Many),
                MethodSignature::new("findAll", ReturnShape::One),
            ]
        }

        fn instance(proxy: MapperProxy<'_>) -> MapperProxy<'_> {
            proxy
        }
    }

    fn store() -> StatementStore {
        let mut store = StatementStore::new();
        store
            .add(MappedStatement::select("UserMapper.findAll", "select * from user").unwrap())
            .unwrap();
        store
            .add(MappedStatement::select("BrokenMapper.findAll", "select * from user").unwrap())
            .unwrap();
        store
    }

    #[test]
    fn test_duplicate_registration_leaves_registry_unchanged() {
        let store = store();
        let mut registry = MapperRegistry::new();
        registry.add_mapper::<Users>(&store).unwrap();

        let err = registry.add_mapper::<Users>(&store).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.len(), 1);
        assert!(registry.has_mapper::<Users>());
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let mut registry = MapperRegistry::new();
        assert!(matches!(
            registry.add_mapper::<Broken>(&store()),
            Err(Error::Registration(RegistrationError::DuplicateMethod { .. }))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unresolvable_method_fails_eagerly() {
        let mut registry = MapperRegistry::new();
        let err = registry.add_mapper::<Users>(&StatementStore::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::Resolution { .. })
        ));
        assert!(!registry.has_mapper::<Users>());
        assert!(registry.mappers().is_empty());
    }
}
