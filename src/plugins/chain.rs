use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use log::debug;

use super::wrap::{ExecutorPlugin, ParameterHandlerPlugin, ResultSetHandlerPlugin, StatementHandlerPlugin};
use super::{Interceptor, Invocation, Outcome, TargetKind};
use crate::core::{Error, PluginError, Result};
use crate::executor::{Executor, ParameterHandler, ResultSetHandler, StatementHandler};

/// An interceptor together with its validated signature map.
pub struct RegisteredInterceptor {
    interceptor: Arc<dyn Interceptor>,
    signatures: BTreeMap<TargetKind, BTreeSet<&'static str>>,
}

impl RegisteredInterceptor {
    /// Validate the declared signatures. Every method must exist on its target.
    pub fn new(interceptor: Arc<dyn Interceptor>) -> Result<Self> {
        let declared = interceptor.signatures();
        if declared.is_empty() {
            return Err(PluginError::Configuration {
                interceptor: interceptor.name().to_string(),
                reason: "no signatures declared".to_string(),
            }
            .into());
        }

        let mut signatures: BTreeMap<TargetKind, BTreeSet<&'static str>> = BTreeMap::new();
        for signature in declared {
            if !signature.target.methods().contains(&signature.method) {
                return Err(PluginError::Configuration {
                    interceptor: interceptor.name().to_string(),
                    reason: format!(
                        "could not find method '{}' on {}",
                        signature.method, signature.target
                    ),
                }
                .into());
            }
            signatures
                .entry(signature.target)
                .or_default()
                .insert(signature.method);
        }

        Ok(Self {
            interceptor,
            signatures,
        })
    }

    pub fn name(&self) -> &str {
        self.interceptor.name()
    }

    /// Whether any method of `target` is declared.
    pub fn declares(&self, target: TargetKind) -> bool {
        self.signatures.contains_key(&target)
    }

    pub fn intercepts(&self, target: TargetKind, method: &str) -> bool {
        self.signatures
            .get(&target)
            .is_some_and(|methods| methods.contains(method))
    }

    /// Run the interceptor and take the expected variant out of its outcome.
    pub(crate) fn invoke<T>(
        &self,
        invocation: Invocation<'_>,
        expected: &'static str,
        extract: impl FnOnce(Outcome) -> std::result::Result<T, Outcome>,
    ) -> Result<T> {
        let (target, method) = (invocation.kind(), invocation.method());
        let outcome = self.interceptor.intercept(invocation)?;
        extract(outcome).map_err(|other| {
            Error::from(PluginError::UnexpectedOutcome {
                interceptor: self.name().to_string(),
                target: target.name(),
                method,
                expected,
                found: other.kind(),
            })
        })
    }
}

impl fmt::Debug for RegisteredInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredInterceptor")
            .field("name", &self.name())
            .field("signatures", &self.signatures)
            .finish()
    }
}

/// Interceptors in registration order.
#[derive(Debug, Default, Clone)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<RegisteredInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append. A rejected interceptor leaves the chain unchanged.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> Result<()> {
        let registered = RegisteredInterceptor::new(interceptor)?;
        debug!("Registered interceptor: {}", registered.name());
        self.interceptors.push(Arc::new(registered));
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    fn interested(&self, target: TargetKind) -> impl Iterator<Item = &Arc<RegisteredInterceptor>> {
        self.interceptors.iter().filter(move |i| i.declares(target))
    }

    pub fn wrap_executor(&self, target: Box<dyn Executor>) -> Box<dyn Executor> {
        self.interested(TargetKind::Executor)
            .fold(target, |inner, plugin| -> Box<dyn Executor> {
                Box::new(ExecutorPlugin::new(inner, Arc::clone(plugin)))
            })
    }

    pub fn wrap_statement_handler(&self, target: Box<dyn StatementHandler>) -> Box<dyn StatementHandler> {
        self.interested(TargetKind::StatementHandler)
            .fold(target, |inner, plugin| -> Box<dyn StatementHandler> {
                Box::new(StatementHandlerPlugin::new(inner, Arc::clone(plugin)))
            })
    }

    pub fn wrap_parameter_handler(&self, target: Box<dyn ParameterHandler>) -> Box<dyn ParameterHandler> {
        self.interested(TargetKind::ParameterHandler)
            .fold(target, |inner, plugin| -> Box<dyn ParameterHandler> {
                Box::new(ParameterHandlerPlugin::new(inner, Arc::clone(plugin)))
            })
    }

    pub fn wrap_result_set_handler(&self, target: Box<dyn ResultSetHandler>) -> Box<dyn ResultSetHandler> {
        self.interested(TargetKind::ResultSetHandler)
            .fold(target, |inner, plugin| -> Box<dyn ResultSetHandler> {
                Box::new(ResultSetHandlerPlugin::new(inner, Arc::clone(plugin)))
            })
    }
}
