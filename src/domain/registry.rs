//! Lookup of insight generator kinds by namespace.
//!
//! The registry maps `namespace -> kind -> registration`. Built-in kinds live
//! in [`DEFAULT_NAMESPACE`]; callers may register further kinds under any
//! namespace before creating generators.

use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::generators::{
    allocations, autocorrelation, confusion, correlation, performance, prediction,
    returns_series, rolling_price, rolling_returns,
};
use crate::domain::options::Options;
use std::collections::BTreeMap;

pub const DEFAULT_NAMESPACE: &str = "insights";

/// Builds a generator from an instance name and caller overrides.
pub type GeneratorFactory =
    fn(String, Options) -> Result<Box<dyn InsightGenerator>, InsightError>;

#[derive(Clone, Copy)]
struct Registration {
    defaults: fn() -> Options,
    factory: GeneratorFactory,
}

#[derive(Clone, Default)]
pub struct Registry {
    namespaces: BTreeMap<String, BTreeMap<String, Registration>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in kind under [`DEFAULT_NAMESPACE`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, fn() -> Options, GeneratorFactory); 10] = [
            (confusion::KIND, confusion::defaults, confusion::create),
            (prediction::KIND, prediction::defaults, prediction::create),
            (rolling_returns::KIND, rolling_returns::defaults, rolling_returns::create),
            (returns_series::KIND, returns_series::defaults, returns_series::create),
            (rolling_price::KIND, rolling_price::defaults, rolling_price::create),
            (performance::KIND, performance::defaults, performance::create),
            (autocorrelation::KIND, autocorrelation::defaults, autocorrelation::create),
            (
                autocorrelation::MACF_KIND,
                autocorrelation::macf_defaults,
                autocorrelation::create_macf,
            ),
            (correlation::KIND, correlation::defaults, correlation::create),
            (allocations::KIND, allocations::defaults, allocations::create),
        ];
        for (kind, defaults, factory) in builtins {
            registry.register(DEFAULT_NAMESPACE, kind, defaults, factory);
        }
        registry
    }

    /// Adds or replaces a kind.
    pub fn register(
        &mut self,
        namespace: &str,
        kind: &str,
        defaults: fn() -> Options,
        factory: GeneratorFactory,
    ) {
        let replaced = self
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(kind.to_string(), Registration { defaults, factory });
        if replaced.is_some() {
            tracing::debug!(namespace, kind, "replaced registered generator kind");
        }
    }

    fn lookup(&self, kind: &str, namespace: Option<&str>) -> Result<&Registration, InsightError> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let kinds = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| InsightError::UnknownNamespace {
                namespace: namespace.to_string(),
            })?;
        kinds.get(kind).ok_or_else(|| InsightError::Lookup {
            namespace: namespace.to_string(),
            kind: kind.to_string(),
        })
    }

    /// Creates a generator of `kind`.
    ///
    /// The instance name defaults to the kind, the namespace to
    /// [`DEFAULT_NAMESPACE`] and the options to none.
    pub fn create(
        &self,
        kind: &str,
        name: Option<&str>,
        namespace: Option<&str>,
        options: Option<Options>,
    ) -> Result<Box<dyn InsightGenerator>, InsightError> {
        let registration = self.lookup(kind, namespace)?;
        let name = name.unwrap_or(kind).to_string();
        tracing::debug!(kind, name = %name, "creating insight generator");
        (registration.factory)(name, options.unwrap_or_default())
    }

    /// Declared default options of `kind`.
    pub fn describe(&self, kind: &str, namespace: Option<&str>) -> Result<Options, InsightError> {
        Ok((self.lookup(kind, namespace)?.defaults)())
    }

    /// Registered kinds of a namespace, sorted.
    pub fn kinds(&self, namespace: Option<&str>) -> Result<Vec<&str>, InsightError> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.namespaces
            .get(namespace)
            .map(|kinds| kinds.keys().map(String::as_str).collect())
            .ok_or_else(|| InsightError::UnknownNamespace {
                namespace: namespace.to_string(),
            })
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.namespaces.keys().map(String::as_str).collect()
    }
}
