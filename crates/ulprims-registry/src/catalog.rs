use std::collections::BTreeMap;
use std::sync::Arc;

use ulprims_binding::{LoopbackBinding, SharedBinding, LOOPBACK};

/// Creates a fresh binding instance for one agent run.
pub type BindingFactory = Arc<dyn Fn() -> SharedBinding + Send + Sync>;

/// Statically declared name → factory map of available bindings.
#[derive(Clone, Default)]
pub struct BindingCatalog {
    factories: BTreeMap<String, BindingFactory>,
}

impl BindingCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the bindings shipped with this crate.
    pub fn builtin() -> Self {
        Self::new().with(LOOPBACK, || Arc::new(LoopbackBinding::new()) as SharedBinding)
    }

    /// Register a factory, replacing any existing entry with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> SharedBinding + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builder form of [`BindingCatalog::register`].
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> SharedBinding + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Instantiate the binding registered under `name`.
    pub fn create(&self, name: &str) -> Option<SharedBinding> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for BindingCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingCatalog")
            .field("names", &self.names())
            .finish()
    }
}
