use std::collections::BTreeSet;
use std::future::Future;

use futures_util::stream::{FuturesUnordered, StreamExt};
use ulprims_binding::{AgentConfig, BindingError, EventKind, HandlerEvent, SharedBinding};

use crate::catalog::BindingCatalog;
use crate::error::{RegistryError, Result};

/// The active bindings of one agent run, in registration order.
///
/// The set is fixed once built; there is no add/remove while running.
pub struct BindingRegistry {
    bindings: Vec<SharedBinding>,
}

impl BindingRegistry {
    /// Build a registry from already-instantiated bindings.
    pub fn new(bindings: Vec<SharedBinding>) -> Self {
        Self { bindings }
    }

    /// Instantiate the named bindings from `catalog`, in the given order.
    ///
    /// An empty `names` list selects every catalog entry.
    pub fn from_catalog(catalog: &BindingCatalog, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            if catalog.is_empty() {
                return Err(RegistryError::NoBindings);
            }
            let bindings = catalog
                .names()
                .into_iter()
                .filter_map(|name| catalog.create(name))
                .collect();
            return Ok(Self::new(bindings));
        }

        let mut seen = BTreeSet::new();
        let mut bindings = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(RegistryError::DuplicateBinding(name.clone()));
            }
            let binding = catalog
                .create(name)
                .ok_or_else(|| RegistryError::UnknownBinding(name.clone()))?;
            bindings.push(binding);
        }
        Ok(Self::new(bindings))
    }

    /// Start every binding concurrently.
    ///
    /// Waits for all of them; the first failure to complete is returned.
    pub async fn start_all(&self, config: &AgentConfig) -> ulprims_binding::Result<()> {
        let pending: FuturesUnordered<_> = self
            .bindings
            .iter()
            .map(|binding| async move { (binding.name(), binding.start(config).await) })
            .collect();
        drain(pending, "start").await
    }

    /// Stop every binding concurrently, with the same aggregation as
    /// [`BindingRegistry::start_all`].
    pub async fn stop_all(&self) -> ulprims_binding::Result<()> {
        let pending: FuturesUnordered<_> = self
            .bindings
            .iter()
            .map(|binding| async move { (binding.name(), binding.stop().await) })
            .collect();
        drain(pending, "stop").await
    }

    /// Hand `event` to every binding that declared its kind.
    ///
    /// Handlers run one at a time in registration order. The first failure
    /// aborts the fan-out; later bindings are not called.
    pub async fn broadcast(&self, event: &HandlerEvent) -> ulprims_binding::Result<()> {
        let kind = event.kind();
        for binding in self.bindings.iter().filter(|b| b.handles_kind(kind)) {
            tracing::debug!(binding = binding.name(), event = %kind, "dispatching event");
            if let Err(err) = binding.handle(event).await {
                tracing::warn!(binding = binding.name(), event = %kind, error = %err, "event handler failed");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Names of the bindings that declared `kind`, in registration order.
    pub fn handlers_for(&self, kind: EventKind) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| b.handles_kind(kind))
            .map(|b| b.name())
            .collect()
    }

    /// Binding names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

async fn drain<'a, F>(mut pending: FuturesUnordered<F>, action: &str) -> ulprims_binding::Result<()>
where
    F: Future<Output = (&'a str, ulprims_binding::Result<()>)>,
{
    let mut first_error: Option<BindingError> = None;
    while let Some((name, result)) = pending.next().await {
        match result {
            Ok(()) => tracing::debug!(binding = name, action, "binding done"),
            Err(err) => {
                tracing::warn!(binding = name, action, error = %err, "binding failed");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
