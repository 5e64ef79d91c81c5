use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AgentConfig;
use crate::error::{BindingError, Result};
use crate::event::{EventKind, HandlerEvent};

/// A transport plugin carrying UL2.0 payloads.
///
/// Bindings declare the events they handle through [`Binding::handles`];
/// the dispatcher only calls [`Binding::handle`] for declared kinds.
/// All methods take `&self` so the registry can drive bindings concurrently.
#[async_trait]
pub trait Binding: Send + Sync {
    /// Catalog name of this binding.
    fn name(&self) -> &str;

    /// Events this binding wants to receive.
    fn handles(&self) -> &[EventKind] {
        &[]
    }

    /// Returns true if `kind` is in the declared capability set.
    fn handles_kind(&self, kind: EventKind) -> bool {
        self.handles().contains(&kind)
    }

    /// Acquire transport resources. Called once per agent run.
    async fn start(&self, config: &AgentConfig) -> Result<()>;

    /// Release all transport resources.
    async fn stop(&self) -> Result<()>;

    /// Handle one declared event.
    async fn handle(&self, event: &HandlerEvent) -> Result<()> {
        Err(BindingError::Unsupported {
            binding: self.name().to_string(),
            event: event.kind(),
        })
    }
}

/// Shared handle to a binding.
pub type SharedBinding = Arc<dyn Binding>;
