//! Agent lifecycle orchestration.
//!
//! [`Agent`] wires a [`BindingRegistry`](ulprims_registry::BindingRegistry)
//! to a [`ContextBackend`]: on start it activates the backend, registers the
//! event callbacks, installs the alias update hook and starts every
//! binding; on stop it tears the same pieces down in reverse.

pub mod agent;
pub mod backend;
pub mod error;
pub mod memory;

pub use agent::{Agent, AgentState};
pub use backend::{
    alias_passthrough, CommandHandler, ConfigurationHandler, ContextBackend, DataUpdateHandler,
    HandlerFuture, MiddlewareFuture, ProvisioningHandler, UpdateMiddleware,
};
pub use error::{AgentError, BackendError, Result};
pub use memory::MemoryBackend;
