use ulprims_binding::{BindingError, EventKind};
use ulprims_registry::RegistryError;

use crate::agent::AgentState;

/// Errors raised by a context-management backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be activated.
    #[error("backend activation failed: {0}")]
    Activation(String),

    /// The backend could not be deactivated.
    #[error("backend deactivation failed: {0}")]
    Deactivation(String),

    /// The backend refused a handler or middleware registration.
    #[error("backend rejected registration: {0}")]
    Registration(String),

    /// The backend is not active.
    #[error("backend is not active")]
    NotActive,

    /// No handler is registered for the event.
    #[error("no {0} registered")]
    NoHandler(EventKind),

    /// A registered handler failed.
    #[error("handler failed: {0}")]
    HandlerFailed(#[from] BindingError),
}

/// Errors surfaced by the agent orchestrator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    /// The requested transition is not valid from the current state.
    #[error("agent is {actual}, expected {expected}")]
    InvalidState {
        expected: AgentState,
        actual: AgentState,
    },

    /// Backend-level error.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Binding-level error.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Binding configuration error.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
