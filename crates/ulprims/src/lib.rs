//! Ultralight 2.0 IoT agent core.
//!
//! ulprims decodes the compact UL2.0 text payloads sent by field devices,
//! defines the contract transport bindings implement, and runs the agent
//! lifecycle that fans backend events out to those bindings.
//!
//! # Crate Structure
//!
//! - [`codec`] : UL2.0 grammar: measures, commands, command results
//! - [`binding`] : Transport binding contract, configuration, loopback binding
//! - [`registry`] : Binding catalog and event dispatcher (behind `agent` feature)
//! - [`agent`] : Lifecycle orchestrator and backends (behind `agent` feature)

/// Re-export codec types.
pub mod codec {
    pub use ulprims_codec::*;
}

/// Re-export binding types.
pub mod binding {
    pub use ulprims_binding::*;
}

/// Re-export registry types (requires `agent` feature).
#[cfg(feature = "agent")]
pub mod registry {
    pub use ulprims_registry::*;
}

/// Re-export agent types (requires `agent` feature).
#[cfg(feature = "agent")]
pub mod agent {
    pub use ulprims_agent::*;
}
