//! Transport binding contract.
//!
//! A binding carries UL2.0 payloads over some transport (MQTT, HTTP, ...).
//! This crate defines what every binding must provide:
//! - [`Binding`]: lifecycle (`start`/`stop`) plus event handling
//! - [`EventKind`]: the capability tags a binding declares up front
//! - [`HandlerEvent`]: the agent-level events fanned out to bindings
//! - [`AgentConfig`]: the shared configuration handed to `start`
//!
//! It also ships [`LoopbackBinding`], an in-process transport used by the
//! CLI and by tests.

pub mod config;
pub mod error;
pub mod event;
pub mod loopback;
pub mod traits;

pub use config::{AgentConfig, ConfigError, MqttConfig};
pub use error::{BindingError, Result};
pub use event::{
    CommandAttribute, CommandRequest, ConfigurationInfo, DeviceInfo, EntityAttribute,
    EntityUpdate, EventKind, HandlerEvent,
};
pub use loopback::{InboundMessage, LoopbackBinding, OutboundMessage, LOOPBACK};
pub use traits::{Binding, SharedBinding};
