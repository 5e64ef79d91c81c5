//! Agent-level events fanned out to bindings.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The events a binding may declare interest in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "deviceProvisioningHandler")]
    DeviceProvisioning,
    #[serde(rename = "configurationHandler")]
    Configuration,
    #[serde(rename = "commandHandler")]
    Command,
    #[serde(rename = "updateHandler")]
    Update,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::DeviceProvisioning,
        EventKind::Configuration,
        EventKind::Command,
        EventKind::Update,
    ];

    /// Stable handler name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::DeviceProvisioning => "deviceProvisioningHandler",
            EventKind::Configuration => "configurationHandler",
            EventKind::Command => "commandHandler",
            EventKind::Update => "updateHandler",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device as provisioned in the context backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub subservice: Option<String>,
    #[serde(default)]
    pub apikey: Option<String>,
    /// Backend fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A device group (service) configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationInfo {
    pub apikey: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub subservice: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One command attribute of a command request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAttribute {
    pub name: String,
    #[serde(rename = "type", default)]
    pub attr_type: String,
    /// Parameter list in `k=v|k=v` form, possibly empty.
    #[serde(default)]
    pub value: String,
}

impl CommandAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_type: "command".to_string(),
            value: value.into(),
        }
    }
}

/// A command the backend wants executed on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// Device id.
    pub id: String,
    pub entity_type: String,
    pub attributes: Vec<CommandAttribute>,
}

/// An attribute written to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAttribute {
    pub name: String,
    #[serde(rename = "type", default)]
    pub attr_type: String,
    pub value: String,
}

/// An entity update travelling through the backend's update pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUpdate {
    pub entity_name: String,
    pub entity_type: String,
    pub attributes: Vec<EntityAttribute>,
}

/// Arguments of one cross-cutting event.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerEvent {
    DeviceProvisioning(DeviceInfo),
    Configuration(ConfigurationInfo),
    Command(CommandRequest),
    Update(EntityUpdate),
}

impl HandlerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HandlerEvent::DeviceProvisioning(_) => EventKind::DeviceProvisioning,
            HandlerEvent::Configuration(_) => EventKind::Configuration,
            HandlerEvent::Command(_) => EventKind::Command,
            HandlerEvent::Update(_) => EventKind::Update,
        }
    }
}
