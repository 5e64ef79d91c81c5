use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;
use ulprims_codec::{
    decode_measures, decode_result, encode_command, parse_params, CommandInvocation,
    CommandResult, MeasurePayload,
};

use crate::config::AgentConfig;
use crate::error::{BindingError, Result};
use crate::event::{CommandRequest, EventKind, HandlerEvent};
use crate::traits::Binding;

/// Catalog name of the loopback binding.
pub const LOOPBACK: &str = "loopback";

const CHANNEL_CAPACITY: usize = 256;

const HANDLED: [EventKind; 3] = [
    EventKind::DeviceProvisioning,
    EventKind::Configuration,
    EventKind::Command,
];

/// An encoded command leaving the agent towards a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub device_id: String,
    pub payload: Bytes,
}

/// A decoded payload received from a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Measures {
        device_id: String,
        groups: MeasurePayload,
    },
    CommandResult(CommandResult),
}

/// In-process transport.
///
/// Outbound commands are published on a broadcast channel instead of a
/// socket; inbound payloads are pushed in through [`LoopbackBinding::ingest`].
pub struct LoopbackBinding {
    running: AtomicBool,
    devices: Mutex<BTreeSet<String>>,
    apikeys: Mutex<BTreeSet<String>>,
    outbound: broadcast::Sender<OutboundMessage>,
    inbound: broadcast::Sender<InboundMessage>,
}

impl LoopbackBinding {
    pub fn new() -> Self {
        let (outbound, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (inbound, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            running: AtomicBool::new(false),
            devices: Mutex::new(BTreeSet::new()),
            apikeys: Mutex::new(BTreeSet::new()),
            outbound,
            inbound,
        }
    }

    /// Receive every command this binding transmits.
    pub fn subscribe_outbound(&self) -> broadcast::Receiver<OutboundMessage> {
        self.outbound.subscribe()
    }

    /// Receive every payload this binding decodes.
    pub fn subscribe_inbound(&self) -> broadcast::Receiver<InboundMessage> {
        self.inbound.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Device ids seen through provisioning, sorted.
    pub fn devices(&self) -> Vec<String> {
        lock(&self.devices).iter().cloned().collect()
    }

    /// API keys seen through configuration, sorted.
    pub fn apikeys(&self) -> Vec<String> {
        lock(&self.apikeys).iter().cloned().collect()
    }

    /// Decode a measure payload received from `device_id`.
    pub fn ingest(&self, device_id: &str, raw: &[u8]) -> Result<MeasurePayload> {
        self.ensure_running()?;
        let groups = decode_measures(raw).inspect_err(|err| {
            tracing::warn!(device = device_id, error = %err, "discarding malformed measure payload");
        })?;

        self.publish_inbound(InboundMessage::Measures {
            device_id: device_id.to_string(),
            groups: groups.clone(),
        });
        Ok(groups)
    }

    /// Decode a command result received from a device.
    pub fn ingest_result(&self, raw: &[u8]) -> Result<CommandResult> {
        self.ensure_running()?;
        let result = decode_result(raw).inspect_err(|err| {
            tracing::warn!(error = %err, "discarding malformed command result");
        })?;

        self.publish_inbound(InboundMessage::CommandResult(result.clone()));
        Ok(result)
    }

    fn publish_inbound(&self, message: InboundMessage) {
        // Decoding already succeeded; a missing listener only loses the copy.
        if self.inbound.send(message).is_err() {
            tracing::trace!("no inbound subscriber");
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(BindingError::NotStarted(LOOPBACK.to_string()))
        }
    }

    fn transmit(&self, request: &CommandRequest) -> Result<()> {
        // Encode every attribute before sending anything, so a malformed one
        // leaves the device untouched.
        let payloads = request
            .attributes
            .iter()
            .map(|attribute| -> Result<String> {
                let invocation = CommandInvocation {
                    device_id: request.id.clone(),
                    command: attribute.name.clone(),
                    params: parse_params(&attribute.value)?,
                };
                Ok(encode_command(&invocation))
            })
            .collect::<Result<Vec<_>>>()?;

        for payload in payloads {
            tracing::debug!(device = %request.id, payload = %payload, "sending command");

            // No subscriber means nobody is listening on the other end.
            if self
                .outbound
                .send(OutboundMessage {
                    device_id: request.id.clone(),
                    payload: Bytes::from(payload),
                })
                .is_err()
            {
                tracing::trace!(device = %request.id, "no outbound subscriber");
            }
        }
        Ok(())
    }
}

impl Default for LoopbackBinding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for LoopbackBinding {
    fn name(&self) -> &str {
        LOOPBACK
    }

    fn handles(&self) -> &[EventKind] {
        &HANDLED
    }

    async fn start(&self, config: &AgentConfig) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BindingError::Start {
                binding: LOOPBACK.to_string(),
                message: "already started".to_string(),
            });
        }
        tracing::info!(
            host = %config.mqtt.host,
            port = config.mqtt.port,
            authenticated = config.mqtt.credentials().is_some(),
            "loopback binding started"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("loopback binding stopped");
        }
        Ok(())
    }

    async fn handle(&self, event: &HandlerEvent) -> Result<()> {
        self.ensure_running()?;
        match event {
            HandlerEvent::DeviceProvisioning(device) => {
                tracing::debug!(device = %device.id, "device provisioned");
                lock(&self.devices).insert(device.id.clone());
                Ok(())
            }
            HandlerEvent::Configuration(configuration) => {
                tracing::debug!(apikey = %configuration.apikey, "configuration received");
                lock(&self.apikeys).insert(configuration.apikey.clone());
                Ok(())
            }
            HandlerEvent::Command(request) => self.transmit(request),
            HandlerEvent::Update(_) => Err(BindingError::Unsupported {
                binding: LOOPBACK.to_string(),
                event: EventKind::Update,
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
