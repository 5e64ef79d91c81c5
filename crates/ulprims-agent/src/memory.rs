use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use ulprims_binding::{CommandRequest, ConfigurationInfo, DeviceInfo, EntityUpdate, EventKind};

use crate::backend::{
    CommandHandler, ConfigurationHandler, ContextBackend, DataUpdateHandler, ProvisioningHandler,
    UpdateMiddleware,
};
use crate::error::BackendError;

#[derive(Default)]
struct Handlers {
    provisioning: Option<ProvisioningHandler>,
    configuration: Option<ConfigurationHandler>,
    command: Option<CommandHandler>,
    data_update: Option<DataUpdateHandler>,
}

/// In-process context backend.
///
/// Keeps registered handlers and middlewares in memory and lets the host
/// drive them directly: [`MemoryBackend::provision`],
/// [`MemoryBackend::send_command`] and friends play the role of the
/// context broker.
#[derive(Default)]
pub struct MemoryBackend {
    active: AtomicBool,
    config: Mutex<Option<serde_json::Value>>,
    handlers: Mutex<Handlers>,
    middlewares: Mutex<Vec<UpdateMiddleware>>,
    applied: Mutex<Vec<EntityUpdate>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// The configuration passed to the last successful `activate`.
    pub fn activation_config(&self) -> Option<serde_json::Value> {
        lock(&self.config).clone()
    }

    pub fn middleware_count(&self) -> usize {
        lock(&self.middlewares).len()
    }

    /// Updates that made it through the middleware chain, oldest first.
    pub fn applied_updates(&self) -> Vec<EntityUpdate> {
        lock(&self.applied).clone()
    }

    /// Report a newly provisioned device to the agent.
    pub async fn provision(&self, device: DeviceInfo) -> Result<(), BackendError> {
        self.ensure_active()?;
        let handler = lock(&self.handlers)
            .provisioning
            .clone()
            .ok_or(BackendError::NoHandler(EventKind::DeviceProvisioning))?;
        handler(device).await.map_err(BackendError::from)
    }

    /// Report a new device group configuration to the agent.
    pub async fn configure(&self, configuration: ConfigurationInfo) -> Result<(), BackendError> {
        self.ensure_active()?;
        let handler = lock(&self.handlers)
            .configuration
            .clone()
            .ok_or(BackendError::NoHandler(EventKind::Configuration))?;
        handler(configuration).await.map_err(BackendError::from)
    }

    /// Ask the agent to execute a command on a device.
    pub async fn send_command(&self, request: CommandRequest) -> Result<(), BackendError> {
        self.ensure_active()?;
        let handler = lock(&self.handlers)
            .command
            .clone()
            .ok_or(BackendError::NoHandler(EventKind::Command))?;
        handler(request).await.map_err(BackendError::from)
    }

    /// Notify the agent that an entity changed on the broker side.
    pub async fn notify_update(&self, update: EntityUpdate) -> Result<(), BackendError> {
        self.ensure_active()?;
        let handler = lock(&self.handlers)
            .data_update
            .clone()
            .ok_or(BackendError::NoHandler(EventKind::Update))?;
        handler(update).await.map_err(BackendError::from)
    }

    /// Run `update` through the middleware chain and record the result.
    pub async fn apply_update(&self, update: EntityUpdate) -> Result<EntityUpdate, BackendError> {
        self.ensure_active()?;
        let chain: Vec<UpdateMiddleware> = lock(&self.middlewares).clone();

        let mut current = update;
        for middleware in chain {
            current = middleware(current).await?;
        }
        lock(&self.applied).push(current.clone());
        Ok(current)
    }

    // Handlers are dropped on deactivate, so registering before activate is lost work.
    fn ensure_registrable(&self) -> Result<(), BackendError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(BackendError::Registration("backend is not active".to_string()))
        }
    }

    fn ensure_active(&self) -> Result<(), BackendError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(BackendError::NotActive)
        }
    }
}

#[async_trait]
impl ContextBackend for MemoryBackend {
    async fn activate(&self, config: &serde_json::Value) -> Result<(), BackendError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(BackendError::Activation("already active".to_string()));
        }
        *lock(&self.config) = Some(config.clone());
        tracing::debug!("memory backend activated");
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), BackendError> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(BackendError::Deactivation("not active".to_string()));
        }
        *lock(&self.handlers) = Handlers::default();
        tracing::debug!("memory backend deactivated");
        Ok(())
    }

    fn set_provisioning_handler(&self, handler: ProvisioningHandler) -> Result<(), BackendError> {
        self.ensure_registrable()?;
        lock(&self.handlers).provisioning = Some(handler);
        Ok(())
    }

    fn set_configuration_handler(
        &self,
        handler: ConfigurationHandler,
    ) -> Result<(), BackendError> {
        self.ensure_registrable()?;
        lock(&self.handlers).configuration = Some(handler);
        Ok(())
    }

    fn set_command_handler(&self, handler: CommandHandler) -> Result<(), BackendError> {
        self.ensure_registrable()?;
        lock(&self.handlers).command = Some(handler);
        Ok(())
    }

    fn set_data_update_handler(&self, handler: DataUpdateHandler) -> Result<(), BackendError> {
        self.ensure_registrable()?;
        lock(&self.handlers).data_update = Some(handler);
        Ok(())
    }

    fn add_update_middleware(&self, middleware: UpdateMiddleware) -> Result<(), BackendError> {
        self.ensure_registrable()?;
        lock(&self.middlewares).push(middleware);
        Ok(())
    }

    async fn reset_middlewares(&self) -> Result<(), BackendError> {
        lock(&self.middlewares).clear();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
