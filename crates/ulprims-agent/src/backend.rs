use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{self, BoxFuture, FutureExt};
use ulprims_binding::{CommandRequest, ConfigurationInfo, DeviceInfo, EntityUpdate};

use crate::error::BackendError;

/// Completion of an event callback.
pub type HandlerFuture = BoxFuture<'static, ulprims_binding::Result<()>>;

/// Completion of an update middleware.
pub type MiddlewareFuture = BoxFuture<'static, Result<EntityUpdate, BackendError>>;

pub type ProvisioningHandler = Arc<dyn Fn(DeviceInfo) -> HandlerFuture + Send + Sync>;
pub type ConfigurationHandler = Arc<dyn Fn(ConfigurationInfo) -> HandlerFuture + Send + Sync>;
pub type CommandHandler = Arc<dyn Fn(CommandRequest) -> HandlerFuture + Send + Sync>;
pub type DataUpdateHandler = Arc<dyn Fn(EntityUpdate) -> HandlerFuture + Send + Sync>;
pub type UpdateMiddleware = Arc<dyn Fn(EntityUpdate) -> MiddlewareFuture + Send + Sync>;

/// The context-management backend the agent drives.
///
/// The backend persists devices, maps attributes and talks to the context
/// broker. It calls back into the agent through the registered handlers.
#[async_trait]
pub trait ContextBackend: Send + Sync {
    /// Activate with the opaque `iota` configuration section.
    async fn activate(&self, config: &serde_json::Value) -> Result<(), BackendError>;

    async fn deactivate(&self) -> Result<(), BackendError>;

    fn set_provisioning_handler(&self, handler: ProvisioningHandler) -> Result<(), BackendError>;

    fn set_configuration_handler(
        &self,
        handler: ConfigurationHandler,
    ) -> Result<(), BackendError>;

    fn set_command_handler(&self, handler: CommandHandler) -> Result<(), BackendError>;

    fn set_data_update_handler(&self, handler: DataUpdateHandler) -> Result<(), BackendError>;

    /// Append a middleware to the update pipeline.
    fn add_update_middleware(&self, middleware: UpdateMiddleware) -> Result<(), BackendError>;

    /// Remove every update middleware.
    async fn reset_middlewares(&self) -> Result<(), BackendError>;
}

/// Attribute alias hook: hands the update through unchanged.
pub fn alias_passthrough() -> UpdateMiddleware {
    Arc::new(|update: EntityUpdate| -> MiddlewareFuture { future::ok(update).boxed() })
}
