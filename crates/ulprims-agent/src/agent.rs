use std::fmt;
use std::sync::Arc;

use futures_util::future::{self, FutureExt};
use ulprims_binding::{
    AgentConfig, CommandRequest, ConfigurationInfo, DeviceInfo, EntityUpdate, HandlerEvent,
};
use ulprims_registry::{BindingCatalog, BindingRegistry};

use crate::backend::{alias_passthrough, ContextBackend, HandlerFuture};
use crate::error::{AgentError, BackendError, Result};

/// Lifecycle phase of an [`Agent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentState::Stopped => "stopped",
            AgentState::Starting => "starting",
            AgentState::Running => "running",
            AgentState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// The agent orchestrator.
///
/// Owns the lifecycle state, the configuration snapshot and the binding
/// registry of the current run. `start` and `stop` take `&mut self`, so the
/// registry is only ever replaced by the orchestrator itself; the backend
/// callbacks hold read-only handles to it.
pub struct Agent<B> {
    backend: Arc<B>,
    catalog: BindingCatalog,
    state: AgentState,
    config: Option<AgentConfig>,
    registry: Option<Arc<BindingRegistry>>,
}

impl<B: ContextBackend + 'static> Agent<B> {
    pub fn new(backend: Arc<B>, catalog: BindingCatalog) -> Self {
        Self {
            backend,
            catalog,
            state: AgentState::Stopped,
            config: None,
            registry: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Configuration of the current run.
    pub fn config(&self) -> Option<&AgentConfig> {
        self.config.as_ref()
    }

    /// Bindings of the current run.
    pub fn registry(&self) -> Option<&Arc<BindingRegistry>> {
        self.registry.as_ref()
    }

    /// Start the agent.
    ///
    /// Binding names are resolved first, then the backend is activated with
    /// the `iota` section. A failure up to that point leaves the agent
    /// stopped. Afterwards callbacks and the alias hook are registered and
    /// every binding is started; if that fails the agent stays `Starting`
    /// and [`Agent::stop`] is needed to clean up.
    pub async fn start(&mut self, config: AgentConfig) -> Result<()> {
        if self.state != AgentState::Stopped {
            return Err(AgentError::InvalidState {
                expected: AgentState::Stopped,
                actual: self.state,
            });
        }

        let registry = Arc::new(BindingRegistry::from_catalog(
            &self.catalog,
            &config.bindings,
        )?);

        self.state = AgentState::Starting;
        tracing::info!(bindings = ?registry.names(), "starting agent");

        if let Err(err) = self.backend.activate(&config.iota).await {
            tracing::error!(error = %err, "backend activation failed");
            self.state = AgentState::Stopped;
            return Err(err.into());
        }

        self.registry = Some(registry.clone());
        self.register_callbacks(&registry)?;
        self.backend.add_update_middleware(alias_passthrough())?;

        registry.start_all(&config).await?;

        self.config = Some(config);
        self.state = AgentState::Running;
        tracing::info!("agent running");
        Ok(())
    }

    /// Stop the agent.
    ///
    /// Best effort: bindings, middlewares and the backend are shut down in
    /// that order regardless of failures, which are logged. Always ends in
    /// [`AgentState::Stopped`].
    pub async fn stop(&mut self) {
        if self.state == AgentState::Stopped {
            tracing::debug!("agent already stopped");
            return;
        }

        tracing::info!(from = %self.state, "stopping agent");
        self.state = AgentState::Stopping;

        if let Some(registry) = self.registry.take() {
            if let Err(err) = registry.stop_all().await {
                tracing::warn!(error = %err, "failed stopping bindings");
            }
        }
        if let Err(err) = self.backend.reset_middlewares().await {
            tracing::warn!(error = %err, "failed resetting update middlewares");
        }
        if let Err(err) = self.backend.deactivate().await {
            tracing::warn!(error = %err, "failed deactivating backend");
        }

        self.config = None;
        self.state = AgentState::Stopped;
        tracing::info!("agent stopped");
    }

    fn register_callbacks(
        &self,
        registry: &Arc<BindingRegistry>,
    ) -> std::result::Result<(), BackendError> {
        let dispatch = registry.clone();
        self.backend
            .set_provisioning_handler(Arc::new(move |device: DeviceInfo| -> HandlerFuture {
                broadcast(dispatch.clone(), HandlerEvent::DeviceProvisioning(device))
            }))?;

        let dispatch = registry.clone();
        self.backend.set_configuration_handler(Arc::new(
            move |configuration: ConfigurationInfo| -> HandlerFuture {
                broadcast(dispatch.clone(), HandlerEvent::Configuration(configuration))
            },
        ))?;

        let dispatch = registry.clone();
        self.backend
            .set_command_handler(Arc::new(move |request: CommandRequest| -> HandlerFuture {
                broadcast(dispatch.clone(), HandlerEvent::Command(request))
            }))?;

        // Reserved for lazy attributes; nothing to do yet.
        self.backend
            .set_data_update_handler(Arc::new(|_update: EntityUpdate| -> HandlerFuture {
                future::ok(()).boxed()
            }))?;

        Ok(())
    }
}

fn broadcast(registry: Arc<BindingRegistry>, event: HandlerEvent) -> HandlerFuture {
    async move { registry.broadcast(&event).await }.boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ulprims_binding::{
        Binding, BindingError, CommandAttribute, EventKind, LoopbackBinding, SharedBinding,
        LOOPBACK,
    };

    use super::*;
    use crate::backend::{
        CommandHandler, ConfigurationHandler, DataUpdateHandler, ProvisioningHandler,
        UpdateMiddleware,
    };
    use crate::memory::MemoryBackend;

    type CallLog = Arc<Mutex<Vec<String>>>;
    type BackendResult = std::result::Result<(), BackendError>;

    struct StubBinding {
        name: &'static str,
        fail_start: bool,
        log: CallLog,
    }

    #[async_trait]
    impl Binding for StubBinding {
        fn name(&self) -> &str {
            self.name
        }

        fn handles(&self) -> &[EventKind] {
            &[EventKind::DeviceProvisioning]
        }

        async fn start(&self, _config: &AgentConfig) -> ulprims_binding::Result<()> {
            self.log.lock().unwrap().push(format!("{}:start", self.name));
            if self.fail_start {
                return Err(BindingError::Start {
                    binding: self.name.to_string(),
                    message: "port in use".to_string(),
                });
            }
            Ok(())
        }

        async fn stop(&self) -> ulprims_binding::Result<()> {
            self.log.lock().unwrap().push(format!("{}:stop", self.name));
            Err(BindingError::Stop {
                binding: self.name.to_string(),
                message: "already closed".to_string(),
            })
        }

        async fn handle(&self, event: &HandlerEvent) -> ulprims_binding::Result<()> {
            if let HandlerEvent::DeviceProvisioning(device) = event {
                self.log
                    .lock()
                    .unwrap()
                    .push(format!("{}:provision:{}", self.name, device.id));
            }
            Ok(())
        }
    }

    fn stub_catalog(log: &CallLog, fail_start: bool) -> BindingCatalog {
        let log = log.clone();
        BindingCatalog::new().with("stub", move || {
            Arc::new(StubBinding {
                name: "stub",
                fail_start,
                log: log.clone(),
            }) as SharedBinding
        })
    }

    fn entries(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    /// Backend whose activation always fails.
    struct RefusingBackend;

    #[async_trait]
    impl ContextBackend for RefusingBackend {
        async fn activate(
            &self,
            _config: &serde_json::Value,
        ) -> BackendResult {
            Err(BackendError::Activation("broker unreachable".to_string()))
        }

        async fn deactivate(&self) -> BackendResult {
            Ok(())
        }

        fn set_provisioning_handler(&self, _: ProvisioningHandler) -> BackendResult {
            Ok(())
        }

        fn set_configuration_handler(&self, _: ConfigurationHandler) -> BackendResult {
            Ok(())
        }

        fn set_command_handler(&self, _: CommandHandler) -> BackendResult {
            Ok(())
        }

        fn set_data_update_handler(&self, _: DataUpdateHandler) -> BackendResult {
            Ok(())
        }

        fn add_update_middleware(&self, _: UpdateMiddleware) -> BackendResult {
            Ok(())
        }

        async fn reset_middlewares(&self) -> BackendResult {
            Ok(())
        }
    }

    /// Backend that logs every call into the shared log and can fail teardown.
    struct RecordingBackend {
        log: CallLog,
        fail_reset: bool,
        fail_deactivate: bool,
    }

    impl RecordingBackend {
        fn new(log: &CallLog) -> Self {
            Self {
                log: log.clone(),
                fail_reset: false,
                fail_deactivate: false,
            }
        }

        fn record(&self, call: &str) {
            self.log.lock().unwrap().push(format!("backend:{call}"));
        }
    }

    #[async_trait]
    impl ContextBackend for RecordingBackend {
        async fn activate(&self, _config: &serde_json::Value) -> BackendResult {
            self.record("activate");
            Ok(())
        }

        async fn deactivate(&self) -> BackendResult {
            self.record("deactivate");
            if self.fail_deactivate {
                return Err(BackendError::Deactivation("broker gone".to_string()));
            }
            Ok(())
        }

        fn set_provisioning_handler(&self, _: ProvisioningHandler) -> BackendResult {
            self.record("provisioning_handler");
            Ok(())
        }

        fn set_configuration_handler(&self, _: ConfigurationHandler) -> BackendResult {
            self.record("configuration_handler");
            Ok(())
        }

        fn set_command_handler(&self, _: CommandHandler) -> BackendResult {
            self.record("command_handler");
            Ok(())
        }

        fn set_data_update_handler(&self, _: DataUpdateHandler) -> BackendResult {
            self.record("data_update_handler");
            Ok(())
        }

        fn add_update_middleware(&self, _: UpdateMiddleware) -> BackendResult {
            self.record("update_middleware");
            Ok(())
        }

        async fn reset_middlewares(&self) -> BackendResult {
            self.record("reset_middlewares");
            if self.fail_reset {
                return Err(BackendError::Registration("middleware store offline".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn callbacks_are_registered_before_bindings_start() {
        let log: CallLog = Arc::default();
        let backend = Arc::new(RecordingBackend::new(&log));
        let mut agent = Agent::new(backend, stub_catalog(&log, false));

        agent.start(AgentConfig::default()).await.expect("agent should start");
        assert_eq!(
            entries(&log),
            vec![
                "backend:activate",
                "backend:provisioning_handler",
                "backend:configuration_handler",
                "backend:command_handler",
                "backend:data_update_handler",
                "backend:update_middleware",
                "stub:start",
            ]
        );
    }

    #[tokio::test]
    async fn stop_tears_down_in_order_despite_failures() {
        let log: CallLog = Arc::default();
        let backend = Arc::new(RecordingBackend {
            fail_reset: true,
            fail_deactivate: true,
            ..RecordingBackend::new(&log)
        });
        let mut agent = Agent::new(backend, stub_catalog(&log, false));
        agent.start(AgentConfig::default()).await.expect("agent should start");
        log.lock().unwrap().clear();

        // The stub's stop fails too; every step still runs.
        agent.stop().await;

        assert_eq!(
            entries(&log),
            vec!["stub:stop", "backend:reset_middlewares", "backend:deactivate"]
        );
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(agent.registry().is_none());
        assert!(agent.config().is_none());
    }

    #[tokio::test]
    async fn stop_after_external_deactivation_still_stops() {
        let log: CallLog = Arc::default();
        let mut agent = Agent::new(Arc::new(MemoryBackend::new()), stub_catalog(&log, false));
        agent.start(AgentConfig::default()).await.unwrap();

        agent.backend().deactivate().await.expect("first deactivate");
        agent.stop().await;

        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(!agent.backend().is_active());
    }

    #[tokio::test]
    async fn start_runs_and_routes_provisioning() {
        let log: CallLog = Arc::default();
        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend.clone(), stub_catalog(&log, false));

        let config = AgentConfig {
            iota: serde_json::json!({ "service": "smartgondor" }),
            ..AgentConfig::default()
        };
        agent.start(config).await.expect("agent should start");

        assert_eq!(agent.state(), AgentState::Running);
        assert!(backend.is_active());
        assert_eq!(backend.activation_config().unwrap()["service"], "smartgondor");
        assert_eq!(backend.middleware_count(), 1);

        backend
            .provision(DeviceInfo::new("dev1"))
            .await
            .expect("provisioning should reach the binding");
        assert_eq!(entries(&log), vec!["stub:start", "stub:provision:dev1"]);
    }

    #[tokio::test]
    async fn activation_failure_leaves_agent_stopped() {
        let log: CallLog = Arc::default();
        let mut agent = Agent::new(Arc::new(RefusingBackend), stub_catalog(&log, false));

        let err = agent
            .start(AgentConfig::default())
            .await
            .expect_err("activation should fail");

        assert!(matches!(err, AgentError::Backend(BackendError::Activation(_))));
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(agent.registry().is_none());
        assert!(entries(&log).is_empty(), "no binding may start");
    }

    #[tokio::test]
    async fn unknown_binding_fails_before_activation() {
        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend.clone(), BindingCatalog::builtin());
        let config = AgentConfig {
            bindings: vec!["amqp".to_string()],
            ..AgentConfig::default()
        };

        let err = agent.start(config).await.expect_err("unknown binding");
        assert!(matches!(err, AgentError::Registry(_)));
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(!backend.is_active());
    }

    #[tokio::test]
    async fn binding_start_failure_then_stop_cleans_up() {
        let log: CallLog = Arc::default();
        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend.clone(), stub_catalog(&log, true));

        let err = agent
            .start(AgentConfig::default())
            .await
            .expect_err("binding start should fail");
        assert!(matches!(err, AgentError::Binding(BindingError::Start { .. })));
        assert_eq!(agent.state(), AgentState::Starting);

        let again = agent.start(AgentConfig::default()).await;
        assert!(matches!(again, Err(AgentError::InvalidState { .. })));

        agent.stop().await;
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(!backend.is_active());
        assert_eq!(backend.middleware_count(), 0);
        assert_eq!(entries(&log), vec!["stub:start", "stub:stop"]);
    }

    #[tokio::test]
    async fn repeated_stop_converges() {
        let log: CallLog = Arc::default();
        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend.clone(), stub_catalog(&log, false));

        agent.stop().await;
        assert_eq!(agent.state(), AgentState::Stopped);

        agent.start(AgentConfig::default()).await.unwrap();
        // The stub's stop fails; shutdown carries on regardless.
        agent.stop().await;
        agent.stop().await;
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(agent.config().is_none());
        assert!(!backend.is_active());
    }

    #[tokio::test]
    async fn update_callback_is_a_no_op() {
        let log: CallLog = Arc::default();
        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend.clone(), stub_catalog(&log, false));
        agent.start(AgentConfig::default()).await.unwrap();

        let update = EntityUpdate {
            entity_name: "Room1".to_string(),
            entity_type: "Room".to_string(),
            attributes: Vec::new(),
        };
        backend.notify_update(update.clone()).await.expect("no-op succeeds");
        assert_eq!(backend.apply_update(update.clone()).await.unwrap(), update);
        assert_eq!(entries(&log), vec!["stub:start"]);
    }

    #[tokio::test]
    async fn command_reaches_device_through_loopback() {
        let loopback = Arc::new(LoopbackBinding::new());
        let mut outbound = loopback.subscribe_outbound();
        let shared = loopback.clone();
        let catalog = BindingCatalog::new().with(LOOPBACK, move || shared.clone() as SharedBinding);

        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend.clone(), catalog);
        agent.start(AgentConfig::default()).await.unwrap();

        backend
            .send_command(CommandRequest {
                id: "dev1".to_string(),
                entity_type: "Robot".to_string(),
                attributes: vec![CommandAttribute::new("ping", "times=3")],
            })
            .await
            .expect("command should dispatch");

        let message = outbound.recv().await.expect("outbound command");
        assert_eq!(message.payload.as_ref(), b"dev1@ping|times=3");

        let err = backend
            .send_command(CommandRequest {
                id: "dev1".to_string(),
                entity_type: "Robot".to_string(),
                attributes: vec![CommandAttribute::new("ping", "times")],
            })
            .await
            .expect_err("malformed params");
        assert!(matches!(err, BackendError::HandlerFailed(BindingError::Codec(_))));

        agent.stop().await;
        assert!(!loopback.is_running());
    }

    #[tokio::test]
    async fn restart_uses_fresh_bindings() {
        let backend = Arc::new(MemoryBackend::new());
        let mut agent = Agent::new(backend, BindingCatalog::builtin());

        agent.start(AgentConfig::default()).await.unwrap();
        let first = agent.registry().unwrap().clone();
        agent.stop().await;

        agent.start(AgentConfig::default()).await.unwrap();
        let second = agent.registry().unwrap().clone();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.names(), vec![LOOPBACK]);
        agent.stop().await;
    }
}
