use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use ulprims_agent::{Agent, AgentError, MemoryBackend};
use ulprims_binding::{
    AgentConfig, CommandAttribute, CommandRequest, LoopbackBinding, OutboundMessage,
    SharedBinding, LOOPBACK,
};
use ulprims_codec::{encode_params, parse_command, DEVICE_COMMAND};
use ulprims_registry::BindingCatalog;

use crate::cmd::RunArgs;
use crate::exit::{agent_error, binding_error, config_error, parse_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_decoded, print_payload, Decoded, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = match &args.config {
        Some(path) => AgentConfig::from_path(path)
            .map_err(|err| config_error(&format!("failed to load {}", path.display()), err))?,
        None => AgentConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to build runtime: {err}")))?;

    runtime.block_on(serve(args, config, format))
}

async fn serve(args: RunArgs, config: AgentConfig, format: OutputFormat) -> CliResult<i32> {
    // The CLI keeps a handle on the loopback instance so it can feed and observe it.
    let loopback = Arc::new(LoopbackBinding::new());
    let shared = loopback.clone();
    let catalog = BindingCatalog::builtin().with(LOOPBACK, move || shared.clone() as SharedBinding);

    let mut agent = Agent::new(Arc::new(MemoryBackend::new()), catalog);
    let backend = agent.backend().clone();
    let mut outbound = loopback.subscribe_outbound();

    if let Err(err) = agent.start(config).await {
        agent.stop().await;
        return Err(agent_error("failed to start agent", err));
    }

    let outcome = drive(&args, &backend, &loopback, &mut outbound, format).await;
    agent.stop().await;
    outcome.map(|()| SUCCESS)
}

async fn drive(
    args: &RunArgs,
    backend: &MemoryBackend,
    loopback: &LoopbackBinding,
    outbound: &mut broadcast::Receiver<OutboundMessage>,
    format: OutputFormat,
) -> CliResult<()> {
    for raw in &args.commands {
        let invocation =
            parse_command(raw).map_err(|err| parse_error(&format!("invalid --command {raw:?}"), err))?;
        let request = CommandRequest {
            id: invocation.device_id.clone(),
            entity_type: args.entity_type.clone(),
            attributes: vec![CommandAttribute::new(
                invocation.command.clone(),
                encode_params(&invocation.params),
            )],
        };
        backend
            .send_command(request)
            .await
            .map_err(|err| agent_error("command failed", AgentError::Backend(err)))?;
        flush_outbound(outbound, format);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                return Ok(());
            }
            line = lines.next_line() => {
                let line = line
                    .map_err(|err| CliError::new(FAILURE, format!("failed to read stdin: {err}")))?;
                let Some(line) = line else {
                    tracing::debug!("stdin closed");
                    return Ok(());
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match ingest_line(loopback, line) {
                    Ok(decoded) => print_decoded(&decoded, format),
                    Err(err) => tracing::warn!(error = %err, line, "ignoring inbound line"),
                }
            }
        }
    }
}

/// A line holding `@` is a command result; anything else is `<device> <measures>`.
fn ingest_line(loopback: &LoopbackBinding, line: &str) -> CliResult<Decoded> {
    if line.contains(DEVICE_COMMAND) {
        let result = loopback
            .ingest_result(line.as_bytes())
            .map_err(|err| binding_error("invalid command result", err))?;
        return Ok(Decoded::Result(result));
    }

    let (device_id, payload) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| CliError::new(FAILURE, "expected '<device> <measures>'"))?;
    let groups = loopback
        .ingest(device_id, payload.trim().as_bytes())
        .map_err(|err| binding_error("invalid measures", err))?;
    Ok(Decoded::Measures {
        device_id: Some(device_id.to_string()),
        groups,
    })
}

fn flush_outbound(outbound: &mut broadcast::Receiver<OutboundMessage>, format: OutputFormat) {
    loop {
        match outbound.try_recv() {
            Ok(message) => print_payload(
                "outbound",
                &message.device_id,
                &String::from_utf8_lossy(&message.payload),
                format,
            ),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "outbound payloads dropped");
            }
            Err(_) => break,
        }
    }
}
