use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ParseError, Result};
use crate::separator::{ASSIGN, DEVICE_COMMAND, FIELD};

/// Command parameters, keyed by name.
pub type Params = BTreeMap<String, String>;

/// A command the agent wants a device to execute.
///
/// Wire form: `device@command|k=v|k=v`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInvocation {
    pub device_id: String,
    pub command: String,
    pub params: Params,
}

impl CommandInvocation {
    /// Create an invocation without parameters.
    pub fn new(device_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            command: command.into(),
            params: Params::new(),
        }
    }

    /// Add a parameter, replacing any previous value for `key`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A device's report of a finished command.
///
/// Wire form: `device@command|result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub device_id: String,
    pub command: String,
    pub result: String,
}

/// Parse `device@command[|k=v...]`.
pub fn parse_command(payload: &str) -> Result<CommandInvocation> {
    let mut fields = payload.split(FIELD);
    let (device_id, command) = split_header(fields.next().unwrap_or_default())?;

    let mut params = Params::new();
    for field in fields {
        let (key, value) = parse_param(field)?;
        params.insert(key.to_string(), value.to_string());
    }

    Ok(CommandInvocation {
        device_id: device_id.to_string(),
        command: command.to_string(),
        params,
    })
}

/// Parse `device@command|result`.
///
/// Only the first segment after the header is the result; any further
/// segments are dropped.
pub fn parse_result(payload: &str) -> Result<CommandResult> {
    let mut fields = payload.split(FIELD);
    let (device_id, command) = split_header(fields.next().unwrap_or_default())?;
    let result = fields.next().ok_or_else(|| ParseError::MissingResult {
        payload: payload.to_string(),
    })?;

    Ok(CommandResult {
        device_id: device_id.to_string(),
        command: command.to_string(),
        result: result.to_string(),
    })
}

/// Parse a bare parameter list `k=v|k=v`. Empty input yields no parameters.
pub fn parse_params(tail: &str) -> Result<Params> {
    if tail.is_empty() {
        return Ok(Params::new());
    }
    tail.split(FIELD)
        .map(|field| parse_param(field).map(|(k, v)| (k.to_string(), v.to_string())))
        .collect()
}

/// Parse a command from raw bytes.
pub fn decode_command(payload: &[u8]) -> Result<CommandInvocation> {
    parse_command(std::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8)?)
}

/// Parse a command result from raw bytes.
pub fn decode_result(payload: &[u8]) -> Result<CommandResult> {
    parse_result(std::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8)?)
}

fn split_header(header: &str) -> Result<(&str, &str)> {
    header
        .split_once(DEVICE_COMMAND)
        .ok_or_else(|| ParseError::MissingDeviceCommand {
            header: header.to_string(),
        })
}

fn parse_param(field: &str) -> Result<(&str, &str)> {
    let mut parts = field.split(ASSIGN);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Ok((key, value)),
        _ => Err(ParseError::MalformedParam {
            field: field.to_string(),
        }),
    }
}

/// Encode parameters as `k=v|k=v`.
pub fn encode_params(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}{ASSIGN}{value}"))
        .collect::<Vec<_>>()
        .join(&FIELD.to_string())
}

/// Encode a command as `device@command[|k=v...]`.
pub fn encode_command(command: &CommandInvocation) -> String {
    let mut out = format!(
        "{}{DEVICE_COMMAND}{}",
        command.device_id, command.command
    );
    if !command.params.is_empty() {
        out.push(FIELD);
        out.push_str(&encode_params(&command.params));
    }
    out
}

/// Encode a command result as `device@command|result`.
pub fn encode_result(result: &CommandResult) -> String {
    format!(
        "{}{DEVICE_COMMAND}{}{FIELD}{}",
        result.device_id, result.command, result.result
    )
}
