use std::fmt;

use ulprims_agent::AgentError;
use ulprims_binding::{BindingError, ConfigError};
use ulprims_codec::ParseError;

// Exit codes follow the sysexits-style ranges used across our tooling.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const CONFIG_INVALID: i32 = 78;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn parse_error(context: &str, err: ParseError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    CliError::new(CONFIG_INVALID, format!("{context}: {err}"))
}

pub fn binding_error(context: &str, err: BindingError) -> CliError {
    match err {
        BindingError::Codec(err) => parse_error(context, err),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

pub fn agent_error(context: &str, err: AgentError) -> CliError {
    match err {
        AgentError::Registry(_) => CliError::new(CONFIG_INVALID, format!("{context}: {err}")),
        AgentError::Binding(err) => binding_error(context, err),
        AgentError::InvalidState { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
        AgentError::Backend(_) => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
