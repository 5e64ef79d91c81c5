/// Errors produced while parsing a UL2.0 payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// A measure group did not split into key/value pairs.
    #[error("unpaired token in measure group {group:?}")]
    UnpairedToken { group: String },

    /// A measure group contained an empty key or value.
    #[error("empty token in measure group {group:?}")]
    EmptyToken { group: String },

    /// The command header has no `@` between device id and command.
    #[error("missing '@' in command header {header:?}")]
    MissingDeviceCommand { header: String },

    /// A command parameter is not a single `key=value` pair.
    #[error("malformed command parameter {field:?}")]
    MalformedParam { field: String },

    /// A command result payload carried no result segment.
    #[error("missing result segment in {payload:?}")]
    MissingResult { payload: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;
