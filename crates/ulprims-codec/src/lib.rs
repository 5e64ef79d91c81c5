//! Ultralight 2.0 payload codec.
//!
//! UL2.0 is a delimiter-based text grammar for constrained devices:
//! - Measures: `k1=v1|k2=v2#k3=v3` (groups split on `#`, fields on `|`)
//! - Commands (agent to device): `device@command|k=v|k=v`
//! - Command results (device to agent): `device@command|result`
//!
//! Separators are single ASCII characters and cannot be escaped. A value
//! containing a separator is the caller's problem; the codec never rewrites
//! payload text.

pub mod command;
pub mod error;
pub mod measure;
pub mod separator;

pub use command::{
    decode_command, decode_result, encode_command, encode_params, encode_result, parse_command,
    parse_params, parse_result, CommandInvocation, CommandResult, Params,
};
pub use error::{ParseError, Result};
pub use measure::{
    decode_measures, encode_group, encode_measures, parse_measures, MeasureGroup, MeasurePayload,
};
pub use separator::{contains_separator, ASSIGN, DEVICE_COMMAND, FIELD, GROUP};
