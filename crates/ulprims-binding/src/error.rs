use ulprims_codec::ParseError;

use crate::event::EventKind;

/// Errors raised by a transport binding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BindingError {
    /// The binding failed to acquire its transport resources.
    #[error("binding {binding} failed to start: {message}")]
    Start { binding: String, message: String },

    /// The binding failed to release its transport resources.
    #[error("binding {binding} failed to stop: {message}")]
    Stop { binding: String, message: String },

    /// An event handler failed.
    #[error("binding {binding} failed handling {event}: {message}")]
    Handler {
        binding: String,
        event: EventKind,
        message: String,
    },

    /// The binding was asked to work before `start` completed.
    #[error("binding {0} is not started")]
    NotStarted(String),

    /// The binding does not handle this event.
    #[error("binding {binding} does not handle {event}")]
    Unsupported { binding: String, event: EventKind },

    /// A payload could not be encoded or decoded.
    #[error("payload error: {0}")]
    Codec(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, BindingError>;
