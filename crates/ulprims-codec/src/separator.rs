//! Reserved UL2.0 separator characters.

/// Splits a measure payload into groups.
pub const GROUP: char = '#';

/// Splits a group (or a command tail) into fields.
pub const FIELD: char = '|';

/// Splits a field into key and value.
pub const ASSIGN: char = '=';

/// Splits a command header into device id and command name.
pub const DEVICE_COMMAND: char = '@';

/// Returns true if `c` is one of the reserved separators.
pub fn is_separator(c: char) -> bool {
    matches!(c, GROUP | FIELD | ASSIGN | DEVICE_COMMAND)
}

/// Returns true if `text` contains any reserved separator.
///
/// Such text cannot travel as a key or value without corrupting the payload.
pub fn contains_separator(text: &str) -> bool {
    text.chars().any(is_separator)
}
