/// Errors building a binding registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The configuration names a binding the catalog does not know.
    #[error("unknown binding: {0}")]
    UnknownBinding(String),

    /// The configuration names the same binding twice.
    #[error("binding listed more than once: {0}")]
    DuplicateBinding(String),

    /// Neither the configuration nor the catalog provides any binding.
    #[error("no bindings configured")]
    NoBindings,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
