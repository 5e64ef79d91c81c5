//! Binding registry and dispatcher.
//!
//! The [`BindingCatalog`] maps binding names to factories and is declared
//! explicitly at compile time. A [`BindingRegistry`] is built from the
//! catalog for one agent run and owns the active bindings:
//! - `start_all` / `stop_all` drive every binding concurrently
//! - `broadcast` hands an event to each interested binding, in order,
//!   stopping at the first failure

pub mod catalog;
pub mod error;
pub mod registry;

pub use catalog::{BindingCatalog, BindingFactory};
pub use error::{RegistryError, Result};
pub use registry::BindingRegistry;
