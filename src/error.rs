//! Crate-level error type

use crate::layer::LayerError;
use crate::profile::ProfileError;
use crate::registry::RegistryError;
use crate::selector::DefinitionError;

/// Errors that abort a resolution cycle
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

pub type Result<T> = std::result::Result<T, Error>;
