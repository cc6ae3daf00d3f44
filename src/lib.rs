//! layercfg - layered configuration resolution
//!
//! Merges prioritized property layers into one effective view, activates
//! profiles through profile groups, and selects conditional definitions
//! against the result.

pub mod engine;
pub mod error;
pub mod layer;
pub mod profile;
pub mod registry;
pub mod resolve;
pub mod selector;

pub use engine::{Engine, LiveSnapshot, Snapshot};
pub use error::{Error, Result};
pub use layer::{PropertyLayer, SourceKind};
pub use profile::{activate, ProfileError, ProfileGroups, ProfileSet, DEFAULT_PROFILE};
pub use registry::{PropertySourceRegistry, RegistryError};
pub use resolve::{resolve, EffectiveProperties};
pub use selector::{
    select, ConditionalDefinition, SelectedDefinition, Selection, UnsatisfiableCondition,
};

pub use layercfg_conditions::{Condition, ConditionOutcome};
