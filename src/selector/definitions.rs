//! Definition files
//!
//! Conditional definitions can be declared in TOML:
//!
//! ```toml
//! [[definition]]
//! name = "embeddedDataSource"
//!
//! [[definition.condition]]
//! type = "on_missing_property"
//! key = "datasource.url"
//!
//! [[definition]]
//! name = "pooledDataSource"
//! mandatory = true
//!
//! [[definition.condition]]
//! type = "on_missing_selected"
//! name = "embeddedDataSource"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use layercfg_conditions::ExprError;

use super::ConditionalDefinition;

/// Errors loading definitions
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to read definitions file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse definitions '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("definition #{position} has an empty name")]
    EmptyName { position: usize },

    #[error("definition '{definition}' has an invalid condition: {source}")]
    InvalidCondition {
        definition: String,
        #[source]
        source: ExprError,
    },
}

/// Top-level layout of a definitions file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionFile {
    #[serde(default, rename = "definition")]
    pub definitions: Vec<ConditionalDefinition>,
}

impl DefinitionFile {
    /// Reject empty names and malformed conditions
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for (position, definition) in self.definitions.iter().enumerate() {
            if definition.name.trim().is_empty() {
                return Err(DefinitionError::EmptyName { position });
            }
            definition
                .validate()
                .map_err(|source| DefinitionError::InvalidCondition {
                    definition: definition.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Parse and validate definitions from TOML text
pub fn parse_definitions(
    name: &str,
    contents: &str,
) -> Result<Vec<ConditionalDefinition>, DefinitionError> {
    let file: DefinitionFile = toml::from_str(contents).map_err(|source| DefinitionError::Parse {
        name: name.to_string(),
        source,
    })?;
    file.validate()?;
    Ok(file.definitions)
}

/// Load and validate definitions from a TOML file
pub fn load_definitions(path: &Path) -> Result<Vec<ConditionalDefinition>, DefinitionError> {
    let contents = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definitions = parse_definitions(&path.to_string_lossy(), &contents)?;
    debug!(path = %path.display(), count = definitions.len(), "Loaded definitions");
    Ok(definitions)
}
