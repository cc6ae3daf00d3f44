//! Property source registry
//!
//! Holds the layers of one resolution cycle in load order. Ordering by
//! priority is left to the resolver.

use tracing::debug;

use crate::layer::{PropertyLayer, SourceKind};

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A layer of this source kind is already registered
    #[error("duplicate {kind} layer: '{name}' conflicts with already registered '{existing}'")]
    DuplicateLayer {
        kind: SourceKind,
        name: String,
        existing: String,
    },
}

/// Ordered collection of property layers
#[derive(Debug, Clone, Default)]
pub struct PropertySourceRegistry {
    layers: Vec<PropertyLayer>,
}

impl PropertySourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer
    ///
    /// Fails if a layer of the same source kind was already registered.
    pub fn register(&mut self, layer: PropertyLayer) -> Result<(), RegistryError> {
        if let Some(existing) = self.layers.iter().find(|l| l.kind() == layer.kind()) {
            return Err(RegistryError::DuplicateLayer {
                kind: layer.kind().clone(),
                name: layer.name().to_string(),
                existing: existing.name().to_string(),
            });
        }

        debug!(
            layer = layer.name(),
            kind = %layer.kind(),
            properties = layer.len(),
            "Registered property layer"
        );
        self.layers.push(layer);
        Ok(())
    }

    /// All layers in load order
    pub fn layers(&self) -> &[PropertyLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
