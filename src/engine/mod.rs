//! Resolution engine
//!
//! Runs one full resolution cycle:
//!
//! ```text
//! layers ─▶ bootstrap resolve ─▶ profile request ─▶ activate
//!                                                      │
//!        select ◀─ final resolve (active profile files) ◀┘
//! ```
//!
//! The result is an immutable [`Snapshot`]. [`LiveSnapshot`] publishes
//! snapshots atomically for readers that outlive a reload.

mod live;

pub use live::LiveSnapshot;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Error;
use crate::layer::{LayerSource, PropertyLayer};
use crate::profile::{ProfileGroups, ProfileRequest, ProfileSet};
use crate::registry::PropertySourceRegistry;
use crate::resolve::{resolve, EffectiveProperties};
use crate::selector::{select, ConditionalDefinition, Selection};

/// Result of one resolution cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub properties: EffectiveProperties,
    pub profiles: ProfileSet,
    pub selection: Selection,

    /// Layers that took part in the final resolution, in load order
    pub sources: Vec<LayerSource>,
}

/// Inputs of a resolution cycle
#[derive(Debug, Clone, Default)]
pub struct Engine {
    registry: PropertySourceRegistry,
    definitions: Vec<ConditionalDefinition>,
    additional_profiles: Vec<String>,
    groups: ProfileGroups,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer
    pub fn register(&mut self, layer: PropertyLayer) -> Result<(), Error> {
        self.registry.register(layer)?;
        Ok(())
    }

    /// Register a layer, builder style
    pub fn with_layer(mut self, layer: PropertyLayer) -> Result<Self, Error> {
        self.register(layer)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_definitions(mut self, definitions: Vec<ConditionalDefinition>) -> Self {
        self.definitions = definitions;
        self
    }

    /// Profiles requested in addition to `profiles.active`
    #[must_use]
    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_profiles
            .extend(profiles.into_iter().map(Into::into));
        self
    }

    /// Programmatic profile group; a `profiles.group.<name>` property overrides it
    #[must_use]
    pub fn with_group<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .insert(name.into(), members.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve properties, activate profiles and select definitions
    pub fn run(&self) -> Result<Snapshot, Error> {
        let layers = self.registry.layers();

        let bootstrap = resolve(layers.iter().filter(|l| l.kind().profile().is_none()));
        let request = self.profile_request(&bootstrap);
        debug!(requested = ?request.requested, groups = request.groups.len(), "Profile request");

        let profiles = request.activate()?;

        let is_active = |layer: &&PropertyLayer| {
            layer
                .kind()
                .profile()
                .map_or(true, |p| profiles.contains(p))
        };
        let properties = resolve(layers.iter().filter(is_active));
        let sources = layers.iter().filter(is_active).map(PropertyLayer::source).collect();

        let selection = select(&self.definitions, &properties, &profiles);

        info!(
            properties = properties.len(),
            profiles = ?profiles.as_slice(),
            selected = selection.selected.len(),
            unsatisfied = selection.diagnostics.len(),
            "Resolution complete"
        );

        Ok(Snapshot {
            properties,
            profiles,
            selection,
            sources,
        })
    }

    fn profile_request(&self, bootstrap: &EffectiveProperties) -> ProfileRequest {
        let mut request = ProfileRequest::from_properties(bootstrap);
        request
            .requested
            .extend(self.additional_profiles.iter().cloned());
        for (name, members) in &self.groups {
            request
                .groups
                .entry(name.clone())
                .or_insert_with(|| members.clone());
        }
        request
    }
}
