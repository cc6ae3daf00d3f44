//! Layer merge logic

use std::cmp::Reverse;
use tracing::debug;

use super::effective::{EffectiveProperties, ResolvedValue};
use crate::layer::{PropertyLayer, SourceKind};

/// Translate an environment variable name to a property key.
///
/// Lowercases and maps `_` to `.`: `SERVER_PORT` → `server.port`.
pub fn translate_env_key(name: &str) -> String {
    name.to_lowercase().replace('_', ".")
}

/// Merge layers by fixed priority into one effective view.
///
/// Pure and deterministic: the same layers always produce the same result.
///
/// Accepts any collection of layer references, so callers can pass a slice
/// or a filtered iterator.
pub fn resolve<'a, I>(layers: I) -> EffectiveProperties
where
    I: IntoIterator<Item = &'a PropertyLayer>,
{
    let mut ordered: Vec<&PropertyLayer> = layers.into_iter().collect();
    let layer_count = ordered.len();

    // Lowest priority first so higher ranks overwrite. The sort is stable,
    // so within a rank later registrations are applied last and win.
    ordered.sort_by_key(|layer| Reverse(layer.rank()));

    let mut effective = EffectiveProperties::default();
    for layer in ordered {
        let translate = *layer.kind() == SourceKind::Environment;
        for (key, value) in layer.properties() {
            let key = if translate {
                translate_env_key(key)
            } else {
                key.clone()
            };
            effective.insert(
                key,
                ResolvedValue {
                    value: value.clone(),
                    layer: layer.name().to_string(),
                    kind: layer.kind().clone(),
                },
            );
        }
    }

    debug!(
        layers = layer_count,
        properties = effective.len(),
        "Resolved effective properties"
    );
    effective
}
