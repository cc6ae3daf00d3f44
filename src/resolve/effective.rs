//! Effective properties with provenance
//!
//! The effective view is the flattened result of resolution. Each entry
//! remembers which layer supplied the winning value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::layer::SourceKind;

pub use layercfg_conditions::REDACTED;

/// Key segments that mark a value as secret
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "private_key",
    "private-key",
    "api_key",
    "api-key",
    "credential",
];

/// A winning value and the layer it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub value: String,

    /// Name of the contributing layer
    pub layer: String,

    /// Kind of the contributing layer
    pub kind: SourceKind,
}

/// Read-only merged view of all layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectiveProperties {
    entries: BTreeMap<String, ResolvedValue>,
}

impl EffectiveProperties {
    pub(crate) fn insert(&mut self, key: String, value: ResolvedValue) {
        self.entries.insert(key, value);
    }

    /// Value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.value.as_str())
    }

    /// Value parsed as a boolean (`true`/`false`, case-insensitive)
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?.trim();
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    /// Comma-separated value split into trimmed, non-empty items
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Winning value with its provenance
    pub fn origin(&self, key: &str) -> Option<&ResolvedValue> {
        self.entries.get(key)
    }

    /// Entries whose key starts with `prefix`, in key order
    pub fn keys_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.value.as_str()))
    }

    /// All entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.value.as_str()))
    }

    pub fn entries(&self) -> &BTreeMap<String, ResolvedValue> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with secret values replaced, plus the list of redacted keys
    pub fn redacted(&self) -> (BTreeMap<String, String>, Vec<String>) {
        let mut redactions = Vec::new();
        let values = self
            .iter()
            .map(|(key, value)| {
                if is_secret_key(key) {
                    redactions.push(key.to_string());
                    (key.to_string(), REDACTED.to_string())
                } else {
                    (key.to_string(), value.to_string())
                }
            })
            .collect();
        (values, redactions)
    }
}

/// Whether the last segment of a dotted key looks like a secret
pub(crate) fn is_secret_key(key: &str) -> bool {
    let last = key.rsplit('.').next().unwrap_or(key).to_lowercase();
    SECRET_KEYS.iter().any(|s| last.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, &str)]) -> EffectiveProperties {
        let mut effective = EffectiveProperties::default();
        for (k, v) in entries {
            effective.insert(
                k.to_string(),
                ResolvedValue {
                    value: v.to_string(),
                    layer: "test".to_string(),
                    kind: SourceKind::File,
                },
            );
        }
        effective
    }

    #[test]
    fn test_get_bool() {
        let p = props(&[("a", "TRUE"), ("b", " false "), ("c", "yes")]);
        assert_eq!(p.get_bool("a"), Some(true));
        assert_eq!(p.get_bool("b"), Some(false));
        assert_eq!(p.get_bool("c"), None);
        assert_eq!(p.get_bool("missing"), None);
    }

    #[test]
    fn test_get_list() {
        let p = props(&[("profiles.active", " dev, ,debug ,")]);
        assert_eq!(p.get_list("profiles.active"), vec!["dev", "debug"]);
        assert!(p.get_list("profiles.include").is_empty());
    }

    #[test]
    fn test_keys_with_prefix() {
        let p = props(&[
            ("profiles.active", "dev"),
            ("profiles.group.development", "dev,debug"),
            ("profiles.group.production", "prod"),
            ("profiles.groupie", "x"),
            ("server.port", "8080"),
        ]);

        let groups: Vec<(&str, &str)> = p.keys_with_prefix("profiles.group.").collect();
        assert_eq!(
            groups,
            vec![
                ("profiles.group.development", "dev,debug"),
                ("profiles.group.production", "prod"),
            ]
        );
    }

    #[test]
    fn test_redaction() {
        let p = props(&[
            ("datasource.password", "hunter2"),
            ("auth.token", "abc"),
            ("auth.username", "admin"),
            ("client.API_KEY", "k"),
        ]);

        let (values, redactions) = p.redacted();

        assert_eq!(values["datasource.password"], REDACTED);
        assert_eq!(values["auth.token"], REDACTED);
        assert_eq!(values["client.API_KEY"], REDACTED);
        assert_eq!(values["auth.username"], "admin");
        assert_eq!(redactions.len(), 3);
        assert!(redactions.contains(&"auth.token".to_string()));
    }

    #[test]
    fn test_secret_match_uses_last_segment() {
        assert!(is_secret_key("mail.password"));
        assert!(!is_secret_key("token.ttl"));
    }

    #[test]
    fn test_serializes_as_map() {
        let p = props(&[("server.port", "8080")]);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["server.port"]["value"], "8080");
        assert_eq!(json["server.port"]["layer"], "test");
    }
}
