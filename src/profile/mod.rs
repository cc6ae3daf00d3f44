//! Profile activation
//!
//! Expands requested profile names through profile groups into the set of
//! active profiles. A request with no names activates [`DEFAULT_PROFILE`].
//!
//! Profile requests are read from well-known properties:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `profiles.active` | comma-separated profiles to activate |
//! | `profiles.include` | comma-separated profiles added after the active ones |
//! | `profiles.group.<name>` | comma-separated members of group `<name>` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::resolve::EffectiveProperties;

/// Profile active when nothing was requested
pub const DEFAULT_PROFILE: &str = "default";

/// Property listing active profiles
pub const ACTIVE_PROFILES_KEY: &str = "profiles.active";

/// Property listing additionally included profiles
pub const INCLUDE_PROFILES_KEY: &str = "profiles.include";

/// Prefix of profile group definitions
pub const GROUP_PREFIX: &str = "profiles.group.";

/// Group name to member names
pub type ProfileGroups = BTreeMap<String, Vec<String>>;

/// Profile activation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// Group expansion revisited a group on the current path
    #[error("cyclic profile group: {}", .cycle.join(" -> "))]
    CyclicGroup { cycle: Vec<String> },
}

/// The set of active profiles
///
/// Membership is order-independent; insertion order is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSet {
    profiles: Vec<String>,
}

impl ProfileSet {
    fn from_ordered(profiles: Vec<String>) -> Self {
        Self { profiles }
    }

    /// A set holding only the default profile
    pub fn default_only() -> Self {
        Self::from_ordered(vec![DEFAULT_PROFILE.to_string()])
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.profiles.iter().any(|p| p == profile)
    }

    /// Profiles in activation order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Only the default profile is active
    pub fn is_default(&self) -> bool {
        self.profiles.len() == 1 && self.profiles[0] == DEFAULT_PROFILE
    }
}

/// Requested profile names and group definitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRequest {
    pub requested: Vec<String>,
    pub groups: ProfileGroups,
}

impl ProfileRequest {
    /// Read `profiles.active`, `profiles.include` and `profiles.group.*`
    pub fn from_properties(props: &EffectiveProperties) -> Self {
        let mut requested = props.get_list(ACTIVE_PROFILES_KEY);
        requested.extend(props.get_list(INCLUDE_PROFILES_KEY));

        let groups = props
            .keys_with_prefix(GROUP_PREFIX)
            .filter_map(|(key, _)| {
                let name = &key[GROUP_PREFIX.len()..];
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), props.get_list(key)))
                }
            })
            .collect();

        Self { requested, groups }
    }

    /// Expand the request into the active profile set
    pub fn activate(&self) -> Result<ProfileSet, ProfileError> {
        activate(&self.requested, &self.groups)
    }
}

/// Expand requested names through groups.
///
/// A name matching a group is replaced by the group's members, recursively;
/// any other name is a literal profile. Duplicates keep their first position.
/// Fails if a group is revisited on the current expansion path.
pub fn activate<S: AsRef<str>>(
    requested: &[S],
    groups: &ProfileGroups,
) -> Result<ProfileSet, ProfileError> {
    if requested.is_empty() {
        debug!("No profiles requested, activating default profile");
        return Ok(ProfileSet::default_only());
    }

    let mut active = Vec::new();
    let mut path = Vec::new();
    for name in requested {
        expand(name.as_ref(), groups, &mut path, &mut active)?;
    }

    if active.is_empty() {
        debug!("Requested groups expanded to no profiles, activating default profile");
        return Ok(ProfileSet::default_only());
    }

    debug!(profiles = ?active, "Activated profiles");
    Ok(ProfileSet::from_ordered(active))
}

fn expand(
    name: &str,
    groups: &ProfileGroups,
    path: &mut Vec<String>,
    active: &mut Vec<String>,
) -> Result<(), ProfileError> {
    let Some(members) = groups.get(name) else {
        if !active.iter().any(|p| p == name) {
            active.push(name.to_string());
        }
        return Ok(());
    };

    if path.iter().any(|p| p == name) {
        let mut cycle = path.clone();
        cycle.push(name.to_string());
        return Err(ProfileError::CyclicGroup { cycle });
    }

    path.push(name.to_string());
    for member in members {
        expand(member, groups, path, active)?;
    }
    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{PropertyLayer, SourceKind};
    use crate::resolve::resolve;

    fn groups(entries: &[(&str, &[&str])]) -> ProfileGroups {
        entries
            .iter()
            .map(|(name, members)| {
                (
                    name.to_string(),
                    members.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_request_activates_default() {
        let set = activate::<&str>(&[], &ProfileGroups::new()).unwrap();
        assert!(set.contains(DEFAULT_PROFILE));
        assert!(set.is_default());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_literal_profiles() {
        let set = activate(&["prod", "eu"], &ProfileGroups::new()).unwrap();
        assert_eq!(set.as_slice(), &["prod".to_string(), "eu".to_string()]);
        assert!(!set.contains(DEFAULT_PROFILE));
    }

    #[test]
    fn test_group_expansion() {
        let g = groups(&[("development", &["dev", "debug"])]);
        let set = activate(&["development"], &g).unwrap();

        assert!(set.contains("dev"));
        assert!(set.contains("debug"));
        assert!(!set.contains("development"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_transitive_expansion_and_dedup() {
        let g = groups(&[
            ("local", &["development", "h2"]),
            ("development", &["dev", "debug"]),
        ]);
        let set = activate(&["debug", "local"], &g).unwrap();

        let order: Vec<&str> = set.iter().collect();
        assert_eq!(order, vec!["debug", "dev", "h2"]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let g = groups(&[
            ("all", &["left", "right"]),
            ("left", &["common"]),
            ("right", &["common"]),
            ("common", &["base"]),
        ]);
        let set = activate(&["all"], &g).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["base"]);
    }

    #[test]
    fn test_cycle_detected() {
        let g = groups(&[("a", &["b"]), ("b", &["a"])]);
        let err = activate(&["a"], &g).unwrap_err();

        assert_eq!(
            err,
            ProfileError::CyclicGroup {
                cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            }
        );
        assert_eq!(err.to_string(), "cyclic profile group: a -> b -> a");
    }

    #[test]
    fn test_self_cycle() {
        let g = groups(&[("loop", &["x", "loop"])]);
        assert!(matches!(
            activate(&["loop"], &g),
            Err(ProfileError::CyclicGroup { .. })
        ));
    }

    #[test]
    fn test_empty_group_falls_back_to_default() {
        let g = groups(&[("nothing", &[])]);
        let set = activate(&["nothing"], &g).unwrap();
        assert!(set.is_default());
    }

    #[test]
    fn test_request_from_properties() {
        let layers = vec![
            PropertyLayer::new(
                "application.toml",
                SourceKind::File,
                [
                    ("profiles.active", "development"),
                    ("profiles.include", "metrics"),
                    ("profiles.group.development", "dev, debug"),
                ],
            ),
            PropertyLayer::from_env([("PROFILES_ACTIVE", "production")], None),
        ];
        let props = resolve(&layers);
        let request = ProfileRequest::from_properties(&props);

        assert_eq!(request.requested, vec!["production", "metrics"]);
        assert_eq!(request.groups["development"], vec!["dev", "debug"]);

        let set = request.activate().unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["production", "metrics"]);
    }
}
