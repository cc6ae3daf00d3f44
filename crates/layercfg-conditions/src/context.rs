//! Evaluation context for conditions.

/// Read-only view a condition is evaluated against.
///
/// Implemented by the selector over the effective properties, the active
/// profile set and the names selected so far.
pub trait ConditionContext {
    /// Value of a resolved property, if set.
    fn property(&self, key: &str) -> Option<&str>;

    /// Whether the given profile is active.
    fn is_profile_active(&self, profile: &str) -> bool;

    /// Whether a definition with this name has already been selected.
    fn is_selected(&self, name: &str) -> bool;

    /// Whether values of this property are hidden in outcome messages.
    fn is_sensitive(&self, _key: &str) -> bool {
        false
    }
}
