//! Declarative conditions for conditional definition selection.
//!
//! A [`Condition`] is a tagged value describing a predicate over resolved
//! properties, active profiles and previously selected definitions. A small
//! interpreter ([`Condition::evaluate`]) turns it into a [`ConditionOutcome`].

mod context;
mod expr;
mod outcome;

pub use context::ConditionContext;
pub use expr::{ExprError, ProfileExpr};
pub use outcome::{ConditionOutcome, REDACTED};

use serde::{Deserialize, Serialize};

/// A declarative predicate gating whether a candidate definition is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Property is set and has the expected value.
    ///
    /// Without `having_value` any value other than `false` matches.
    /// Comparison is case-insensitive.
    OnProperty {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        having_value: Option<String>,
        #[serde(default)]
        match_if_missing: bool,
    },

    /// Property is not set.
    OnMissingProperty { key: String },

    /// Profile expression holds over the active profiles.
    OnProfile { expression: String },

    /// A definition with this name was selected earlier.
    OnSelected { name: String },

    /// No definition with this name was selected earlier.
    OnMissingSelected { name: String },

    /// Negation.
    Not { condition: Box<Condition> },

    /// Every nested condition holds.
    AllOf { conditions: Vec<Condition> },

    /// At least one nested condition holds.
    AnyOf { conditions: Vec<Condition> },
}

impl Condition {
    /// Property is set and not `false`.
    pub fn on_property(key: impl Into<String>) -> Self {
        Condition::OnProperty {
            key: key.into(),
            having_value: None,
            match_if_missing: false,
        }
    }

    /// Property equals `value` (case-insensitive).
    pub fn property_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::OnProperty {
            key: key.into(),
            having_value: Some(value.into()),
            match_if_missing: false,
        }
    }

    pub fn on_missing_property(key: impl Into<String>) -> Self {
        Condition::OnMissingProperty { key: key.into() }
    }

    /// Profile expression, e.g. `prod` or `prod & !cloud`.
    pub fn on_profile(expression: impl Into<String>) -> Self {
        Condition::OnProfile {
            expression: expression.into(),
        }
    }

    pub fn on_selected(name: impl Into<String>) -> Self {
        Condition::OnSelected { name: name.into() }
    }

    pub fn on_missing_selected(name: impl Into<String>) -> Self {
        Condition::OnMissingSelected { name: name.into() }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }

    /// Check that the condition is well-formed.
    ///
    /// Profile expressions are parsed; nested conditions are checked recursively.
    pub fn validate(&self) -> Result<(), ExprError> {
        match self {
            Condition::OnProfile { expression } => ProfileExpr::parse(expression).map(|_| ()),
            Condition::Not { condition } => condition.validate(),
            Condition::AllOf { conditions } | Condition::AnyOf { conditions } => {
                conditions.iter().try_for_each(Condition::validate)
            }
            _ => Ok(()),
        }
    }

    /// Evaluate the condition against a context.
    ///
    /// Evaluation is pure: the same context always yields the same outcome.
    pub fn evaluate<C>(&self, ctx: &C) -> ConditionOutcome
    where
        C: ConditionContext + ?Sized,
    {
        match self {
            Condition::OnProperty {
                key,
                having_value,
                match_if_missing,
            } => evaluate_property(ctx, key, having_value.as_deref(), *match_if_missing),

            Condition::OnMissingProperty { key } => match ctx.property(key) {
                None => ConditionOutcome::matched(format!("property '{}' is not set", key)),
                Some(value) => ConditionOutcome::no_match(format!(
                    "property '{}' is set to '{}'",
                    key,
                    shown(ctx, key, value)
                )),
            },

            Condition::OnProfile { expression } => match ProfileExpr::parse(expression) {
                Ok(expr) => {
                    if expr.matches(&|p: &str| ctx.is_profile_active(p)) {
                        ConditionOutcome::matched(format!("profiles match '{}'", expression))
                    } else {
                        ConditionOutcome::no_match(format!(
                            "profiles do not match '{}'",
                            expression
                        ))
                    }
                }
                Err(e) => ConditionOutcome::no_match(e.to_string()),
            },

            Condition::OnSelected { name } => {
                if ctx.is_selected(name) {
                    ConditionOutcome::matched(format!("'{}' is selected", name))
                } else {
                    ConditionOutcome::no_match(format!("'{}' is not selected", name))
                }
            }

            Condition::OnMissingSelected { name } => {
                if ctx.is_selected(name) {
                    ConditionOutcome::no_match(format!("'{}' is already selected", name))
                } else {
                    ConditionOutcome::matched(format!("'{}' is not selected", name))
                }
            }

            Condition::Not { condition } => condition.evaluate(ctx).negate(),

            Condition::AllOf { conditions } => {
                let outcomes: Vec<_> = conditions.iter().map(|c| c.evaluate(ctx)).collect();
                let matched = outcomes.iter().all(|o| o.matched);
                ConditionOutcome {
                    matched,
                    message: join_messages("all of", &outcomes),
                }
            }

            Condition::AnyOf { conditions } => {
                let outcomes: Vec<_> = conditions.iter().map(|c| c.evaluate(ctx)).collect();
                let matched = outcomes.iter().any(|o| o.matched);
                ConditionOutcome {
                    matched,
                    message: join_messages("any of", &outcomes),
                }
            }
        }
    }
}

fn evaluate_property<C>(
    ctx: &C,
    key: &str,
    having_value: Option<&str>,
    match_if_missing: bool,
) -> ConditionOutcome
where
    C: ConditionContext + ?Sized,
{
    let Some(value) = ctx.property(key) else {
        return if match_if_missing {
            ConditionOutcome::matched(format!("property '{}' is not set (match_if_missing)", key))
        } else {
            ConditionOutcome::no_match(format!("property '{}' is not set", key))
        };
    };

    let actual = shown(ctx, key, value);
    match having_value {
        None if value.eq_ignore_ascii_case("false") => {
            ConditionOutcome::no_match(format!("property '{}' is 'false'", key))
        }
        None => ConditionOutcome::matched(format!("property '{}' is set", key)),
        Some(expected) if value.eq_ignore_ascii_case(expected) => {
            ConditionOutcome::matched(format!(
                "property '{}' has value '{}'",
                key,
                shown(ctx, key, expected)
            ))
        }
        Some(expected) => ConditionOutcome::no_match(format!(
            "property '{}' is '{}', expected '{}'",
            key,
            actual,
            shown(ctx, key, expected)
        )),
    }
}

/// Value as it may appear in a message
fn shown<'v, C>(ctx: &C, key: &str, value: &'v str) -> &'v str
where
    C: ConditionContext + ?Sized,
{
    if ctx.is_sensitive(key) {
        REDACTED
    } else {
        value
    }
}

fn join_messages(label: &str, outcomes: &[ConditionOutcome]) -> String {
    let parts: Vec<&str> = outcomes.iter().map(|o| o.message.as_str()).collect();
    format!("{} [{}]", label, parts.join("; "))
}
