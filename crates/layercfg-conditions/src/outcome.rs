//! Condition outcome types.

use serde::{Deserialize, Serialize};

/// Stand-in for sensitive values in outcome messages.
pub const REDACTED: &str = "[REDACTED]";

/// Result of evaluating a single condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    /// Whether the condition holds.
    pub matched: bool,

    /// Human-readable explanation of the decision.
    pub message: String,
}

impl ConditionOutcome {
    /// Create a matching outcome.
    pub fn matched(message: impl Into<String>) -> Self {
        Self {
            matched: true,
            message: message.into(),
        }
    }

    /// Create a non-matching outcome.
    pub fn no_match(message: impl Into<String>) -> Self {
        Self {
            matched: false,
            message: message.into(),
        }
    }

    /// Invert the outcome, keeping the explanation.
    pub fn negate(self) -> Self {
        Self {
            matched: !self.matched,
            message: format!("not ({})", self.message),
        }
    }
}
