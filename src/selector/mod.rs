//! Conditional definition selection
//!
//! Definitions are evaluated in declaration order. A definition is selected
//! when every one of its conditions holds against the effective properties,
//! the active profiles and the definitions selected before it. Later
//! definitions can therefore exclude themselves when an earlier alternative
//! was chosen.

mod definitions;
mod report;

pub use definitions::{load_definitions, parse_definitions, DefinitionError, DefinitionFile};
pub use report::{ReportEntry, SelectionReport};

use layercfg_conditions::{Condition, ConditionContext, ConditionOutcome, ExprError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::profile::ProfileSet;
use crate::resolve::{is_secret_key, EffectiveProperties};

/// A named candidate gated by conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalDefinition {
    pub name: String,

    /// All must hold for the definition to be selected
    #[serde(default, rename = "condition", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Report a diagnostic when the definition is not selected
    #[serde(default)]
    pub mandatory: bool,
}

impl ConditionalDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            mandatory: false,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Check every condition is well-formed
    pub fn validate(&self) -> Result<(), ExprError> {
        self.conditions.iter().try_for_each(Condition::validate)
    }
}

/// A definition chosen by [`select`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDefinition {
    pub name: String,

    /// Index in the declaration list
    pub position: usize,
}

/// What happened to a definition during selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionStatus {
    Selected,
    NotMatched,
    /// An earlier definition with the same name was selected
    AlreadySelected,
}

/// Evaluation record for one definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEvaluation {
    pub name: String,
    pub position: usize,
    pub mandatory: bool,
    pub status: DefinitionStatus,

    /// One outcome per condition, in declaration order
    pub outcomes: Vec<ConditionOutcome>,
}

/// A mandatory definition whose conditions could not all be satisfied
///
/// Produced when a mandatory definition is left unselected because at least
/// one of its conditions failed, unless a same-named definition was selected
/// instead. Reported alongside the selection; never aborts selection of
/// other definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("mandatory definition '{definition}' is unsatisfiable: {}", .failed.join("; "))]
pub struct UnsatisfiableCondition {
    pub definition: String,

    /// Messages of the conditions that did not hold
    pub failed: Vec<String>,
}

/// Result of a selection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected definitions in declaration order
    pub selected: Vec<SelectedDefinition>,

    /// Per-definition evaluation records
    pub evaluations: Vec<DefinitionEvaluation>,

    /// Unsatisfied mandatory definitions
    pub diagnostics: Vec<UnsatisfiableCondition>,
}

impl Selection {
    /// Names of selected definitions in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.selected.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s.name == name)
    }

    /// No mandatory definition was left unsatisfied
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

struct SelectionContext<'a> {
    props: &'a EffectiveProperties,
    profiles: &'a ProfileSet,
    selected: &'a BTreeSet<String>,
}

impl ConditionContext for SelectionContext<'_> {
    fn property(&self, key: &str) -> Option<&str> {
        self.props.get(key)
    }

    fn is_profile_active(&self, profile: &str) -> bool {
        self.profiles.contains(profile)
    }

    fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    fn is_sensitive(&self, key: &str) -> bool {
        is_secret_key(key)
    }
}

/// Evaluate definitions in declaration order.
///
/// Deterministic: identical inputs always yield the identical selection.
pub fn select(
    definitions: &[ConditionalDefinition],
    props: &EffectiveProperties,
    profiles: &ProfileSet,
) -> Selection {
    let mut selected_names = BTreeSet::new();
    let mut selected = Vec::new();
    let mut evaluations = Vec::with_capacity(definitions.len());

    for (position, definition) in definitions.iter().enumerate() {
        if selected_names.contains(&definition.name) {
            debug!(definition = %definition.name, position, "Skipping already selected definition");
            evaluations.push(DefinitionEvaluation {
                name: definition.name.clone(),
                position,
                mandatory: definition.mandatory,
                status: DefinitionStatus::AlreadySelected,
                outcomes: Vec::new(),
            });
            continue;
        }

        // Every condition is evaluated so the report is complete
        let outcomes: Vec<ConditionOutcome> = {
            let ctx = SelectionContext {
                props,
                profiles,
                selected: &selected_names,
            };
            definition
                .conditions
                .iter()
                .map(|c| c.evaluate(&ctx))
                .collect()
        };
        let matched = outcomes.iter().all(|o| o.matched);

        let status = if matched {
            selected_names.insert(definition.name.clone());
            selected.push(SelectedDefinition {
                name: definition.name.clone(),
                position,
            });
            DefinitionStatus::Selected
        } else {
            DefinitionStatus::NotMatched
        };
        debug!(definition = %definition.name, position, ?status, "Evaluated definition");

        evaluations.push(DefinitionEvaluation {
            name: definition.name.clone(),
            position,
            mandatory: definition.mandatory,
            status,
            outcomes,
        });
    }

    let diagnostics: Vec<UnsatisfiableCondition> = evaluations
        .iter()
        .filter(|e| {
            e.mandatory
                && e.status == DefinitionStatus::NotMatched
                && !selected_names.contains(&e.name)
        })
        .map(|e| UnsatisfiableCondition {
            definition: e.name.clone(),
            failed: e
                .outcomes
                .iter()
                .filter(|o| !o.matched)
                .map(|o| o.message.clone())
                .collect(),
        })
        .collect();

    for diagnostic in &diagnostics {
        warn!(definition = %diagnostic.definition, "{}", diagnostic);
    }

    Selection {
        selected,
        evaluations,
        diagnostics,
    }
}
