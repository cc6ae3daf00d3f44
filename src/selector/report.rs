//! Condition evaluation report
//!
//! Structured JSON and human-readable rendering of a selection run, split
//! into positive and negative matches.

use chrono::{DateTime, Utc};
use layercfg_conditions::ConditionOutcome;
use serde::{Deserialize, Serialize};

use super::{DefinitionStatus, Selection, UnsatisfiableCondition};
use crate::profile::ProfileSet;

/// Schema version for the selection report
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "layercfg/selection_report@1";

/// One definition in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub position: usize,
    pub mandatory: bool,
    pub outcomes: Vec<ConditionOutcome>,
}

/// Condition evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,

    /// Active profiles in activation order
    pub active_profiles: Vec<String>,

    /// Selected definition names in declaration order
    pub selected: Vec<String>,

    pub positive_matches: Vec<ReportEntry>,
    pub negative_matches: Vec<ReportEntry>,

    /// Duplicates skipped because the name was already selected
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ReportEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsatisfied: Vec<UnsatisfiableCondition>,
}

impl SelectionReport {
    pub fn new(selection: &Selection, profiles: &ProfileSet) -> Self {
        let mut positive_matches = Vec::new();
        let mut negative_matches = Vec::new();
        let mut skipped = Vec::new();

        for evaluation in &selection.evaluations {
            let entry = ReportEntry {
                name: evaluation.name.clone(),
                position: evaluation.position,
                mandatory: evaluation.mandatory,
                outcomes: evaluation.outcomes.clone(),
            };
            match evaluation.status {
                DefinitionStatus::Selected => positive_matches.push(entry),
                DefinitionStatus::NotMatched => negative_matches.push(entry),
                DefinitionStatus::AlreadySelected => skipped.push(entry),
            }
        }

        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            active_profiles: profiles.iter().map(str::to_string).collect(),
            selected: selection.names().into_iter().map(str::to_string).collect(),
            positive_matches,
            negative_matches,
            skipped,
            unsatisfied: selection.diagnostics.clone(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render for terminal output
    pub fn to_human(&self) -> String {
        let mut lines = Vec::new();

        lines.push("CONDITION EVALUATION REPORT".to_string());
        lines.push("===========================".to_string());
        lines.push(String::new());
        lines.push(format!("Active profiles: {}", self.active_profiles.join(", ")));
        lines.push(String::new());

        push_section(&mut lines, "Positive matches:", &self.positive_matches);
        push_section(&mut lines, "Negative matches:", &self.negative_matches);
        if !self.skipped.is_empty() {
            push_section(&mut lines, "Skipped (already selected):", &self.skipped);
        }

        if !self.unsatisfied.is_empty() {
            lines.push("Unsatisfied mandatory definitions:".to_string());
            lines.push("----------------------------------".to_string());
            for diagnostic in &self.unsatisfied {
                lines.push(format!("   {}", diagnostic.definition));
                for message in &diagnostic.failed {
                    lines.push(format!("      - {}", message));
                }
            }
            lines.push(String::new());
        }

        lines.push(format!("Selected: {}", self.selected.join(", ")));
        lines.join("\n")
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, entries: &[ReportEntry]) {
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));

    if entries.is_empty() {
        lines.push("   None".to_string());
    }
    for entry in entries {
        let marker = if entry.mandatory { " (mandatory)" } else { "" };
        lines.push(format!("   {}{}", entry.name, marker));
        if entry.outcomes.is_empty() {
            lines.push("      - no conditions".to_string());
        }
        for outcome in &entry.outcomes {
            lines.push(format!("      - {}", outcome.message));
        }
    }
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{activate, ProfileGroups};
    use crate::resolve::EffectiveProperties;
    use crate::selector::{select, ConditionalDefinition};
    use layercfg_conditions::Condition;

    fn report(profiles: &[&str]) -> SelectionReport {
        let defs = vec![
            ConditionalDefinition::new("A").with_condition(Condition::on_profile("prod")),
            ConditionalDefinition::new("B").with_condition(Condition::on_missing_selected("A")),
            ConditionalDefinition::new("B"),
            ConditionalDefinition::new("C")
                .with_condition(Condition::on_property("c.enabled"))
                .mandatory(),
        ];
        let set = activate(profiles, &ProfileGroups::new()).unwrap();
        let selection = select(&defs, &EffectiveProperties::default(), &set);
        SelectionReport::new(&selection, &set)
    }

    #[test]
    fn test_report_split() {
        let report = report(&["dev"]);

        assert_eq!(report.selected, vec!["B"]);
        assert_eq!(report.positive_matches.len(), 1);
        assert_eq!(report.negative_matches.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.unsatisfied.len(), 1);
        assert_eq!(report.active_profiles, vec!["dev"]);
    }

    #[test]
    fn test_report_json() {
        let json: serde_json::Value =
            serde_json::from_str(&report(&["prod"]).to_json().unwrap()).unwrap();

        assert_eq!(json["schema_id"], SCHEMA_ID);
        assert_eq!(json["selected"][0], "A");
        assert!(json["created_at"].is_string());
        assert_eq!(json["unsatisfied"][0]["definition"], "C");
    }

    #[test]
    fn test_report_human() {
        let text = report(&["dev"]).to_human();

        assert!(text.contains("Active profiles: dev"));
        assert!(text.contains("Positive matches:"));
        assert!(text.contains("   B\n      - 'A' is not selected"));
        assert!(text.contains("   C (mandatory)"));
        assert!(text.contains("Unsatisfied mandatory definitions:"));
        assert!(text.ends_with("Selected: B"));
    }
}
