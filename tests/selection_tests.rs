//! Selection integration tests
//!
//! Definitions loaded from TOML and evaluated through a full engine run.

use layercfg::selector::{parse_definitions, SelectionReport};
use layercfg::{
    activate, select, Condition, ConditionalDefinition, Engine, ProfileGroups, PropertyLayer,
    SourceKind,
};

const DATASOURCES: &str = r#"
[[definition]]
name = "primaryDataSource"

[[definition.condition]]
type = "on_property"
key = "datasource.url"

[[definition]]
name = "embeddedDataSource"

[[definition.condition]]
type = "on_missing_selected"
name = "primaryDataSource"

[[definition.condition]]
type = "on_profile"
expression = "!prod"

[[definition]]
name = "dataSourceHealth"
mandatory = true

[[definition.condition]]
type = "any_of"
conditions = [
    { type = "on_selected", name = "primaryDataSource" },
    { type = "on_selected", name = "embeddedDataSource" },
]
"#;

fn exclusive_pair() -> Vec<ConditionalDefinition> {
    vec![
        ConditionalDefinition::new("A").with_condition(Condition::on_profile("prod")),
        ConditionalDefinition::new("B").with_condition(Condition::on_missing_selected("A")),
    ]
}

#[test]
fn test_mutual_exclusion_with_dev_profile() {
    let profiles = activate(&["dev"], &ProfileGroups::new()).unwrap();
    let selection = select(&exclusive_pair(), &Default::default(), &profiles);
    assert_eq!(selection.names(), vec!["B"]);
}

#[test]
fn test_mutual_exclusion_with_prod_profile() {
    let profiles = activate(&["prod"], &ProfileGroups::new()).unwrap();
    let selection = select(&exclusive_pair(), &Default::default(), &profiles);
    assert_eq!(selection.names(), vec!["A"]);
}

#[test]
fn test_embedded_fallback_in_dev() {
    let engine = Engine::new()
        .with_profiles(["dev"])
        .with_definitions(parse_definitions("datasources.toml", DATASOURCES).unwrap());

    let snapshot = engine.run().unwrap();

    assert_eq!(
        snapshot.selection.names(),
        vec!["embeddedDataSource", "dataSourceHealth"]
    );
    assert!(snapshot.selection.is_complete());
}

#[test]
fn test_primary_wins_when_url_set() {
    let engine = Engine::new()
        .with_layer(
            PropertyLayer::from_args(["--datasource.url=jdbc:postgresql://db/app"]).unwrap(),
        )
        .unwrap()
        .with_definitions(parse_definitions("datasources.toml", DATASOURCES).unwrap());

    let snapshot = engine.run().unwrap();

    assert_eq!(
        snapshot.selection.names(),
        vec!["primaryDataSource", "dataSourceHealth"]
    );
}

#[test]
fn test_prod_without_url_is_unsatisfied() {
    let engine = Engine::new()
        .with_layer(PropertyLayer::new(
            "application.toml",
            SourceKind::File,
            [("profiles.active", "prod")],
        ))
        .unwrap()
        .with_definitions(parse_definitions("datasources.toml", DATASOURCES).unwrap());

    let snapshot = engine.run().unwrap();

    assert!(snapshot.selection.names().is_empty());
    assert_eq!(snapshot.selection.diagnostics.len(), 1);
    assert_eq!(snapshot.selection.diagnostics[0].definition, "dataSourceHealth");

    let report = SelectionReport::new(&snapshot.selection, &snapshot.profiles);
    assert_eq!(report.negative_matches.len(), 3);
    assert!(report.to_human().contains("Unsatisfied mandatory definitions:"));
}

#[test]
fn test_selection_repeatable_across_runs() {
    let engine = Engine::new()
        .with_profiles(["dev", "eu"])
        .with_definitions(parse_definitions("datasources.toml", DATASOURCES).unwrap());

    let first = engine.run().unwrap().selection;
    let second = engine.run().unwrap().selection;
    assert_eq!(first, second);
}

#[test]
fn test_report_hides_secret_values() {
    let engine = Engine::new()
        .with_layer(PropertyLayer::new(
            "application.toml",
            SourceKind::File,
            [("datasource.password", "hunter2")],
        ))
        .unwrap()
        .with_definitions(vec![
            ConditionalDefinition::new("embedded")
                .with_condition(Condition::on_missing_property("datasource.password")),
            ConditionalDefinition::new("pooled")
                .with_condition(Condition::property_equals("datasource.password", "nope"))
                .mandatory(),
        ]);

    let snapshot = engine.run().unwrap();
    let report = SelectionReport::new(&snapshot.selection, &snapshot.profiles);

    let human = report.to_human();
    let json = report.to_json().unwrap();
    for text in [&human, &json] {
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("nope"));
        assert!(text.contains("[REDACTED]"));
    }
    assert!(snapshot.selection.diagnostics[0]
        .to_string()
        .contains("[REDACTED]"));
}
