//! layercfg CLI
//!
//! Entry point for the `layercfg` command-line tool.

use clap::{Args, Parser, Subcommand};
use layercfg::layer::discover_profile_files;
use layercfg::selector::{load_definitions, ConditionalDefinition, SelectionReport};
use layercfg::{Engine, PropertyLayer, Snapshot, SourceKind};
use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "LAYERCFG_LOG";

/// Exit code when a mandatory definition is unsatisfied
const EXIT_UNSATISFIED: i32 = 2;

#[derive(Parser)]
#[command(name = "layercfg")]
#[command(about = "Layered configuration resolution", version)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where properties come from
#[derive(Args)]
struct SourceArgs {
    /// TOML file with programmatic defaults (lowest priority)
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Base TOML config file; sibling <stem>-<profile>.toml files are profile layers
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Include process environment variables
    #[arg(long)]
    env: bool,

    /// Only use environment variables with this prefix (stripped)
    #[arg(long, requires = "env")]
    env_prefix: Option<String>,

    /// Additional profile to activate (repeatable)
    #[arg(long = "profile", short = 'p', value_name = "NAME")]
    profiles: Vec<String>,

    /// Command-line properties (after --), e.g. -- --server.port=9090
    #[arg(last = true)]
    properties: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective properties
    Resolve {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print a single key
        #[arg(long, short = 'k')]
        key: Option<String>,

        /// Show which layer supplied each value
        #[arg(long)]
        show_origin: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the active profiles
    Profiles {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Evaluate conditional definitions and print the evaluation report
    Select {
        #[command(flatten)]
        sources: SourceArgs,

        /// TOML file with [[definition]] entries
        #[arg(long, short = 'd')]
        definitions: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Resolve {
            sources,
            key,
            show_origin,
            json,
        } => run_resolve(&sources, key.as_deref(), show_origin, json),
        Commands::Profiles { sources, json } => run_profiles(&sources, json),
        Commands::Select {
            sources,
            definitions,
            json,
        } => run_select(&sources, definitions, json),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print an error and exit with status 1
fn or_exit<T, E: Display>(result: Result<T, E>, context: &str) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("{}: {}", context, e);
        process::exit(1);
    })
}

fn build_engine(sources: &SourceArgs) -> Result<Engine, layercfg::Error> {
    let mut engine = Engine::new().with_profiles(sources.profiles.iter().cloned());

    if let Some(ref path) = sources.defaults {
        engine.register(PropertyLayer::from_toml_file(path, SourceKind::Defaults)?)?;
    }

    if let Some(ref path) = sources.config {
        engine.register(PropertyLayer::from_toml_file(path, SourceKind::File)?)?;
        for (profile, profile_path) in discover_profile_files(path)? {
            let kind = SourceKind::profile_file(profile);
            engine.register(PropertyLayer::from_toml_file(&profile_path, kind)?)?;
        }
    }

    if sources.env {
        engine.register(PropertyLayer::from_process_env(sources.env_prefix.as_deref()))?;
    }

    if !sources.properties.is_empty() {
        engine.register(PropertyLayer::from_args(&sources.properties)?)?;
    }

    Ok(engine)
}

fn run_engine(sources: &SourceArgs, definitions: Vec<ConditionalDefinition>) -> Snapshot {
    let engine = or_exit(build_engine(sources), "Error loading configuration");
    or_exit(
        engine.with_definitions(definitions).run(),
        "Error resolving configuration",
    )
}

fn print_json(value: &impl serde::Serialize) {
    let json = or_exit(serde_json::to_string_pretty(value), "Error serializing output");
    println!("{}", json);
}

fn run_resolve(sources: &SourceArgs, key: Option<&str>, show_origin: bool, json_output: bool) {
    let snapshot = run_engine(sources, Vec::new());
    let (values, redactions) = snapshot.properties.redacted();

    if let Some(key) = key {
        let Some(value) = values.get(key) else {
            eprintln!("Property '{}' is not set", key);
            process::exit(1);
        };

        if json_output {
            let origin = snapshot.properties.origin(key);
            print_json(&serde_json::json!({
                "key": key,
                "value": value,
                "layer": origin.map(|o| o.layer.as_str()),
                "kind": origin.map(|o| o.kind.to_string()),
            }));
        } else if show_origin {
            let layer = snapshot
                .properties
                .origin(key)
                .map(|o| o.layer.as_str())
                .unwrap_or("?");
            println!("{}  [{}]", value, layer);
        } else {
            println!("{}", value);
        }
        return;
    }

    if json_output {
        let properties: serde_json::Map<String, serde_json::Value> = values
            .iter()
            .map(|(k, v)| {
                let entry = if show_origin {
                    let origin = snapshot.properties.origin(k);
                    serde_json::json!({
                        "value": v,
                        "layer": origin.map(|o| o.layer.as_str()),
                        "kind": origin.map(|o| o.kind.to_string()),
                    })
                } else {
                    serde_json::Value::String(v.clone())
                };
                (k.clone(), entry)
            })
            .collect();

        print_json(&serde_json::json!({
            "profiles": snapshot.profiles,
            "properties": properties,
            "sources": snapshot.sources,
            "redactions": redactions,
        }));
        return;
    }

    if values.is_empty() {
        println!("No properties resolved.");
        return;
    }

    for (k, v) in &values {
        if show_origin {
            let layer = snapshot
                .properties
                .origin(k)
                .map(|o| o.layer.as_str())
                .unwrap_or("?");
            println!("{} = {}  [{}]", k, v, layer);
        } else {
            println!("{} = {}", k, v);
        }
    }
}

fn run_profiles(sources: &SourceArgs, json_output: bool) {
    let snapshot = run_engine(sources, Vec::new());

    if json_output {
        print_json(&serde_json::json!({
            "active": snapshot.profiles,
            "default_only": snapshot.profiles.is_default(),
        }));
        return;
    }

    println!("Active profiles ({}):", snapshot.profiles.len());
    for profile in snapshot.profiles.iter() {
        println!("  {}", profile);
    }
}

fn run_select(sources: &SourceArgs, definitions_path: PathBuf, json_output: bool) {
    let definitions = or_exit(load_definitions(&definitions_path), "Error loading definitions");
    let snapshot = run_engine(sources, definitions);
    let report = SelectionReport::new(&snapshot.selection, &snapshot.profiles);

    if json_output {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", report.to_human());
    }

    if !snapshot.selection.is_complete() {
        process::exit(EXIT_UNSATISFIED);
    }
}
