//! Layer loaders
//!
//! Builds layers from TOML files, command-line arguments and environment
//! variables. Reading happens here, before registration; resolution never
//! touches the filesystem or the process environment.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::{PropertyLayer, SourceKind, COMMAND_LINE_LAYER, ENVIRONMENT_LAYER};

/// Errors raised while building a layer
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{name}': {message}")]
    Parse { name: String, message: String },

    #[error("invalid command-line argument '{0}'")]
    InvalidArgument(String),

    #[error("failed to scan '{path}' for profile files: {message}")]
    Scan { path: PathBuf, message: String },
}

impl PropertyLayer {
    /// Load a TOML file, flattening nested tables to dotted keys
    pub fn from_toml_file(path: &Path, kind: SourceKind) -> Result<Self, LayerError> {
        let bytes = fs::read(path).map_err(|source| LayerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let name = path.to_string_lossy().to_string();
        let contents = String::from_utf8(bytes).map_err(|e| LayerError::Parse {
            name: name.clone(),
            message: format!("invalid UTF-8: {}", e),
        })?;

        let layer = Self::from_toml_str(name, kind, &contents)?.with_origin(path, digest);
        debug!(
            path = %path.display(),
            kind = %layer.kind(),
            properties = layer.len(),
            "Loaded property file"
        );
        Ok(layer)
    }

    /// Parse TOML text into a layer
    pub fn from_toml_str(
        name: impl Into<String>,
        kind: SourceKind,
        contents: &str,
    ) -> Result<Self, LayerError> {
        let name = name.into();
        let table: toml::Table = toml::from_str(contents).map_err(|e| LayerError::Parse {
            name: name.clone(),
            message: e.to_string(),
        })?;

        let mut properties = BTreeMap::new();
        flatten_table("", table, &mut properties);
        Ok(Self::new(name, kind, properties))
    }

    /// Collect `--key=value` options from command-line arguments
    ///
    /// `--flag` alone yields `"true"`. Repeated keys are joined with commas.
    /// Non-option arguments and the bare `--` separator are ignored.
    pub fn from_args<I, S>(args: I) -> Result<Self, LayerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut properties: BTreeMap<String, String> = BTreeMap::new();

        for arg in args {
            let arg = arg.as_ref();
            let Some(option) = arg.strip_prefix("--") else {
                continue;
            };
            if option.is_empty() {
                continue;
            }

            let (key, value) = option.split_once('=').unwrap_or((option, "true"));
            let key = key.trim();
            if key.is_empty() {
                return Err(LayerError::InvalidArgument(arg.to_string()));
            }

            properties
                .entry(key.to_string())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        Ok(Self::new(COMMAND_LINE_LAYER, SourceKind::CommandLine, properties))
    }

    /// Capture environment variables
    ///
    /// Names are kept as-is; the resolver translates them to property keys.
    /// With a prefix, only matching variables are kept and the prefix is removed.
    pub fn from_env<I, K, V>(vars: I, prefix: Option<&str>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let properties = vars.into_iter().filter_map(|(k, v)| {
            let name: String = k.into();
            let name = match prefix {
                Some(p) => name.strip_prefix(p)?.to_string(),
                None => name,
            };
            if name.is_empty() {
                return None;
            }
            let value: String = v.into();
            Some((name, value))
        });

        Self::new(ENVIRONMENT_LAYER, SourceKind::Environment, properties)
    }

    /// Capture the current process environment
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process_env(prefix: Option<&str>) -> Self {
        let vars = std::env::vars_os().filter_map(|(name, value)| {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    let name = name.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
                    debug!(variable = %name, "Skipping non-Unicode environment variable");
                    None
                }
            }
        });
        Self::from_env(vars, prefix)
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn flatten_table(prefix: &str, table: toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        flatten_value(join_key(prefix, &key), value, out);
    }
}

fn flatten_value(key: String, value: toml::Value, out: &mut BTreeMap<String, String>) {
    match value {
        toml::Value::Table(table) => flatten_table(&key, table, out),

        // Arrays of tables are indexed: servers[0].host
        toml::Value::Array(items) if items.iter().any(toml::Value::is_table) => {
            for (i, item) in items.into_iter().enumerate() {
                flatten_value(format!("{}[{}]", key, i), item, out);
            }
        }

        // Scalar arrays become comma-separated lists
        toml::Value::Array(items) => {
            let rendered: Vec<String> = items.into_iter().map(render_scalar).collect();
            out.insert(key, rendered.join(","));
        }

        scalar => {
            out.insert(key, render_scalar(scalar));
        }
    }
}

fn render_scalar(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(items) => items
            .into_iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join(","),
        table @ toml::Value::Table(_) => table.to_string(),
    }
}

/// Find profile-specific siblings of a base file
///
/// For `config/app.toml` this returns every `config/app-<profile>.toml`,
/// sorted by file name.
pub fn discover_profile_files(base: &Path) -> Result<Vec<(String, PathBuf)>, LayerError> {
    let dir = match base.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Some(stem) = base.file_stem().and_then(|s| s.to_str()) else {
        return Ok(Vec::new());
    };
    let extension = base.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let prefix = format!("{}-", stem);

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| LayerError::Scan {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(file_stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(profile) = file_stem.strip_prefix(&prefix) {
            if !profile.is_empty() {
                found.push((profile.to_string(), path.to_path_buf()));
            }
        }
    }

    Ok(found)
}
