//! Property layers
//!
//! A layer is one named source of key/value properties (command line,
//! environment, profile-specific file, base file or programmatic defaults)
//! tagged with a fixed priority rank. Layers are immutable once built.

mod loader;

pub use loader::{discover_profile_files, LayerError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Layer name used for command-line properties
pub const COMMAND_LINE_LAYER: &str = "commandLineArgs";

/// Layer name used for process environment properties
pub const ENVIRONMENT_LAYER: &str = "systemEnvironment";

/// Kind of source a layer was loaded from
///
/// The kind fixes the layer's priority. Each kind contributes at most one
/// layer per resolution cycle; profile files are distinguished by profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    CommandLine,
    Environment,
    ProfileFile { profile: String },
    File,
    Defaults,
}

impl SourceKind {
    /// Priority rank, 1 is highest
    pub fn rank(&self) -> u8 {
        match self {
            SourceKind::CommandLine => 1,
            SourceKind::Environment => 2,
            SourceKind::ProfileFile { .. } => 3,
            SourceKind::File => 4,
            SourceKind::Defaults => 5,
        }
    }

    /// Profile a profile-specific layer belongs to
    pub fn profile(&self) -> Option<&str> {
        match self {
            SourceKind::ProfileFile { profile } => Some(profile),
            _ => None,
        }
    }

    pub fn profile_file(profile: impl Into<String>) -> Self {
        SourceKind::ProfileFile {
            profile: profile.into(),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::CommandLine => write!(f, "command_line"),
            SourceKind::Environment => write!(f, "environment"),
            SourceKind::ProfileFile { profile } => write!(f, "profile_file[{}]", profile),
            SourceKind::File => write!(f, "file"),
            SourceKind::Defaults => write!(f, "defaults"),
        }
    }
}

/// An immutable, named set of properties from a single source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLayer {
    name: String,
    kind: SourceKind,
    properties: BTreeMap<String, String>,
    path: Option<PathBuf>,
    digest: Option<String>,
}

/// Provenance summary of a contributing layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSource {
    /// Layer name
    pub name: String,

    /// Source kind
    #[serde(flatten)]
    pub kind: SourceKind,

    /// File path (None for command line, environment and programmatic layers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Number of properties the layer carries
    pub property_count: usize,
}

impl PropertyLayer {
    /// Build a layer from in-memory properties
    pub fn new<I, K, V>(name: impl Into<String>, kind: SourceKind, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            path: None,
            digest: None,
        }
    }

    /// Programmatic defaults layer
    pub fn defaults<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new("defaultProperties", SourceKind::Defaults, properties)
    }

    pub(crate) fn with_origin(mut self, path: &Path, digest: String) -> Self {
        self.path = Some(path.to_path_buf());
        self.digest = Some(digest);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn rank(&self) -> u8 {
        self.kind.rank()
    }

    /// Properties in key order
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// File the layer was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// SHA-256 of the raw file bytes, if loaded from a file
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Provenance summary for reports
    pub fn source(&self) -> LayerSource {
        LayerSource {
            name: self.name.clone(),
            kind: self.kind.clone(),
            path: self.path.as_ref().map(|p| p.to_string_lossy().to_string()),
            digest: self.digest.clone(),
            property_count: self.properties.len(),
        }
    }
}
