//! The `bundle.toml` file at the root of every bundle

use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use qss_diagnostics::Message;
use qss_index::DEFAULT_BUNDLE;
use qss_span::Range;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest
pub const MANIFEST_FILE: &str = "bundle.toml";

/// Problems with a manifest's contents
///
/// These are reported to the user as messages rather than aborting the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// A dependency's `path` does not lead to another bundle
    #[error(
        "Bundle {bundle} in bundle.toml had an invalid \"path\" key; {} was not a directory containing a Quest Sage bundle",
        path.display()
    )]
    InvalidPath {
        /// Name the dependency is listed under
        bundle: String,
        /// The path as written
        path: PathBuf,
    },

    /// A dependency table has no `path`
    #[error(
        "Bundle {bundle} in bundle.toml should have a \"path\" key that is the directory of the bundle root"
    )]
    MissingPath {
        /// Name the dependency is listed under
        bundle: String,
    },

    /// A dependency is not a table at all
    #[error("Bundle {bundle} in bundle.toml should be a table containing the \"path\" key")]
    NotATable {
        /// Name the dependency is listed under
        bundle: String,
    },
}

impl ManifestError {
    /// The error as a message at the start of the manifest
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message::error(Range::default(), self.to_string())
    }
}

/// Parsed `bundle.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    /// Bundle metadata
    #[serde(default)]
    pub bundle: BundleSection,

    /// Other bundles this one depends on
    #[serde(default)]
    pub dependencies: IndexMap<String, Dependency>,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// The `[bundle]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleSection {
    /// Name other bundles refer to this one by
    #[serde(default = "default_bundle_name")]
    pub name: String,
}

impl Default for BundleSection {
    fn default() -> Self {
        Self {
            name: default_bundle_name(),
        }
    }
}

fn default_bundle_name() -> String {
    DEFAULT_BUNDLE.to_string()
}

/// One entry of `[dependencies]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    /// `name = { path = "..." }`
    Table(DependencyTable),

    /// Anything else, which is rejected during validation
    Other(toml::Value),
}

/// A dependency written as a table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencyTable {
    /// Bundle root of the dependency, relative to this bundle's root
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// The `[log]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Filter directive such as `info` or `qss_flow=trace`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Manifest {
    /// Load the manifest from a file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid manifest.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse manifest file: {}", path.display()))
    }

    /// Load the manifest of the bundle rooted at `root`
    ///
    /// # Errors
    ///
    /// Fails if `root` has no readable, valid `bundle.toml`.
    pub fn find_in_dir(root: &Path) -> Result<Self> {
        Self::from_file(&root.join(MANIFEST_FILE))
    }

    /// The name of this bundle
    pub fn name(&self) -> &str {
        &self.bundle.name
    }

    /// Resolve every dependency against `root`
    ///
    /// Returns the usable dependencies as (name, bundle root) pairs, in manifest order, and one
    /// error per dependency that is not a directory containing a `bundle.toml`.
    pub fn dependency_roots(&self, root: &Path) -> (Vec<(String, PathBuf)>, Vec<ManifestError>) {
        let mut found = Vec::new();
        let mut errors = Vec::new();
        for (bundle, dependency) in &self.dependencies {
            let path = match dependency {
                Dependency::Table(DependencyTable { path: Some(path) }) => path,
                Dependency::Table(DependencyTable { path: None }) => {
                    errors.push(ManifestError::MissingPath {
                        bundle: bundle.clone(),
                    });
                    continue;
                }
                Dependency::Other(_) => {
                    errors.push(ManifestError::NotATable {
                        bundle: bundle.clone(),
                    });
                    continue;
                }
            };

            let dependency_root = root.join(path);
            if dependency_root.join(MANIFEST_FILE).is_file() {
                found.push((bundle.clone(), dependency_root));
            } else {
                errors.push(ManifestError::InvalidPath {
                    bundle: bundle.clone(),
                    path: path.clone(),
                });
            }
        }
        (found, errors)
    }
}
