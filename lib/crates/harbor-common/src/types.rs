use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest validation failure — the manifest parsed but carries
/// values no app can run with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("manifest version is empty")]
    EmptyVersion,
    #[error("manifest port is 0")]
    ZeroPort,
    #[error("dependency id is empty")]
    EmptyDependency,
}

/// Per-app manifest (`app.yml`) describing what the app is and what it
/// needs before it can start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppManifest {
    /// Human-readable name, optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Semantic version string, e.g. `1.4.2`.
    pub version: String,
    /// Port the app listens on inside its compose network.
    pub port: u16,
    /// App ids this app depends on, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl AppManifest {
    /// Check structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError::EmptyVersion);
        }
        if self.port == 0 {
            return Err(ValidationError::ZeroPort);
        }
        if self.dependencies.iter().any(|d| d.trim().is_empty()) {
            return Err(ValidationError::EmptyDependency);
        }
        Ok(())
    }
}

/// Per-app settings overlay (`settings.yml`). Currently carries only the
/// dependency substitution map: a dependency id declared in the manifest
/// may be swapped for an alternative implementation. Substitution is
/// applied once per lookup, never chased recursively.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    /// Maps a declared dependency id to the substitute app id to use
    /// in its place.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

impl AppSettings {
    /// Resolve a declared dependency through the overlay.
    #[must_use]
    pub fn substitute<'a>(&'a self, dependency: &'a str) -> &'a str {
        self.dependencies
            .get(dependency)
            .map_or(dependency, String::as_str)
    }
}

/// Reference to the store an app was installed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RepoRef(pub String);

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoRef {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The durable registry document: which apps are installed and where
/// each one came from. Persisted as a single JSON file; all mutation
/// goes through the locked store in the CLI crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryDoc {
    /// Installed app ids. Uniqueness enforced by `add_installed_app`;
    /// order is irrelevant but kept stable (insertion order).
    #[serde(rename = "installedApps", default)]
    pub installed_apps: Vec<String>,
    /// Origin store per installed app.
    #[serde(rename = "appOrigin", default)]
    pub app_origin: BTreeMap<String, RepoRef>,
}

impl RegistryDoc {
    /// Add `app` with its origin. Idempotent: a second add of the same
    /// app updates the origin but never duplicates the entry.
    pub fn add_installed_app(&mut self, app: &str, origin: RepoRef) {
        if !self.installed_apps.iter().any(|a| a == app) {
            self.installed_apps.push(app.to_owned());
        }
        self.app_origin.insert(app.to_owned(), origin);
    }

    /// Remove `app` and its origin mapping. A no-op for non-members.
    pub fn remove_installed_app(&mut self, app: &str) {
        self.installed_apps.retain(|a| a != app);
        self.app_origin.remove(app);
    }

    /// Whether `app` is registered as installed.
    #[must_use]
    pub fn is_installed(&self, app: &str) -> bool {
        self.installed_apps.iter().any(|a| a == app)
    }
}
