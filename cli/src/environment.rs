//! Layered environment composition.
//!
//! An app's environment is never persisted — it is recomputed on every
//! sourcing from the base layer, the export layers of its transitive
//! dependencies (in resolution order), and finally the app-specific
//! layer, which nothing can override.

use std::path::Path;

use harbor_common::HostConfig;

use crate::entropy::{derive_entropy, load_seed};
use crate::error::LifecycleError;
use crate::paths::HostPaths;
use crate::resolver::Resolver;

/// Placeholder domain used until remote access provisions a real one.
fn placeholder_domain(app: &str) -> String {
    format!("{app}.localhost")
}

/// An ordered key/value overlay. `set` replaces in place so iteration
/// order is the first-insertion order, keeping rendered output and
/// child process environments deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: Vec<(String, String)>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. Overwriting keeps the original
    /// position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a dotenv-style export file: `KEY=VALUE` lines, blank lines
    /// and `#` comments ignored, an optional leading `export ` stripped,
    /// matching surrounding quotes removed. Later entries override
    /// earlier keys of the same name.
    pub fn merge_export_file(&mut self, path: &Path) -> std::io::Result<()> {
        let raw = std::fs::read_to_string(path)?;
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            self.set(key.trim(), unquote(value.trim()));
        }
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Build the full environment for `app`.
///
/// Layers, later overriding earlier: network/device base, export files
/// of `transitive_dependencies_of(app) ++ [app]`, then the app layer —
/// computed last so no export can shadow the app's own identity,
/// secrets, or addressing.
///
/// # Errors
///
/// `InvalidManifest` if the app's manifest cannot be read or is
/// malformed, `CircularDependency` from resolution, `MissingSeed` /
/// `MissingIdentifier` from secret derivation. Any failure aborts the
/// whole transition — no partial environment is ever used.
pub fn compose_env(
    paths: &HostPaths,
    config: &HostConfig,
    app: &str,
) -> Result<Environment, LifecycleError> {
    let resolver = Resolver::new(paths);
    let manifest = resolver.load_manifest(app)?;

    let mut env = Environment::new();

    // Layer 1: network and device identity.
    let hostname = device_hostname(config);
    env.set("NETWORK_IP", config.network_ip.clone());
    env.set("DEVICE_HOSTNAME", hostname.clone());
    env.set("DEVICE_DOMAIN_NAME", format!("{hostname}.local"));

    // Layer 2: export files in resolution order, the app's own last.
    let mut chain = resolver.transitive_dependencies_of(app)?;
    if !chain.iter().any(|a| a == app) {
        chain.push(app.to_owned());
    }
    for member in &chain {
        let exports = paths.exports_file(member);
        if exports.exists() {
            env.merge_export_file(&exports).map_err(|e| {
                LifecycleError::InvalidManifest {
                    app: member.clone(),
                    reason: format!("cannot read {}: {e}", exports.display()),
                }
            })?;
        }
    }

    // Layer 3: app-specific values, computed last so nothing above can
    // override them.
    let data_dir = paths.app_data_dir(app);
    env.set("APP_ID", app);
    env.set("APP_VERSION", manifest.version.clone());
    env.set("APP_PORT", manifest.port.to_string());
    env.set("APP_DATA_DIR", data_dir.to_string_lossy().into_owned());
    env.set("APP_DOMAIN", app_domain(paths, config, app));

    let seed = load_seed(paths)?;
    env.set("APP_SEED", derive_entropy(&seed, &format!("app-{app}"))?);
    env.set(
        "APP_PASSWORD",
        derive_entropy(&seed, &format!("app-{app}-password"))?,
    );

    // Hidden-service mapping: internal port 80 to the app's proxy.
    env.set("APP_HIDDEN_SERVICE_PORT", "80");
    env.set("APP_PROXY_HOSTNAME", format!("{app}-app-proxy-1"));
    env.set("APP_PROXY_PORT", manifest.port.to_string());

    Ok(env)
}

fn device_hostname(config: &HostConfig) -> String {
    if let Some(hostname) = &config.hostname {
        return hostname.clone();
    }
    std::fs::read_to_string("/etc/hostname")
        .map(|h| h.trim().to_owned())
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "harbor".to_owned())
}

/// Externally-reachable address: a placeholder while remote access is
/// disabled, else the provisioned hidden-service hostname, falling back
/// to the placeholder when the file has not appeared yet.
fn app_domain(paths: &HostPaths, config: &HostConfig, app: &str) -> String {
    if !config.remote_access {
        return placeholder_domain(app);
    }
    std::fs::read_to_string(paths.hidden_service_hostname_file(app))
        .map(|h| h.trim().to_owned())
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| placeholder_domain(app))
}
