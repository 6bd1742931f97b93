//! On-disk layout under the harbor root directory.
//!
//! Everything the core touches lives under one root, resolved from
//! `HARBOR_ROOT` or defaulting to `~/.harbor`. Tests construct
//! `HostPaths::with_root` over a tempdir.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Resolves every well-known path under the harbor root.
#[derive(Debug, Clone)]
pub struct HostPaths {
    root: PathBuf,
}

impl HostPaths {
    /// Resolve the root from `HARBOR_ROOT`, else `~/.harbor`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `HARBOR_ROOT` is set nor the home
    /// directory can be determined.
    pub fn discover() -> Result<Self> {
        if let Ok(root) = std::env::var("HARBOR_ROOT") {
            return Ok(Self::with_root(PathBuf::from(root)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_root(home.join(".harbor")))
    }

    /// Create paths over an explicit root (used in tests).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host configuration file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join("harbor.yml")
    }

    /// Source definition of an app, as shipped by its store.
    #[must_use]
    pub fn store_dir(&self, app: &str) -> PathBuf {
        self.root.join("store").join(app)
    }

    /// Installed app files, including hooks and rendered templates.
    #[must_use]
    pub fn app_data_dir(&self, app: &str) -> PathBuf {
        self.root.join("app-data").join(app)
    }

    /// The app's manifest. Prefers the installed copy; falls back to
    /// the store definition so an app can be resolved before its first
    /// install completes.
    #[must_use]
    pub fn manifest_file(&self, app: &str) -> PathBuf {
        let installed = self.app_data_dir(app).join("app.yml");
        if installed.exists() {
            installed
        } else {
            self.store_dir(app).join("app.yml")
        }
    }

    /// The app's settings overlay, if present (same lookup order as the
    /// manifest).
    #[must_use]
    pub fn settings_file(&self, app: &str) -> Option<PathBuf> {
        let installed = self.app_data_dir(app).join("settings.yml");
        if installed.exists() {
            return Some(installed);
        }
        let store = self.store_dir(app).join("settings.yml");
        store.exists().then_some(store)
    }

    /// The app's export layer, if present.
    #[must_use]
    pub fn exports_file(&self, app: &str) -> PathBuf {
        self.app_data_dir(app).join("exports.env")
    }

    /// The app's own compose file.
    #[must_use]
    pub fn app_compose_file(&self, app: &str) -> PathBuf {
        self.app_data_dir(app).join("docker-compose.yml")
    }

    /// A shared compose layer fragment (`common`, `app-proxy`, `tor`).
    #[must_use]
    pub fn compose_fragment(&self, name: &str) -> PathBuf {
        self.root.join("compose").join(format!("{name}.yml"))
    }

    /// The shared registry document.
    #[must_use]
    pub fn registry_file(&self) -> PathBuf {
        self.root.join("db").join("registry.json")
    }

    /// Lock marker adjacent to the registry.
    #[must_use]
    pub fn registry_lock_file(&self) -> PathBuf {
        self.root.join("db").join("registry.json.lock")
    }

    /// Primary root-seed location.
    #[must_use]
    pub fn seed_file(&self) -> PathBuf {
        self.root.join("secrets").join("seed")
    }

    /// Legacy parent-level seed location from the older install layout.
    #[must_use]
    pub fn legacy_seed_file(&self) -> PathBuf {
        self.root.join("seed")
    }

    /// Hidden-service hostname file, written asynchronously by the tor
    /// collaborator once an address is provisioned.
    #[must_use]
    pub fn hidden_service_hostname_file(&self, app: &str) -> PathBuf {
        self.root
            .join("tor")
            .join("data")
            .join(format!("app-{app}"))
            .join("hostname")
    }
}
