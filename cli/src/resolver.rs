//! Dependency resolution over app manifests.
//!
//! The graph is never persisted — it is rebuilt from manifests on every
//! resolution call. Traversal state lives in a call-local map so
//! concurrent resolutions for different roots never interfere.

use std::collections::HashMap;

use harbor_common::{AppManifest, AppSettings};

use crate::error::LifecycleError;
use crate::paths::HostPaths;

/// Visit state of a node during one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// On the active recursion path.
    InProgress,
    /// Fully processed and already emitted.
    Done,
}

/// Resolves dependencies by reading manifests and settings overlays
/// from disk on demand.
pub struct Resolver<'a> {
    paths: &'a HostPaths,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(paths: &'a HostPaths) -> Self {
        Self { paths }
    }

    /// Load and validate an app's manifest.
    ///
    /// # Errors
    ///
    /// `InvalidManifest` if the file is missing, unparsable, or fails
    /// validation.
    pub fn load_manifest(&self, app: &str) -> Result<AppManifest, LifecycleError> {
        let path = self.paths.manifest_file(app);
        let raw = std::fs::read_to_string(&path).map_err(|e| LifecycleError::InvalidManifest {
            app: app.to_owned(),
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        let manifest: AppManifest =
            serde_yaml::from_str(&raw).map_err(|e| LifecycleError::InvalidManifest {
                app: app.to_owned(),
                reason: e.to_string(),
            })?;
        manifest
            .validate()
            .map_err(|e| LifecycleError::InvalidManifest {
                app: app.to_owned(),
                reason: e.to_string(),
            })?;
        semver::Version::parse(&manifest.version).map_err(|e| {
            LifecycleError::InvalidManifest {
                app: app.to_owned(),
                reason: format!("version '{}' is not semver: {e}", manifest.version),
            }
        })?;
        Ok(manifest)
    }

    /// Load an app's settings overlay, defaulting to empty when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// `InvalidManifest` if a settings file exists but cannot be parsed.
    pub fn load_settings(&self, app: &str) -> Result<AppSettings, LifecycleError> {
        let Some(path) = self.paths.settings_file(app) else {
            return Ok(AppSettings::default());
        };
        let raw = std::fs::read_to_string(&path).map_err(|e| LifecycleError::InvalidManifest {
            app: app.to_owned(),
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        serde_yaml::from_str(&raw).map_err(|e| LifecycleError::InvalidManifest {
            app: app.to_owned(),
            reason: format!("settings: {e}"),
        })
    }

    /// Direct dependencies in declared order, with the app's settings
    /// overlay substitution applied once per entry.
    ///
    /// # Errors
    ///
    /// `InvalidManifest` for a broken manifest or settings file.
    pub fn dependencies_of(&self, app: &str) -> Result<Vec<String>, LifecycleError> {
        let manifest = self.load_manifest(app)?;
        let settings = self.load_settings(app)?;
        Ok(manifest
            .dependencies
            .iter()
            .map(|dep| settings.substitute(dep).to_owned())
            .collect())
    }

    /// Transitive dependencies of `app`, post-order topologically
    /// sorted: every entry appears after all of its own transitive
    /// dependencies. Excludes `app` itself, contains no duplicates, and
    /// is deterministic for fixed manifests and settings.
    ///
    /// # Errors
    ///
    /// `CircularDependency` if a cycle is reachable from `app` — no
    /// partial output is produced. `InvalidManifest` for a broken
    /// manifest anywhere in the chain.
    pub fn transitive_dependencies_of(&self, app: &str) -> Result<Vec<String>, LifecycleError> {
        let mut states: HashMap<String, Visit> = HashMap::new();
        let mut out = Vec::new();
        states.insert(app.to_owned(), Visit::InProgress);
        self.visit(app, app, &mut states, &mut out)?;
        Ok(out)
    }

    fn visit(
        &self,
        root: &str,
        app: &str,
        states: &mut HashMap<String, Visit>,
        out: &mut Vec<String>,
    ) -> Result<(), LifecycleError> {
        for dep in self.dependencies_of(app)? {
            match states.get(&dep) {
                Some(Visit::Done) => {}
                Some(Visit::InProgress) => {
                    return Err(LifecycleError::CircularDependency {
                        root: root.to_owned(),
                        from: app.to_owned(),
                        to: dep,
                    });
                }
                None => {
                    states.insert(dep.clone(), Visit::InProgress);
                    self.visit(root, &dep, states, out)?;
                    states.insert(dep.clone(), Visit::Done);
                    out.push(dep);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_app(root: &std::path::Path, app: &str, deps: &[&str]) {
        let dir = root.join("store").join(app);
        std::fs::create_dir_all(&dir).expect("create store dir");
        let deps_yaml = if deps.is_empty() {
            String::new()
        } else {
            let list: String = deps.iter().map(|d| format!("  - {d}\n")).collect();
            format!("dependencies:\n{list}")
        };
        std::fs::write(
            dir.join("app.yml"),
            format!("version: \"1.0.0\"\nport: 8080\n{deps_yaml}"),
        )
        .expect("write manifest");
    }

    fn write_settings(root: &std::path::Path, app: &str, from: &str, to: &str) {
        let dir = root.join("store").join(app);
        std::fs::create_dir_all(&dir).expect("create store dir");
        std::fs::write(
            dir.join("settings.yml"),
            format!("dependencies:\n  {from}: {to}\n"),
        )
        .expect("write settings");
    }

    #[test]
    fn test_chain_resolves_post_order() {
        // A -> B -> C  =>  transitive(A) == [C, B]
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "a", &["b"]);
        write_app(dir.path(), "b", &["c"]);
        write_app(dir.path(), "c", &[]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let deps = Resolver::new(&paths)
            .transitive_dependencies_of("a")
            .expect("resolve");
        assert_eq!(deps, vec!["c", "b"]);
    }

    #[test]
    fn test_diamond_has_no_duplicates() {
        // A -> B, C; B -> D; C -> D
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "a", &["b", "c"]);
        write_app(dir.path(), "b", &["d"]);
        write_app(dir.path(), "c", &["d"]);
        write_app(dir.path(), "d", &[]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let deps = Resolver::new(&paths)
            .transitive_dependencies_of("a")
            .expect("resolve");
        assert_eq!(deps, vec!["d", "b", "c"]);
    }

    #[test]
    fn test_every_dependency_precedes_its_dependents() {
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "a", &["b", "e"]);
        write_app(dir.path(), "b", &["c", "d"]);
        write_app(dir.path(), "c", &[]);
        write_app(dir.path(), "d", &["c"]);
        write_app(dir.path(), "e", &["d"]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let resolver = Resolver::new(&paths);
        let order = resolver.transitive_dependencies_of("a").expect("resolve");
        let pos =
            |app: &str| order.iter().position(|x| x == app).unwrap_or(usize::MAX);
        assert!(pos("c") < pos("b"));
        assert!(pos("c") < pos("d"));
        assert!(pos("d") < pos("b"));
        assert!(pos("d") < pos("e"));
        assert!(!order.contains(&"a".to_owned()), "root must be excluded");
    }

    #[test]
    fn test_two_node_cycle_names_closing_edge() {
        // X -> Y, Y -> X  =>  edge Y -> X closes the cycle
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "x", &["y"]);
        write_app(dir.path(), "y", &["x"]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let err = Resolver::new(&paths)
            .transitive_dependencies_of("x")
            .expect_err("cycle must be detected");
        match err {
            LifecycleError::CircularDependency { root, from, to } => {
                assert_eq!(root, "x");
                assert_eq!(from, "y");
                assert_eq!(to, "x");
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle_detected() {
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "a", &["a"]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        assert!(matches!(
            Resolver::new(&paths).transitive_dependencies_of("a"),
            Err(LifecycleError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_settings_overlay_substitutes_dependency() {
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "wallet", &["bitcoind"]);
        write_settings(dir.path(), "wallet", "bitcoind", "bitcoin-knots");
        write_app(dir.path(), "bitcoin-knots", &[]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let resolver = Resolver::new(&paths);
        assert_eq!(
            resolver.dependencies_of("wallet").expect("direct"),
            vec!["bitcoin-knots"]
        );
        assert_eq!(
            resolver.transitive_dependencies_of("wallet").expect("transitive"),
            vec!["bitcoin-knots"]
        );
    }

    #[test]
    fn test_substitution_is_not_chased_recursively() {
        // wallet substitutes bitcoind -> knots; knots' own settings
        // substituting something else must not affect wallet's direct list.
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "wallet", &["bitcoind"]);
        write_settings(dir.path(), "wallet", "bitcoind", "knots");
        write_app(dir.path(), "knots", &["tor"]);
        write_settings(dir.path(), "knots", "tor", "i2p");
        write_app(dir.path(), "i2p", &[]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let resolver = Resolver::new(&paths);
        assert_eq!(resolver.dependencies_of("wallet").expect("direct"), vec!["knots"]);
        // knots' overlay applies at knots' own resolution step
        assert_eq!(
            resolver.transitive_dependencies_of("wallet").expect("transitive"),
            vec!["i2p", "knots"]
        );
    }

    #[test]
    fn test_missing_manifest_is_invalid_manifest() {
        let dir = TempDir::new().expect("tempdir");
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        assert!(matches!(
            Resolver::new(&paths).transitive_dependencies_of("ghost"),
            Err(LifecycleError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn test_non_semver_version_is_invalid_manifest() {
        let dir = TempDir::new().expect("tempdir");
        let app_dir = dir.path().join("store").join("bad");
        std::fs::create_dir_all(&app_dir).expect("mkdir");
        std::fs::write(app_dir.join("app.yml"), "version: \"latest\"\nport: 80\n")
            .expect("write");
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        assert!(matches!(
            Resolver::new(&paths).load_manifest("bad"),
            Err(LifecycleError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let dir = TempDir::new().expect("tempdir");
        write_app(dir.path(), "a", &["c", "b"]);
        write_app(dir.path(), "b", &[]);
        write_app(dir.path(), "c", &[]);
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let resolver = Resolver::new(&paths);
        let first = resolver.transitive_dependencies_of("a").expect("resolve");
        for _ in 0..5 {
            assert_eq!(
                resolver.transitive_dependencies_of("a").expect("resolve"),
                first
            );
        }
        // declared order, not sorted order
        assert_eq!(first, vec!["c", "b"]);
    }
}
