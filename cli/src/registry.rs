//! Durable registry of installed apps.
//!
//! Mutations run under an exclusive OS advisory lock on a marker file
//! adjacent to the registry, acquired with a bounded retry loop. The
//! kernel drops the lock when the holder exits for any reason, so a
//! crashed writer never strands contenders. Persistence is atomic
//! (temp file + rename): a reader observes the pre- or post-mutation
//! document, never a torn one, which is why readers skip the lock.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use fs2::FileExt;
use harbor_common::{HostConfig, RegistryDoc, RepoRef};

use crate::error::LifecycleError;
use crate::paths::HostPaths;

/// Locked store over the registry document.
pub struct Registry {
    path: PathBuf,
    lock_path: PathBuf,
    retry_interval: Duration,
    retry_attempts: u32,
}

/// Holds the exclusive lock; released on drop so every exit path from
/// `mutate` unlocks deterministically.
struct LockGuard(std::fs::File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl Registry {
    #[must_use]
    pub fn new(paths: &HostPaths, config: &HostConfig) -> Self {
        Self {
            path: paths.registry_file(),
            lock_path: paths.registry_lock_file(),
            retry_interval: Duration::from_secs(config.lock_retry_interval_secs),
            retry_attempts: config.lock_retry_attempts,
        }
    }

    /// Store with explicit paths and a short retry budget (used in tests).
    #[must_use]
    pub fn with_paths(path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            path,
            lock_path,
            retry_interval: Duration::from_millis(25),
            retry_attempts: 200,
        }
    }

    /// Lock-free read of the current document; an absent file is the
    /// empty registry (created at first install).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<RegistryDoc> {
        if !self.path.exists() {
            return Ok(RegistryDoc::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading registry {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing registry {}", self.path.display()))
    }

    /// Run `f` against the current document under the exclusive lock,
    /// then persist atomically. No two `mutate` calls ever interleave.
    ///
    /// # Errors
    ///
    /// `LockTimeout` when the lock stays busy past the retry budget;
    /// otherwise I/O or parse errors.
    pub fn mutate<F>(&self, f: F) -> Result<RegistryDoc>
    where
        F: FnOnce(&mut RegistryDoc),
    {
        let _guard = self.acquire_lock()?;
        let mut doc = self.load()?;
        f(&mut doc);
        self.persist(&doc)?;
        Ok(doc)
    }

    /// Register `app` as installed with its origin. Idempotent.
    ///
    /// # Errors
    ///
    /// See [`Registry::mutate`].
    pub fn add_installed_app(&self, app: &str, origin: RepoRef) -> Result<()> {
        self.mutate(|doc| doc.add_installed_app(app, origin))?;
        Ok(())
    }

    /// Remove `app` and its origin mapping. A no-op for non-members.
    ///
    /// # Errors
    ///
    /// See [`Registry::mutate`].
    pub fn remove_installed_app(&self, app: &str) -> Result<()> {
        self.mutate(|doc| doc.remove_installed_app(app))?;
        Ok(())
    }

    /// Installed app ids (lock-free reader).
    ///
    /// # Errors
    ///
    /// See [`Registry::load`].
    pub fn list_installed(&self) -> Result<Vec<String>> {
        Ok(self.load()?.installed_apps)
    }

    /// Whether `app` is registered (lock-free reader).
    ///
    /// # Errors
    ///
    /// See [`Registry::load`].
    pub fn is_installed(&self, app: &str) -> Result<bool> {
        Ok(self.load()?.is_installed(app))
    }

    fn acquire_lock(&self) -> Result<LockGuard> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("opening lock file {}", self.lock_path.display()))?;

        for attempt in 0..self.retry_attempts {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(LockGuard(file)),
                Err(_) if attempt + 1 < self.retry_attempts => {
                    std::thread::sleep(self.retry_interval);
                }
                Err(_) => break,
            }
        }
        Err(LifecycleError::LockTimeout {
            path: self.lock_path.clone(),
            waited: self.retry_interval * self.retry_attempts,
        }
        .into())
    }

    /// Write the whole document to a sibling temp file, then rename it
    /// over the registry. Rename is atomic on POSIX filesystems.
    fn persist(&self, doc: &RegistryDoc) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("registry path has no parent"))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
        let tmp = tempfile::NamedTempFile::new_in(parent)
            .context("creating temp file for registry write")?;
        serde_json::to_writer_pretty(&tmp, doc).context("serializing registry")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing registry {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> Registry {
        Registry::with_paths(
            dir.path().join("registry.json"),
            dir.path().join("registry.json.lock"),
        )
    }

    #[test]
    fn test_load_missing_file_is_empty_registry() {
        let dir = TempDir::new().expect("tempdir");
        let doc = store(&dir).load().expect("load");
        assert!(doc.installed_apps.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("registry.json"), b"not json").expect("write");
        assert!(store(&dir).load().is_err());
    }

    #[test]
    fn test_add_persists_and_lists() {
        let dir = TempDir::new().expect("tempdir");
        let registry = store(&dir);
        registry
            .add_installed_app("nextcloud", RepoRef::from("harbor/community"))
            .expect("add");
        assert_eq!(registry.list_installed().expect("list"), vec!["nextcloud"]);
        assert!(registry.is_installed("nextcloud").expect("is_installed"));
    }

    #[test]
    fn test_add_twice_single_entry() {
        let dir = TempDir::new().expect("tempdir");
        let registry = store(&dir);
        registry
            .add_installed_app("a", RepoRef::from("store"))
            .expect("add");
        registry
            .add_installed_app("a", RepoRef::from("store"))
            .expect("add");
        assert_eq!(registry.list_installed().expect("list"), vec!["a"]);
    }

    #[test]
    fn test_remove_nonmember_is_noop() {
        let dir = TempDir::new().expect("tempdir");
        let registry = store(&dir);
        registry.remove_installed_app("ghost").expect("remove");
        assert!(registry.list_installed().expect("list").is_empty());
    }

    #[test]
    fn test_remove_clears_origin_mapping() {
        let dir = TempDir::new().expect("tempdir");
        let registry = store(&dir);
        registry
            .add_installed_app("a", RepoRef::from("store"))
            .expect("add");
        registry.remove_installed_app("a").expect("remove");
        let doc = registry.load().expect("load");
        assert!(doc.installed_apps.is_empty());
        assert!(doc.app_origin.is_empty());
    }

    #[test]
    fn test_persisted_file_is_valid_json_with_wire_names() {
        let dir = TempDir::new().expect("tempdir");
        store(&dir)
            .add_installed_app("a", RepoRef::from("store"))
            .expect("add");
        let raw =
            std::fs::read_to_string(dir.path().join("registry.json")).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(value["installedApps"][0], "a");
        assert_eq!(value["appOrigin"]["a"], "store");
    }

    #[test]
    fn test_mutate_returns_resulting_document() {
        let dir = TempDir::new().expect("tempdir");
        let doc = store(&dir)
            .mutate(|d| d.add_installed_app("a", RepoRef::from("store")))
            .expect("mutate");
        assert!(doc.is_installed("a"));
    }

    #[test]
    fn test_lock_timeout_surfaces_typed_error() {
        let dir = TempDir::new().expect("tempdir");
        let lock_path = dir.path().join("registry.json.lock");
        // Hold the lock from a second handle so mutate cannot acquire it.
        let holder = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .expect("open lock");
        holder.lock_exclusive().expect("lock");

        let registry = Registry {
            path: dir.path().join("registry.json"),
            lock_path,
            retry_interval: Duration::from_millis(5),
            retry_attempts: 3,
        };
        let err = registry
            .mutate(|d| d.add_installed_app("a", RepoRef::from("store")))
            .expect_err("must time out");
        assert!(
            err.downcast_ref::<LifecycleError>()
                .is_some_and(|e| matches!(e, LifecycleError::LockTimeout { .. })),
            "expected LockTimeout, got {err:?}"
        );
        let _ = FileExt::unlock(&holder);
    }

    #[test]
    fn test_reader_never_observes_torn_document() {
        // Writes are temp-file + rename, so any read of the path parses.
        let dir = TempDir::new().expect("tempdir");
        let registry = store(&dir);
        for i in 0..50 {
            registry
                .add_installed_app(&format!("app-{i}"), RepoRef::from("store"))
                .expect("add");
            let doc = registry.load().expect("load must always parse");
            assert_eq!(doc.installed_apps.len(), i + 1);
        }
    }
}
