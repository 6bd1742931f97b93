//! Typed errors for the lifecycle core.
//!
//! Core modules return these; the command layer wraps them in
//! `anyhow::Result` with context. `HookFailure` is deliberately absent:
//! hook failures are reported as values and swallowed by the
//! orchestrator, never propagated as errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The dependency graph reachable from `root` contains a cycle,
    /// closed by the edge `from -> to`.
    #[error("circular dependency while resolving '{root}': {from} -> {to}")]
    CircularDependency {
        root: String,
        from: String,
        to: String,
    },

    /// The root seed is empty or unreadable. Fatal: deriving a secret
    /// from a default or guessable seed is unsafe.
    #[error("root seed is empty or unreadable")]
    MissingSeed,

    /// An empty identifier was passed to secret derivation.
    #[error("secret derivation identifier is empty")]
    MissingIdentifier,

    /// The app's manifest is missing, unparsable, or fails validation.
    #[error("invalid manifest for '{app}': {reason}")]
    InvalidManifest { app: String, reason: String },

    /// A transition that requires prior installation was invoked on an
    /// app the registry does not know.
    #[error("app '{app}' is not installed")]
    NotInstalled { app: String },

    /// An external command (docker compose, docker) exited non-zero.
    #[error("{program} failed ({status}): {stderr}")]
    ExternalCommandFailure {
        program: String,
        status: String,
        stderr: String,
    },

    /// The registry lock could not be acquired within the configured
    /// retry budget.
    #[error("timed out waiting for registry lock {path} after {waited:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
}
