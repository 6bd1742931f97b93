//! Shared types for the harbor app manager.

pub mod config;
pub mod types;

pub use config::HostConfig;
pub use types::{AppManifest, AppSettings, RegistryDoc, RepoRef, ValidationError};
