//! Deterministic secret derivation from the root seed.
//!
//! `derive_entropy` is a keyed hash (HMAC-SHA256, seed as key,
//! identifier as message): same inputs always yield the same secret,
//! different identifiers under one seed are independent, and nothing is
//! ever stored — secrets are recomputed on every composition.

use std::fmt::Write as _;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::LifecycleError;
use crate::paths::HostPaths;

type HmacSha256 = Hmac<Sha256>;

/// Derive a stable secret for `identifier` under `seed`, as lowercase
/// hex (64 chars).
///
/// # Errors
///
/// `MissingSeed` if the seed is empty, `MissingIdentifier` if the
/// identifier is empty. Both are fatal: a guessable default secret is
/// worse than no secret.
pub fn derive_entropy(seed: &[u8], identifier: &str) -> Result<String, LifecycleError> {
    if seed.is_empty() {
        return Err(LifecycleError::MissingSeed);
    }
    if identifier.is_empty() {
        return Err(LifecycleError::MissingIdentifier);
    }
    let mut mac =
        HmacSha256::new_from_slice(seed).map_err(|_| LifecycleError::MissingSeed)?;
    mac.update(identifier.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}

/// Load the root seed, falling back to the legacy parent-level location
/// from the older install layout.
///
/// # Errors
///
/// `MissingSeed` if neither location exists, is readable, and non-empty.
pub fn load_seed(paths: &HostPaths) -> Result<Vec<u8>, LifecycleError> {
    for candidate in [paths.seed_file(), paths.legacy_seed_file()] {
        if let Ok(bytes) = std::fs::read(&candidate) {
            if !bytes.is_empty() {
                return Ok(bytes);
            }
        }
    }
    Err(LifecycleError::MissingSeed)
}
