//! Variable substitution for `*.template` files.
//!
//! Interface-boundary collaborator: each `<name>.template` under an app
//! data directory is rendered to a sibling `<name>` with `${VAR}`
//! references replaced from the composed environment. Unknown variables
//! are left verbatim so downstream tooling can spot them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::environment::Environment;

const TEMPLATE_SUFFIX: &str = ".template";

/// Substitute `${VAR}` references in `input` from `env`.
#[must_use]
pub fn substitute(input: &str, env: &Environment) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match env.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // unterminated reference, emit as-is
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render every template under `dir` (recursively). Returns the paths
/// written. Idempotent: re-rendering overwrites the previous output.
///
/// # Errors
///
/// Returns an error if a template cannot be read or its output cannot
/// be written.
pub fn render_templates(dir: &Path, env: &Environment) -> Result<Vec<PathBuf>> {
    let mut rendered = Vec::new();
    if dir.is_dir() {
        render_dir(dir, env, &mut rendered)?;
    }
    Ok(rendered)
}

fn render_dir(dir: &Path, env: &Environment, rendered: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading directory {}", dir.display()))?
            .path();
        if path.is_dir() {
            render_dir(&path, env, rendered)?;
        } else if let Some(target) = template_target(&path) {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading template {}", path.display()))?;
            std::fs::write(&target, substitute(&raw, env))
                .with_context(|| format!("writing {}", target.display()))?;
            rendered.push(target);
        }
    }
    Ok(())
}

fn template_target(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(TEMPLATE_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(stem))
}
