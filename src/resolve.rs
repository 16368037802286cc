//! Resolving the destination path.
//! - Expands a leading `~` to the user's home directory.
//! - Joins relative paths onto the current working directory.
//! - Follows symlinks for the deepest existing ancestor; the
//!   not-yet-existing tail is appended with `.`/`..` segments folded.
//!
//! Resolution happens exactly once, before any filesystem mutation;
//! every later step operates on the resolved path.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Resolve `destination` to an absolute, symlink-free path.
pub fn resolve_destination(destination: &Path) -> Result<PathBuf> {
    let expanded = expand_home(destination)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .context("determine current directory for relative destination")?
            .join(expanded)
    };
    let normalized = normalize_lexically(&absolute);

    // Walk up to the deepest ancestor that exists, canonicalize it to
    // chase symlinks, then re-append the missing tail.
    let mut base = normalized.clone();
    let mut tail: Vec<OsString> = Vec::new();
    while !base.exists() {
        match (base.file_name(), base.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_owned());
                base = parent.to_path_buf();
            }
            // Ran out of components without hitting the filesystem
            // (e.g. a bare prefix on Windows); nothing left to chase.
            _ => return Ok(normalized),
        }
    }

    let mut resolved = dunce::canonicalize(&base)
        .with_context(|| format!("canonicalize '{}'", base.display()))?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Expand a leading `~` component. `~user` forms are left untouched.
fn expand_home(path: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir()
                .ok_or_else(|| anyhow!("cannot expand '~': no home directory for current user"))?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping at the root is a no-op; `/..` stays `/`.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
