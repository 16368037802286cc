//! Ancestor directory provisioning.
//! - One non-recursive create_dir per missing level, shallowest first, so
//!   each level can receive its own mode and ownership.
//! - Already-present and permission/collision refusals are advisory: the
//!   goal is "ensure present", not "assert created by me".
//! - Pre-existing directories are never reconfigured.

use crate::platform;
use crate::writer::WriteOptions;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Outcome of a single ensure-present step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
    /// Created by this call; mode and ownership were applied.
    Created,
    /// Already present; left untouched.
    AlreadyPresent,
    /// Creation refused (permission/collision class); a real failure, if
    /// any, surfaces later when the staging directory is created.
    Skipped,
}

/// Ensure every directory level of `parent` exists, shallowest to deepest.
pub(crate) fn provision_ancestors(parent: &Path, opts: &WriteOptions) -> Result<()> {
    let mut current = PathBuf::new();
    for comp in parent.components() {
        current.push(comp.as_os_str());
        if matches!(comp, Component::RootDir | Component::Prefix(_)) {
            continue;
        }
        let outcome = ensure_dir(&current, opts)?;
        debug!(path = %current.display(), ?outcome, "provisioned ancestor");
    }
    Ok(())
}

/// Create one directory level if missing, applying mode/ownership only to
/// a level this call created.
pub(crate) fn ensure_dir(path: &Path, opts: &WriteOptions) -> Result<Provision> {
    match fs::create_dir(path) {
        Ok(()) => {
            // Mode/ownership on a freshly created ancestor is advisory,
            // same as a refused creation.
            if let Err(e) = platform::set_properties(
                path,
                opts.dir_perms,
                opts.user.as_deref(),
                opts.group.as_deref(),
            ) {
                debug!(path = %path.display(), error = %e, "ancestor properties not applied");
            }
            Ok(Provision::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Provision::AlreadyPresent),
        Err(e) if is_advisory(&e) => {
            debug!(path = %path.display(), error = %e, "ancestor creation refused");
            Ok(Provision::Skipped)
        }
        Err(e) => Err(e).with_context(|| format!("create directory '{}'", path.display())),
    }
}

fn is_advisory(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn opts_with_dir_perms(mode: u32) -> WriteOptions {
        WriteOptions {
            dir_perms: mode,
            ..WriteOptions::default()
        }
    }

    #[test]
    fn creates_missing_chain_one_level_at_a_time() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let parent = base.join("a").join("b").join("c");

        provision_ancestors(&parent, &WriteOptions::default()).unwrap();
        assert!(base.join("a").is_dir());
        assert!(base.join("a").join("b").is_dir());
        assert!(parent.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn created_levels_carry_configured_mode() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let parent = base.join("x").join("y");

        provision_ancestors(&parent, &opts_with_dir_perms(0o700)).unwrap();
        for dir in [base.join("x"), parent] {
            let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700, "created dir {} should be 0700", dir.display());
        }
    }

    #[cfg(unix)]
    #[test]
    fn pre_existing_dir_keeps_its_mode() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let existing = base.join("keep");
        fs::create_dir(&existing).unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o711)).unwrap();

        let outcome = ensure_dir(&existing, &opts_with_dir_perms(0o755)).unwrap();
        assert_eq!(outcome, Provision::AlreadyPresent);
        let mode = fs::metadata(&existing).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o711, "pre-existing dir must not be reconfigured");
    }

    #[test]
    fn file_collision_at_a_level_is_advisory() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let occupied = base.join("taken");
        fs::write(&occupied, b"not a dir").unwrap();

        // create_dir on the occupied name reports AlreadyExists.
        let outcome = ensure_dir(&occupied, &WriteOptions::default()).unwrap();
        assert_eq!(outcome, Provision::AlreadyPresent);
        assert!(occupied.is_file(), "collision must leave the file alone");
    }

    #[cfg(unix)]
    #[test]
    fn level_below_a_file_fails_loudly() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let occupied = base.join("taken");
        fs::write(&occupied, b"not a dir").unwrap();

        let parent = occupied.join("sub");
        let err = provision_ancestors(&parent, &WriteOptions::default()).unwrap_err();
        assert!(err.to_string().contains("create directory"));
    }
}
