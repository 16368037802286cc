//! The scoped write operation.
//! Callers receive a path inside a private staging directory created next
//! to the destination; when the writing closure returns Ok the staged file
//! is published with a single atomic rename, otherwise the destination is
//! left untouched. The staging directory is removed on every exit path.

use crate::errors::StageWriteError;
use crate::platform;
use crate::provision::provision_ancestors;
use crate::publish::{move_atomic, replace_atomic};
use crate::resolve::resolve_destination;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Default mode for ancestor directories created on the way (u=rwx,g=rx,o=).
pub const DIR_PERMS_DEFAULT: u32 = 0o750;
/// Default mode for the published file (u=rw).
pub const FILE_PERMS_DEFAULT: u32 = 0o600;

/// Options for one write operation.
///
/// Modes are POSIX permission bits; both are ignored on Windows. `user`
/// and `group` name the desired owner of the published file and of any
/// directories created along the way; pre-existing directories are never
/// reconfigured.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub overwrite: bool,
    pub dir_perms: u32,
    pub file_perms: u32,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            dir_perms: DIR_PERMS_DEFAULT,
            file_perms: FILE_PERMS_DEFAULT,
            user: None,
            group: None,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Atomically write a file at `destination`.
///
/// The closure receives `staging_dir/<destination base name>` and is solely
/// responsible for creating and writing that path; its contents are never
/// inspected here. When the closure returns Ok the staged file is moved
/// into place; an existing destination is replaced only when
/// `opts.overwrite` is set, otherwise the call fails with
/// [`StageWriteError::DestinationExists`]. The configured mode and
/// ownership are then applied to the destination. A closure error skips
/// the publish and propagates unchanged; ancestor directories already
/// provisioned are not rolled back.
pub fn write_with<T, F>(destination: impl AsRef<Path>, opts: &WriteOptions, write: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let destination = resolve_destination(destination.as_ref())?;
    let parent = destination
        .parent()
        .ok_or_else(|| StageWriteError::NoParent(destination.clone()))?
        .to_path_buf();
    let name = destination
        .file_name()
        .ok_or_else(|| StageWriteError::NoFileName(destination.clone()))?
        .to_owned();

    provision_ancestors(&parent, opts)?;

    let staging = tempfile::Builder::new()
        .prefix(&name)
        .suffix(".tmp")
        .tempdir_in(&parent)
        .with_context(|| format!("create staging directory in '{}'", parent.display()))?;
    let staged = staging.path().join(&name);
    debug!(staged = %staged.display(), dest = %destination.display(), "staging write");

    // A closure error skips the publish; TempDir removes the staging
    // directory and whatever is left inside it on drop.
    let value = write(&staged)?;

    if opts.overwrite {
        replace_atomic(&staged, &destination)?;
    } else {
        move_atomic(&staged, &destination)?;
    }
    platform::set_properties(
        &destination,
        opts.file_perms,
        opts.user.as_deref(),
        opts.group.as_deref(),
    )?;
    staging
        .close()
        .with_context(|| format!("remove staging directory next to '{}'", destination.display()))?;
    info!(dest = %destination.display(), "published atomically");
    Ok(value)
}

/// Stage `contents`, fsync, and publish in one call.
pub fn write_bytes(
    destination: impl AsRef<Path>,
    opts: &WriteOptions,
    contents: &[u8],
) -> Result<()> {
    write_with(destination, opts, |staged| {
        let mut f = File::create(staged)
            .with_context(|| format!("create staged file '{}'", staged.display()))?;
        f.write_all(contents).context("write staged contents")?;
        // Data is on disk before the rename makes it visible.
        f.sync_all().context("fsync staged file")?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_options() {
        let opts = WriteOptions::default();
        assert!(!opts.overwrite);
        assert_eq!(opts.dir_perms, 0o750);
        assert_eq!(opts.file_perms, 0o600);
        assert!(opts.user.is_none());
        assert!(opts.group.is_none());
    }

    #[test]
    fn staged_path_is_tagged_with_destination_name() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let dest = base.join("report.csv");

        write_with(&dest, &WriteOptions::default(), |staged| {
            assert_eq!(staged.file_name().unwrap(), "report.csv");
            let staging_dir = staged.parent().unwrap();
            assert_eq!(staging_dir.parent().unwrap(), base);
            let dir_name = staging_dir.file_name().unwrap().to_string_lossy();
            assert!(dir_name.starts_with("report.csv"), "got '{dir_name}'");
            assert!(dir_name.ends_with(".tmp"), "got '{dir_name}'");
            fs::write(staged, "x")?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn closure_value_is_returned() {
        let td = tempdir().unwrap();
        let dest = fs::canonicalize(td.path()).unwrap().join("file.txt");
        let n = write_with(&dest, &WriteOptions::default(), |staged| {
            fs::write(staged, "abc")?;
            Ok(3usize)
        })
        .unwrap();
        assert_eq!(n, 3);
    }
}
