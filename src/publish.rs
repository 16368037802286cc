//! Atomic publish primitives.
//! - `replace_atomic` supersedes any existing destination in one step.
//! - `move_atomic` refuses an existing destination; the refusal comes from
//!   the syscall itself, not from a racy pre-check.
//! - On Unix, best-effort fsync of the destination directory after publish.

use crate::errors::StageWriteError;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Atomically replace any existing file at `dst` with `src`.
pub fn replace_atomic(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(unix)]
    fs::rename(src, dst)
        .with_context(|| format!("atomic replace '{}' -> '{}'", src.display(), dst.display()))?;

    #[cfg(not(unix))]
    move_file_ex(src, dst, true)
        .with_context(|| format!("atomic replace '{}' -> '{}'", src.display(), dst.display()))?;

    sync_parent_dir(dst);
    Ok(())
}

/// Atomically move `src` to `dst`, failing with `DestinationExists` when a
/// file is already present there.
pub fn move_atomic(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        // link(2) fails with EEXIST when dst is present, so the existence
        // check and the publish are a single indivisible step.
        match fs::hard_link(src, dst) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StageWriteError::DestinationExists(dst.to_path_buf()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("atomic move '{}' -> '{}'", src.display(), dst.display())
                });
            }
        }
        fs::remove_file(src)
            .with_context(|| format!("remove staged source '{}'", src.display()))?;
    }

    #[cfg(not(unix))]
    {
        match move_file_ex(src, dst, false) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StageWriteError::DestinationExists(dst.to_path_buf()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("atomic move '{}' -> '{}'", src.display(), dst.display())
                });
            }
        }
    }

    sync_parent_dir(dst);
    Ok(())
}

/// Best-effort fsync of `dst`'s parent so the rename itself is durable.
fn sync_parent_dir(dst: &Path) {
    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // Ignore fsync errors to avoid turning a successful rename into a failure.
        let _ = fs::File::open(parent).and_then(|f| f.sync_all());
    }
    #[cfg(not(unix))]
    let _ = dst;
}

/// MoveFileExW wrapper; rename doesn't overwrite on Windows unless asked to.
#[cfg(not(unix))]
fn move_file_ex(src: &Path, dst: &Path, replace: bool) -> io::Result<()> {
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::{
        MOVEFILE_REPLACE_EXISTING, MOVEFILE_WRITE_THROUGH, MoveFileExW,
    };

    fn wide(p: &Path) -> Vec<u16> {
        p.as_os_str().encode_wide().chain(std::iter::once(0)).collect()
    }

    let src_w = wide(src);
    let dst_w = wide(dst);
    let mut flags = MOVEFILE_WRITE_THROUGH;
    if replace {
        flags |= MOVEFILE_REPLACE_EXISTING;
    }
    let ok = unsafe { MoveFileExW(src_w.as_ptr(), dst_w.as_ptr(), flags) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
