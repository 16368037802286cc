//! Unix implementations of platform helpers.
//! Name-to-id resolution goes through the reentrant getpwnam_r/getgrnam_r
//! so the helpers stay safe to call from threaded callers.

use crate::errors::StageWriteError;
use anyhow::{Context, Result};
use std::ffi::CString;
use std::fs;
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::ptr;

/// POSIX chmod with the given mode bits.
pub fn apply_permissions(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("set mode {:o} on '{}'", mode, path.display()))
}

/// POSIX chown by user/group name. An id that was not requested is left
/// unchanged (chown's -1 convention).
pub fn apply_ownership(path: &Path, user: Option<&str>, group: Option<&str>) -> Result<()> {
    if user.is_none() && group.is_none() {
        return Ok(());
    }
    let uid = match user {
        Some(name) => lookup_uid(name)?,
        None => libc::uid_t::MAX,
    };
    let gid = match group {
        Some(name) => lookup_gid(name)?,
        None => libc::gid_t::MAX,
    };
    let c_path = c_path(path)?;
    let rc = unsafe { libc::chown(c_path.as_ptr(), uid, gid) };
    if rc != 0 {
        return Err(io::Error::last_os_error()).with_context(|| format!("chown '{}'", path.display()));
    }
    Ok(())
}

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains null byte"))
}

/// Resolve a user name to a uid.
fn lookup_uid(name: &str) -> Result<libc::uid_t> {
    let c_name =
        CString::new(name).map_err(|_| StageWriteError::UnknownUser(name.to_string()))?;
    let mut buf = vec![0u8; 4096];
    loop {
        let mut pwd: MaybeUninit<libc::passwd> = MaybeUninit::uninit();
        let mut result: *mut libc::passwd = ptr::null_mut();
        let rc = unsafe {
            libc::getpwnam_r(
                c_name.as_ptr(),
                pwd.as_mut_ptr(),
                buf.as_mut_ptr().cast(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < (1 << 20) {
            let new_len = buf.len() * 2;
            buf.resize(new_len, 0);
            continue;
        }
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc))
                .with_context(|| format!("look up user '{name}'"));
        }
        if result.is_null() {
            return Err(StageWriteError::UnknownUser(name.to_string()).into());
        }
        return Ok(unsafe { (*result).pw_uid });
    }
}

/// Resolve a group name to a gid.
fn lookup_gid(name: &str) -> Result<libc::gid_t> {
    let c_name =
        CString::new(name).map_err(|_| StageWriteError::UnknownGroup(name.to_string()))?;
    let mut buf = vec![0u8; 4096];
    loop {
        let mut grp: MaybeUninit<libc::group> = MaybeUninit::uninit();
        let mut result: *mut libc::group = ptr::null_mut();
        let rc = unsafe {
            libc::getgrnam_r(
                c_name.as_ptr(),
                grp.as_mut_ptr(),
                buf.as_mut_ptr().cast(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < (1 << 20) {
            let new_len = buf.len() * 2;
            buf.resize(new_len, 0);
            continue;
        }
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc))
                .with_context(|| format!("look up group '{name}'"));
        }
        if result.is_null() {
            return Err(StageWriteError::UnknownGroup(name.to_string()).into());
        }
        return Ok(unsafe { (*result).gr_gid });
    }
}
