//! Windows implementations of platform helpers (best-effort, minimal ACL awareness).
//!
//! Notes:
//! - Windows lacks POSIX mode semantics; we do not attempt ACL management here.
//! - User/group owner names likewise have no POSIX counterpart.

use anyhow::Result;
use std::path::Path;

/// No-op on Windows; POSIX-style modes are not applicable.
pub fn apply_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// No-op on Windows; POSIX user/group ownership is not applicable.
pub fn apply_ownership(_path: &Path, _user: Option<&str>, _group: Option<&str>) -> Result<()> {
    Ok(())
}
