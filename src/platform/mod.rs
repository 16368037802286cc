//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the rest of the codebase can remain platform-agnostic.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{apply_ownership, apply_permissions};
#[cfg(not(unix))]
pub use windows::{apply_ownership, apply_permissions};

use anyhow::Result;
use std::path::Path;

/// Apply mode bits, then ownership when a user or group was requested.
pub(crate) fn set_properties(
    path: &Path,
    mode: u32,
    user: Option<&str>,
    group: Option<&str>,
) -> Result<()> {
    apply_permissions(path, mode)?;
    if user.is_some() || group.is_some() {
        apply_ownership(path, user, group)?;
    }
    Ok(())
}
