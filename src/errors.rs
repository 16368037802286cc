//! Typed error definitions for stagewrite.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageWriteError {
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Destination has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("Destination has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),
}
