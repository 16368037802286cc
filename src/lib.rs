//! Core library for `stagewrite`.
//!
//! Atomically write a file given a target path: callers write into a
//! private staging directory created next to the destination and, when
//! the writing closure completes without error, the staged file is
//! published with a single atomic rename. Parent directories are
//! provisioned on the way with the configured mode and ownership; the
//! staging directory is removed on every exit path, success or failure.
//!
//! ```no_run
//! use stagewrite::{WriteOptions, write_with};
//!
//! let opts = WriteOptions::default();
//! write_with("/tmp/reports/out.txt", &opts, |staged| {
//!     std::fs::write(staged, "hello")?;
//!     Ok(())
//! })?;
//! # anyhow::Ok(())
//! ```

pub mod errors;
pub mod provision;
pub mod publish;
pub mod resolve;
pub mod writer;

mod platform;

pub use errors::StageWriteError;
pub use provision::Provision;
pub use publish::{move_atomic, replace_atomic};
pub use resolve::resolve_destination;
pub use writer::{DIR_PERMS_DEFAULT, FILE_PERMS_DEFAULT, WriteOptions, write_bytes, write_with};
