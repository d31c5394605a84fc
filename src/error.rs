//! Error taxonomy for the signature pipeline.
//!
//! One [`thiserror`]-derived enum carries every failure class the pipeline can
//! raise so callers can match on kind while still getting a human-readable
//! message. [`exit_code`] maps a top-level error to the process exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Which side of the pipeline an I/O failure originated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOrigin {
    Input,
    Output,
}

impl std::fmt::Display for IoOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IoOrigin::Input => "input",
            IoOrigin::Output => "output",
        })
    }
}

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("bad usage: {0}")]
    Config(String),

    #[error("error during working with {origin} file {path:?}: {source}")]
    Io {
        origin: IoOrigin,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("allocation failed: {0}")]
    Alloc(String),

    #[error("internal error: {0}")]
    Programming(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl SignatureError {
    pub fn io(origin: IoOrigin, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignatureError::Io {
            origin,
            path: path.into(),
            source,
        }
    }
}

/// Process exit codes, matching the original program's top-level `catch` ladder:
/// bad CLI usage, allocation failure, generic error, and an unknown catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    BadUsage = 1,
    OutOfMemory = 2,
    GenericError = 3,
    Unknown = 4,
}

pub fn exit_code(err: &SignatureError) -> ExitCode {
    match err {
        SignatureError::Config(_) => ExitCode::BadUsage,
        SignatureError::Alloc(_) => ExitCode::OutOfMemory,
        SignatureError::Io { .. } | SignatureError::Programming(_) => ExitCode::GenericError,
        SignatureError::Unknown(_) => ExitCode::Unknown,
    }
}
