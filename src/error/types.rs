use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The storage primitive that failed underneath a lock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Stat,
    Create,
    Remove,
    Touch,
    Scan,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            StorageOp::Stat => "stat",
            StorageOp::Create => "create",
            StorageOp::Remove => "remove",
            StorageOp::Touch => "touch",
            StorageOp::Scan => "scan",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Failed to acquire lock on {0}: held by another process")]
    Locked(PathBuf),

    #[error("Failed to renew lock on {0}: not locked")]
    NotLocked(PathBuf),

    #[error("Failed to {op} lock marker {path}: {source}")]
    Io {
        op: StorageOp,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Invalid duration format '{input}': {message}")]
    InvalidDuration { input: String, message: String },

    #[error("Marker path {marker} collides with the resource it guards ({resource})")]
    MarkerCollision { marker: PathBuf, resource: PathBuf },

    #[error("Failed to create lock cache directory {path}: {source}")]
    CacheDirectoryFailed { path: PathBuf, source: io::Error },

    #[error("{0}")]
    Other(String),
}

impl LockError {
    pub(crate) fn io(op: StorageOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        LockError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockError::Locked(_))
    }

    pub fn is_not_locked(&self) -> bool {
        matches!(self, LockError::NotLocked(_))
    }

    /// The underlying storage failure, if this is an I/O error.
    pub fn io_source(&self) -> Option<&io::Error> {
        match self {
            LockError::Io { source, .. } | LockError::CacheDirectoryFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::Locked(_) => 2,
            LockError::NotLocked(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LockError>;
