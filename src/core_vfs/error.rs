use std::io;
use thiserror::Error;

/// Filesystem failures, worded for the reply line.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("No such file or directory")]
    NotFound,

    #[error("File exists")]
    AlreadyExists,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not a directory")]
    NotADirectory,

    #[error("Not a plain file")]
    NotAFile,

    #[error("{0}")]
    Io(String),
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied,
            _ => FsError::Io(e.to_string()),
        }
    }
}
