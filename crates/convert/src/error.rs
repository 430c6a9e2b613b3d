use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while converting a file or a directory of files.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("File or directory does not exist: '{}'", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read point cloud '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write point cloud '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list directory '{}': {source}", path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
