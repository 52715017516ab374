//! Custom error types for the I/O module.

use thiserror::Error;

use crate::error::LoaderError;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File size of {found} bytes exceeds the maximum allowed size of {limit} bytes.")]
    FileTooLarge { limit: u64, found: u64 },

    #[error("An underlying I/O error occurred: {0}")]
    StdIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;

/// Failure of [`load_file`](crate::io::load_file): either reading or parsing
#[derive(Error, Debug)]
pub enum LoadFileError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Load(#[from] LoaderError),
}
