//! Bounded file access for callers that start from a path.
//!
//! The parser itself only ever sees a byte slice. `BinaryFile` memory-maps a
//! file under a size limit and hands its contents to the loader.

pub mod error;

use crate::core::binary::Binary;
use crate::io::error::{IoError, LoadFileError, Result};
use crate::loader::{FormatHint, Loader};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Defines the resource limits for file access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024, // 512MB
        }
    }
}

/// An executable's bytes, read from disk under `IOLimits`.
#[derive(Debug, Clone)]
pub struct BinaryFile {
    path: PathBuf,
    data: Bytes,
}

impl BinaryFile {
    /// Opens and memory-maps a file, copying its contents into a `Bytes` buffer.
    ///
    /// Fails if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening binary"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        // memmap cannot map empty files
        let data = if file_size == 0 {
            Bytes::new()
        } else {
            // Safety: read-only map of a regular file; the copy below detaches
            // the buffer from later modifications of the file.
            let mmap = unsafe { Mmap::map(&file)? };
            Bytes::copy_from_slice(&mmap[..])
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Cheap reference-counted handle to the contents
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parse with `loader`, labelling the result with the file path.
    pub fn parse_with(&self, loader: &Loader, hint: FormatHint) -> crate::error::Result<Binary> {
        let source = self.path.display().to_string();
        loader.parse_named(&source, &self.data, hint)
    }
}

/// Read `path` with default limits and parse it with the default configuration.
pub fn load_file<P: AsRef<Path>>(
    path: P,
    hint: FormatHint,
) -> std::result::Result<Binary, LoadFileError> {
    let file = BinaryFile::open(path, IOLimits::default())
        .map_err(|e| crate::log_error!(e, "open"))?;
    let binary = file
        .parse_with(&Loader::new(), hint)
        .map_err(|e| crate::log_error!(e, "parse"))?;
    Ok(binary)
}
