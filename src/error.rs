//! Error types for the binload loader.
//!
//! A single `thiserror` enum covers every failure the parser can report.
//! Symbol-table failures never escape `parse`; they are downgraded to
//! [`LoadWarning`](crate::core::binary::LoadWarning)s on the returned binary.

use thiserror::Error;

/// Main error type for loader operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// A computed read range does not fit in the buffer
    #[error("Out of bounds read at offset {offset:#x} (length {len}, buffer size {size})")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// Neither ELF nor PE magic was found
    #[error("Unsupported binary format")]
    UnsupportedFormat,

    /// An explicit format hint contradicts the sniffed magic
    #[error("Format mismatch: requested {requested}, found {found}")]
    FormatMismatch { requested: String, found: String },

    /// Recognized container with an unsupported machine code
    #[error("Unsupported architecture: {format} machine {machine:#x}")]
    UnsupportedArchitecture { format: String, machine: u16 },

    /// Section header or contents are invalid
    #[error("Corrupt section {name}: {message}")]
    CorruptSection { name: String, message: String },

    /// Symbol or string table is invalid
    #[error("Symbol table error in {table}: {message}")]
    SymbolTableError { table: String, message: String },

    /// Allocation refused while copying section bytes
    #[error("Out of memory: could not allocate {requested} bytes")]
    OutOfMemory { requested: u64 },
}

impl LoaderError {
    /// Build a `CorruptSection` error.
    pub fn corrupt_section(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptSection {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Build a `SymbolTableError`.
    pub fn symbol_table(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SymbolTableError {
            table: table.into(),
            message: message.into(),
        }
    }

    /// True when this error only affects symbol loading.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SymbolTableError { .. })
    }
}

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;
