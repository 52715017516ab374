//! binload: ELF and PE executable loader.
//!
//! Given the raw bytes of an executable, binload identifies the container
//! format, architecture and word width, the entry point, the code and data
//! sections and the function symbols, and returns them as an owned
//! [`Binary`].
//!
//! ```no_run
//! use binload::{parse_named, FormatHint};
//!
//! let data = std::fs::read("/bin/true").unwrap();
//! let bin = parse_named("/bin/true", &data, FormatHint::Auto).unwrap();
//! if let Some(text) = bin.text_section() {
//!     println!("{}", text);
//! }
//! ```

/// Logging setup and macros
pub mod logging;

pub mod config;
/// Core data types module
pub mod core;
pub mod cursor;
pub mod demangle;
pub mod error;
pub mod formats;
pub mod io;
pub mod loader;
pub mod symbols;

pub use crate::config::LoaderConfig;
pub use crate::core::binary::{Arch, Binary, Endianness, Format, LoadWarning};
pub use crate::core::section::{Section, SectionKind};
pub use crate::core::symbol::{Symbol, SymbolKind, SymbolSource};
pub use crate::cursor::{AddrWidth, ByteCursor, Endian};
pub use crate::error::{LoaderError, Result};
pub use crate::io::{load_file, BinaryFile, IOLimits};
pub use crate::loader::{parse, parse_named, FormatHint, Loader};
