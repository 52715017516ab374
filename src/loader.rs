//! Top-level load entry points.
//!
//! A load runs sniff, header decode, section load and symbol load in that
//! order. The first three stages abort on error; symbol tables that fail are
//! recorded as warnings on the returned [`Binary`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::LoaderConfig;
use crate::core::binary::{Binary, Format};
use crate::cursor::ByteCursor;
use crate::error::{LoaderError, Result};
use crate::formats::elf::ElfParser;
use crate::formats::pe::PeParser;
use crate::formats::sniff;

/// Source label used when the caller does not supply one
pub const DEFAULT_SOURCE: &str = "<memory>";

/// Which format the caller expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatHint {
    /// Detect from the magic bytes
    #[default]
    Auto,
    Elf,
    Pe,
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Auto => write!(f, "auto"),
            FormatHint::Elf => write!(f, "ELF"),
            FormatHint::Pe => write!(f, "PE"),
        }
    }
}

/// Loader with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Decide which parser to run.
    fn select(&self, data: &[u8], hint: FormatHint) -> Result<Format> {
        let found = sniff(data);
        debug!(found = %found, hint = %hint, "sniffed");

        match (hint, found) {
            (FormatHint::Auto, Format::Unrecognized) => Err(LoaderError::UnsupportedFormat),
            (FormatHint::Auto, found) => Ok(found),
            (FormatHint::Elf, Format::Elf) => Ok(Format::Elf),
            (FormatHint::Pe, Format::Pe) => Ok(Format::Pe),
            (hint, found) => Err(LoaderError::FormatMismatch {
                requested: hint.to_string(),
                found: found.to_string(),
            }),
        }
    }

    /// Parse `data` with the label `source` attached for diagnostics.
    pub fn parse_named(&self, source: &str, data: &[u8], hint: FormatHint) -> Result<Binary> {
        let span = crate::span_trace!("load", source = %source, size = data.len());
        let _guard = span.enter();

        let format = self.select(data, hint)?;
        let cursor = ByteCursor::new(data);

        let binary = match format {
            Format::Elf => ElfParser::parse(cursor, &self.config)?.load(source, &self.config)?,
            Format::Pe => PeParser::parse(cursor, &self.config)?.load(source, &self.config)?,
            Format::Unrecognized => return Err(LoaderError::UnsupportedFormat),
        };

        debug!(
            format = %binary.format_name,
            sections = binary.sections.len(),
            symbols = binary.symbols.len(),
            warnings = binary.warnings.len(),
            "loaded"
        );
        Ok(binary)
    }

    /// Parse `data` under the default source label.
    pub fn parse(&self, data: &[u8], hint: FormatHint) -> Result<Binary> {
        self.parse_named(DEFAULT_SOURCE, data, hint)
    }
}

/// Parse a buffer with the default configuration.
pub fn parse(data: &[u8], hint: FormatHint) -> Result<Binary> {
    Loader::new().parse(data, hint)
}

/// Parse a buffer with the default configuration and a source label.
pub fn parse_named(source: &str, data: &[u8], hint: FormatHint) -> Result<Binary> {
    Loader::new().parse_named(source, data, hint)
}
