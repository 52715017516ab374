//! Configuration for the loader.
//!
//! Every field has a default, so partial JSON documents are accepted.

use serde::{Deserialize, Serialize};

/// Limits and switches applied during a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Largest section header count accepted before the table is treated as corrupt.
    pub max_sections: usize,
    /// Entries read from one symbol table before truncating with a warning.
    pub max_symbols_per_table: usize,
    /// Named exports read before truncating with a warning.
    pub max_exports: usize,
    /// Largest single section copy, in bytes.
    pub max_section_bytes: u64,
    /// Keep undefined (imported) function symbols from ELF tables.
    pub include_undefined_symbols: bool,
    /// Read the PE COFF symbol table as the static symbol source.
    pub coff_symbols: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_sections: 65_536,
            max_symbols_per_table: 1_000_000,
            max_exports: 10_000,
            max_section_bytes: 1024 * 1024 * 1024,
            include_undefined_symbols: true,
            coff_symbols: true,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
