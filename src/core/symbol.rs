//! Symbol type for named functions.
//!
//! Symbols come from ELF `.symtab`/`.dynsym`, the PE COFF symbol table and
//! the PE export directory. Only functions survive loading.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::demangle;

/// Symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Function symbol
    Function,
    /// Anything else; filtered out before reaching a `Binary`
    Unknown,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "FUNC"),
            SymbolKind::Unknown => write!(f, "UKN"),
        }
    }
}

/// Table a symbol was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolSource {
    /// ELF `.symtab` or PE COFF symbol table
    Static,
    /// ELF `.dynsym`
    Dynamic,
    /// PE export directory
    Export,
}

impl fmt::Display for SymbolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolSource::Static => write!(f, "static"),
            SymbolSource::Dynamic => write!(f, "dynamic"),
            SymbolSource::Export => write!(f, "export"),
        }
    }
}

/// A resolved symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Symbol name; empty when the string table lookup failed
    pub name: String,
    /// Absolute virtual address
    pub addr: u64,
    pub source: SymbolSource,
}

impl Symbol {
    /// Create a function symbol.
    pub fn function(name: impl Into<String>, addr: u64, source: SymbolSource) -> Self {
        Self {
            kind: SymbolKind::Function,
            name: name.into(),
            addr,
            source,
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    /// Demangled name for Rust, Itanium C++ and MSVC symbols.
    pub fn demangled_name(&self) -> Option<String> {
        demangle::demangle(&self.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<40} {:#018x} {}", self.name, self.addr, self.kind)
    }
}
