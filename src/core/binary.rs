//! Binary type produced by a load.
//!
//! A `Binary` owns every record extracted from an executable: its format and
//! architecture, the entry point, the loadable sections, the function symbols
//! and any warnings raised while reading symbol tables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::section::{Section, SectionKind, TEXT_SECTION};
use crate::core::symbol::Symbol;
use crate::error::LoaderError;

/// The executable format of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// Executable and Linkable Format (Linux, Unix)
    Elf,
    /// Portable Executable (Windows)
    Pe,
    /// Neither of the supported formats
    Unrecognized,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Elf => write!(f, "ELF"),
            Format::Pe => write!(f, "PE"),
            Format::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// The CPU architecture of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// x86, 32- or 64-bit (see `Binary::bits`)
    X86,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
        }
    }
}

/// The endianness of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    /// Little-endian byte order
    Little,
    /// Big-endian byte order
    Big,
}

impl From<crate::cursor::Endian> for Endianness {
    fn from(e: crate::cursor::Endian) -> Self {
        match e {
            crate::cursor::Endian::Little => Endianness::Little,
            crate::cursor::Endian::Big => Endianness::Big,
        }
    }
}

/// Non-fatal problem recorded while loading symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadWarning {
    /// Table the problem was found in (".symtab", ".dynsym", "exports", ...)
    pub table: String,
    pub message: String,
}

impl LoadWarning {
    pub fn new(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Downgrade a loader error for `table` into a warning.
    pub fn from_error(table: &str, err: &LoaderError) -> Self {
        match err {
            LoaderError::SymbolTableError { table, message } => Self::new(table, message),
            other => Self::new(table, other.to_string()),
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.table, self.message)
    }
}

/// A fully loaded executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    /// Caller-supplied label (usually a file name)
    pub source: String,
    pub format: Format,
    /// Target name, e.g. "elf64-x86-64" or "pei-i386"
    pub format_name: String,
    pub arch: Arch,
    /// Architecture name, e.g. "i386:x86-64"
    pub arch_name: String,
    /// Word width, 32 or 64
    pub bits: u8,
    pub endianness: Endianness,
    /// Entry point virtual address
    pub entry: u64,
    pub sections: Vec<Section>,
    pub symbols: Vec<Symbol>,
    /// Symbol-table problems that did not stop the load
    pub warnings: Vec<LoadWarning>,
}

impl Binary {
    /// First section whose `[vma, vma + size)` range contains `addr`.
    pub fn section_at(&self, addr: u64) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains(addr))
    }

    /// The `.text` section, if loaded.
    pub fn text_section(&self) -> Option<&Section> {
        self.section_by_name(TEXT_SECTION)
    }

    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn sections_of_kind(&self, kind: SectionKind) -> impl Iterator<Item = &Section> + '_ {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// First symbol with the given name.
    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Symbols whose address lies inside `section`.
    pub fn functions_in<'a>(&'a self, section: &'a Section) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.symbols.iter().filter(move |s| section.contains(s.addr))
    }

    /// Section holding the entry point.
    pub fn entry_section(&self) -> Option<&Section> {
        self.section_at(self.entry)
    }

    pub fn is_64_bit(&self) -> bool {
        self.bits == 64
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}, {}-bit, entry {:#x}, {} sections, {} symbols)",
            self.source,
            self.format_name,
            self.arch_name,
            self.bits,
            self.entry,
            self.sections.len(),
            self.symbols.len()
        )
    }
}
