//! ELF (Executable and Linkable Format) parser
//!
//! Reads the file header, the section header table and the `.symtab` /
//! `.dynsym` symbol tables of 32- and 64-bit images in either byte order.

pub mod headers;
pub mod sections;
pub mod symbols;
pub mod types;

use tracing::debug;

use crate::config::LoaderConfig;
use crate::core::binary::{Arch, Binary, Format};
use crate::core::symbol::SymbolSource;
use crate::cursor::ByteCursor;
use crate::error::{LoaderError, Result};
use crate::symbols::{merge, TableOutcome};
use headers::parse_header;
use sections::SectionTable;
pub use types::*;

/// Main ELF parser
pub struct ElfParser<'data> {
    header: ElfHeader,
    sections: SectionTable<'data>,
}

impl<'data> ElfParser<'data> {
    /// Decode the header and section header table.
    pub fn parse(cursor: ByteCursor<'data>, config: &LoaderConfig) -> Result<Self> {
        let header = parse_header(&cursor)?;

        if !matches!(header.e_machine, EM_386 | EM_X86_64) {
            return Err(LoaderError::UnsupportedArchitecture {
                format: "ELF".to_string(),
                machine: header.e_machine,
            });
        }

        debug!(
            class = header.width().bits(),
            machine = header.e_machine,
            entry = header.e_entry,
            shnum = header.e_shnum,
            "ELF header"
        );

        let sections = SectionTable::parse(cursor, &header, config)?;
        Ok(Self { header, sections })
    }

    /// Get ELF header
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Get section table
    pub fn sections(&self) -> &SectionTable<'data> {
        &self.sections
    }

    /// Target name in the style of the GNU BFD library
    pub fn format_name(&self) -> &'static str {
        match (self.header.ident.class, self.header.ident.data, self.header.e_machine) {
            (ElfClass::Elf32, ElfData::Big, _) => "elf32-big",
            (ElfClass::Elf64, ElfData::Big, _) => "elf64-big",
            (ElfClass::Elf32, ElfData::Little, EM_X86_64) => "elf32-x86-64",
            (ElfClass::Elf32, ElfData::Little, _) => "elf32-i386",
            (ElfClass::Elf64, ElfData::Little, _) => "elf64-x86-64",
        }
    }

    /// Architecture name in the style of the GNU BFD library
    pub fn arch_name(&self) -> &'static str {
        match (self.header.ident.class, self.header.e_machine) {
            (ElfClass::Elf32, EM_X86_64) => "i386:x64-32",
            (_, EM_X86_64) => "i386:x86-64",
            _ => "i386",
        }
    }

    /// Read every symbol table, static tables first.
    pub fn symbol_tables(&self, config: &LoaderConfig) -> Vec<TableOutcome> {
        let mut outcomes = Vec::new();
        for (sh_type, source) in [
            (SHT_SYMTAB, SymbolSource::Static),
            (SHT_DYNSYM, SymbolSource::Dynamic),
        ] {
            for index in self.sections.indices_of_type(sh_type) {
                let table = match self.sections.name(index) {
                    "" if source == SymbolSource::Dynamic => ".dynsym",
                    "" => ".symtab",
                    name => name,
                };
                let result =
                    symbols::read_symbol_table(&self.sections, index, &self.header, source, config);
                outcomes.push(TableOutcome::from_result(table, result));
            }
        }
        outcomes
    }

    /// Build the full binary model.
    pub fn load(&self, source: &str, config: &LoaderConfig) -> Result<Binary> {
        let sections = self.sections.load(source, config)?;
        let merged = merge(self.symbol_tables(config));

        Ok(Binary {
            source: source.to_string(),
            format: Format::Elf,
            format_name: self.format_name().to_string(),
            arch: Arch::X86,
            arch_name: self.arch_name().to_string(),
            bits: self.header.width().bits(),
            endianness: self.header.endian().into(),
            entry: self.header.e_entry,
            sections,
            symbols: merged.symbols,
            warnings: merged.warnings,
        })
    }
}
