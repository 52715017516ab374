//! PE (Portable Executable) parser
//!
//! Handles PE32 and PE32+ images for i386 and x86-64. Function symbols
//! come from the COFF symbol table (static) and the export directory.

pub mod coff;
pub mod exports;
pub mod headers;
pub mod sections;
pub mod types;

use tracing::debug;

use crate::config::LoaderConfig;
use crate::core::binary::{Arch, Binary, Endianness, Format};
use crate::cursor::ByteCursor;
use crate::error::{LoaderError, Result};
use crate::symbols::{merge, TableOutcome};
use coff::{StringTable, COFF_TABLE};
use exports::EXPORT_TABLE;
use headers::{parse_headers, PeHeaders};
use sections::SectionTable;
pub use types::*;

/// Main PE parser
pub struct PeParser<'data> {
    cursor: ByteCursor<'data>,
    headers: PeHeaders,
    strings: Option<StringTable<'data>>,
    sections: SectionTable,
}

impl<'data> PeParser<'data> {
    /// Decode headers and the section table.
    pub fn parse(cursor: ByteCursor<'data>, config: &LoaderConfig) -> Result<Self> {
        let headers = parse_headers(&cursor)?;

        let machine = headers.coff.machine;
        if !matches!(machine, IMAGE_FILE_MACHINE_I386 | IMAGE_FILE_MACHINE_AMD64) {
            return Err(LoaderError::UnsupportedArchitecture {
                format: "PE".to_string(),
                machine,
            });
        }

        debug!(
            machine,
            magic = headers.optional.magic,
            entry_rva = headers.optional.address_of_entry_point,
            image_base = headers.optional.image_base,
            nsections = headers.coff.number_of_sections,
            "PE headers"
        );

        let strings = StringTable::locate(&cursor, &headers.coff);
        let sections = SectionTable::parse(
            &cursor,
            headers.section_table_offset,
            headers.coff.number_of_sections,
            strings.as_ref(),
            config,
        )?;

        Ok(Self {
            cursor,
            headers,
            strings,
            sections,
        })
    }

    pub fn headers(&self) -> &PeHeaders {
        &self.headers
    }

    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    pub fn image_base(&self) -> u64 {
        self.headers.optional.image_base
    }

    /// Entry point as a virtual address
    pub fn entry(&self) -> u64 {
        self.headers.optional.entry()
    }

    /// Target name in the style of the GNU BFD library
    pub fn format_name(&self) -> &'static str {
        match self.headers.coff.machine {
            IMAGE_FILE_MACHINE_AMD64 => "pei-x86-64",
            _ => "pei-i386",
        }
    }

    /// Architecture name in the style of the GNU BFD library
    pub fn arch_name(&self) -> &'static str {
        match self.headers.coff.machine {
            IMAGE_FILE_MACHINE_AMD64 => "i386:x86-64",
            _ => "i386",
        }
    }

    /// Read the COFF symbol table and export directory, static first.
    pub fn symbol_tables(&self, config: &LoaderConfig) -> Vec<TableOutcome> {
        let mut outcomes = Vec::new();
        let coff = &self.headers.coff;

        if config.coff_symbols && coff.pointer_to_symbol_table != 0 && coff.number_of_symbols != 0
        {
            let result = coff::read_coff_symbols(
                &self.cursor,
                coff,
                self.strings.as_ref(),
                &self.sections,
                &self.headers.optional,
                config,
            );
            outcomes.push(TableOutcome::from_result(COFF_TABLE, result));
        }

        match self.headers.data_directory(IMAGE_DIRECTORY_ENTRY_EXPORT) {
            Some(dir) if dir.is_present() => {
                let result = exports::read_exports(
                    &self.cursor,
                    &self.sections,
                    dir,
                    &self.headers.optional,
                    config,
                );
                outcomes.push(TableOutcome::from_result(EXPORT_TABLE, result));
            }
            _ => debug!("no export directory"),
        }

        outcomes
    }

    /// Build the full binary model.
    pub fn load(&self, source: &str, config: &LoaderConfig) -> Result<Binary> {
        let width = self.headers.optional.width();
        let sections =
            self.sections
                .load(&self.cursor, self.image_base(), width, source, config)?;
        let merged = merge(self.symbol_tables(config));

        Ok(Binary {
            source: source.to_string(),
            format: Format::Pe,
            format_name: self.format_name().to_string(),
            arch: Arch::X86,
            arch_name: self.arch_name().to_string(),
            bits: width.bits(),
            endianness: Endianness::Little,
            entry: self.entry(),
            sections,
            symbols: merged.symbols,
            warnings: merged.warnings,
        })
    }
}
