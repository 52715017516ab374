//! COFF symbol and string tables
//!
//! Images linked by MinGW and similar toolchains keep a COFF symbol table
//! after the section data. It supplies the static function symbols and the
//! long section names (`/NNN`).

use tracing::debug;

use crate::config::LoaderConfig;
use crate::core::symbol::{Symbol, SymbolSource};
use crate::cursor::{ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::pe::sections::SectionTable;
use crate::formats::pe::types::*;
use crate::symbols::LoadedTable;

const LE: Endian = Endian::Little;

/// Table name used in warnings
pub const COFF_TABLE: &str = "coff";

/// Longest name read from the string table.
const MAX_NAME: usize = 4096;

/// The COFF string table; offsets count from its 4-byte size field
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'data> {
    cursor: ByteCursor<'data>,
}

impl<'data> StringTable<'data> {
    /// Locate the string table that follows the symbol table.
    ///
    /// Returns `None` if the image has no symbol table or the string table
    /// does not fit in the file.
    pub fn locate(cursor: &ByteCursor<'data>, coff: &CoffHeader) -> Option<Self> {
        if coff.pointer_to_symbol_table == 0 {
            return None;
        }
        let offset = u64::from(coff.number_of_symbols)
            .checked_mul(COFF_SYMBOL_SIZE)?
            .checked_add(u64::from(coff.pointer_to_symbol_table))?;
        let size = cursor.read_u32_at(offset, LE).ok()?;
        if size < 4 {
            return None;
        }
        let table = cursor.sub(offset, u64::from(size)).ok()?;
        Some(Self { cursor: table })
    }

    /// Zero-terminated string at `offset`
    pub fn get(&self, offset: u32) -> Result<String> {
        if offset < 4 {
            return Err(LoaderError::symbol_table(
                COFF_TABLE,
                format!("string offset {} inside size field", offset),
            ));
        }
        self.cursor.read_cstr_at(u64::from(offset), MAX_NAME)
    }
}

/// Raw COFF symbol record (18 bytes)
#[derive(Debug, Clone, Copy)]
pub struct CoffSymbol {
    pub name: [u8; 8],
    pub value: u32,
    pub section_number: i16,
    pub typ: u16,
    pub storage_class: u8,
    pub number_of_aux_symbols: u8,
}

impl CoffSymbol {
    pub fn is_function(&self) -> bool {
        self.typ & 0x30 == IMAGE_SYM_DTYPE_FUNCTION
            && matches!(
                self.storage_class,
                IMAGE_SYM_CLASS_EXTERNAL | IMAGE_SYM_CLASS_STATIC
            )
    }

    /// String table offset when the name does not fit inline
    pub fn long_name_offset(&self) -> Option<u32> {
        if self.name[..4] == [0, 0, 0, 0] {
            Some(u32::from_le_bytes([
                self.name[4],
                self.name[5],
                self.name[6],
                self.name[7],
            ]))
        } else {
            None
        }
    }

    fn inline_name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

fn parse_symbol(cursor: &ByteCursor<'_>, offset: u64) -> Result<CoffSymbol> {
    let record = cursor.slice(offset, COFF_SYMBOL_SIZE)?;
    let mut name = [0u8; 8];
    name.copy_from_slice(&record[..8]);
    Ok(CoffSymbol {
        name,
        value: cursor.read_u32_at(offset + 8, LE)?,
        section_number: cursor.read_u16_at(offset + 12, LE)? as i16,
        typ: cursor.read_u16_at(offset + 14, LE)?,
        storage_class: record[16],
        number_of_aux_symbols: record[17],
    })
}

/// Read function symbols from the COFF symbol table.
///
/// Addresses are `image_base + section RVA + value`, wrapped to the image's
/// word width. Symbols that refer to
/// a missing section are skipped with a warning.
pub fn read_coff_symbols(
    cursor: &ByteCursor<'_>,
    coff: &CoffHeader,
    strings: Option<&StringTable<'_>>,
    sections: &SectionTable,
    optional: &OptionalHeader,
    config: &LoaderConfig,
) -> Result<LoadedTable> {
    let mut table = LoadedTable::new(COFF_TABLE);
    let base = u64::from(coff.pointer_to_symbol_table);

    let mut count = u64::from(coff.number_of_symbols);
    if count > config.max_symbols_per_table as u64 {
        table.warn(format!(
            "{} records truncated to {}",
            count, config.max_symbols_per_table
        ));
        count = config.max_symbols_per_table as u64;
    }

    let to_table_error = |err: LoaderError| match err {
        LoaderError::OutOfBounds { .. } => {
            LoaderError::symbol_table(COFF_TABLE, format!("symbol table beyond end of file: {}", err))
        }
        other => other,
    };

    let mut index = 0u64;
    while index < count {
        let sym = parse_symbol(cursor, base + index * COFF_SYMBOL_SIZE).map_err(to_table_error)?;
        let record = index;
        index += 1 + u64::from(sym.number_of_aux_symbols);

        if !sym.is_function() || sym.section_number <= 0 {
            continue;
        }

        let section = match sections.by_index(sym.section_number as usize - 1) {
            Some(section) => section,
            None => {
                table.warn(format!(
                    "symbol {}: section number {} out of range",
                    record, sym.section_number
                ));
                continue;
            }
        };

        let name = match sym.long_name_offset() {
            None => sym.inline_name(),
            Some(offset) => match strings.map(|s| s.get(offset)) {
                Some(Ok(name)) => name,
                _ => {
                    table.warn(format!(
                        "symbol {}: name offset {:#x} outside string table",
                        record, offset
                    ));
                    String::new()
                }
            },
        };

        let addr = optional.va(u64::from(section.virtual_address) + u64::from(sym.value));
        table.symbols.push(Symbol::function(name, addr, SymbolSource::Static));
    }

    debug!(records = count, functions = table.symbols.len(), "COFF symbols");
    Ok(table)
}
