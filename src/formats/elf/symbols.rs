//! Symbol table parsing

use tracing::debug;

use crate::config::LoaderConfig;
use crate::core::symbol::{Symbol, SymbolSource};
use crate::cursor::{ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::elf::sections::SectionTable;
use crate::formats::elf::types::*;
use crate::symbols::LoadedTable;

/// Longest symbol name read from a string table.
const MAX_SYMBOL_NAME: usize = 4096;

/// Read the function symbols of the symbol table at `index`.
///
/// Structural problems with the table (bad string table link, contents
/// outside the file) fail the table; a single unresolvable name only
/// produces a warning and an empty name.
pub fn read_symbol_table(
    sections: &SectionTable<'_>,
    index: usize,
    header: &ElfHeader,
    source: SymbolSource,
    config: &LoaderConfig,
) -> Result<LoadedTable> {
    let class = header.ident.class;
    let endian = header.endian();

    let sh = sections.by_index(index).ok_or_else(|| {
        LoaderError::symbol_table("<symbols>", format!("section index {} out of range", index))
    })?;
    let table_name = match sections.name(index) {
        "" if sh.sh_type == SHT_DYNSYM => ".dynsym".to_string(),
        "" => ".symtab".to_string(),
        name => name.to_string(),
    };
    let mut table = LoadedTable::new(table_name.clone());

    let link = sh.sh_link as usize;
    if link == 0 || link >= sections.count() {
        return Err(LoaderError::symbol_table(
            table_name,
            format!("string table link {} out of range", sh.sh_link),
        ));
    }

    let entries = sections.contents(index).map_err(|_| {
        LoaderError::symbol_table(
            table_name.clone(),
            format!(
                "contents at {:#x}+{:#x} exceed file size",
                sh.sh_offset, sh.sh_size
            ),
        )
    })?;
    let strings = sections.contents(link).map_err(|_| {
        LoaderError::symbol_table(
            table_name.clone(),
            format!("string table {} exceeds file size", link),
        )
    })?;

    let entsize = match sh.sh_entsize {
        0 => class.symbol_size(),
        n if n < class.symbol_size() => {
            return Err(LoaderError::symbol_table(
                table_name,
                format!("entry size {} smaller than {}", n, class.symbol_size()),
            ))
        }
        n => n,
    };

    let mut count = entries.len() as u64 / entsize;
    if count > config.max_symbols_per_table as u64 {
        table.warn(format!(
            "{} entries truncated to {}",
            count, config.max_symbols_per_table
        ));
        count = config.max_symbols_per_table as u64;
    }

    for i in 0..count {
        let sym = parse_symbol(&entries, i * entsize, class, endian)?;

        if !sym.is_function() {
            continue;
        }
        if sym.is_undefined() && !config.include_undefined_symbols {
            continue;
        }

        let name = if sym.st_name == 0 {
            String::new()
        } else {
            match strings.read_cstr_at(u64::from(sym.st_name), MAX_SYMBOL_NAME) {
                Ok(name) => name,
                Err(_) => {
                    table.warn(format!(
                        "symbol {}: name offset {:#x} outside string table",
                        i, sym.st_name
                    ));
                    String::new()
                }
            }
        };

        table.symbols.push(Symbol::function(name, sym.st_value, source));
    }

    debug!(
        table = %table.table,
        entries = count,
        functions = table.symbols.len(),
        "symbol table"
    );
    Ok(table)
}

/// Parse a single symbol entry
fn parse_symbol(
    cursor: &ByteCursor<'_>,
    offset: u64,
    class: ElfClass,
    endian: Endian,
) -> Result<ElfSymbol> {
    match class {
        ElfClass::Elf32 => Ok(ElfSymbol {
            st_name: cursor.read_u32_at(offset, endian)?,
            st_value: u64::from(cursor.read_u32_at(offset + 4, endian)?),
            st_size: u64::from(cursor.read_u32_at(offset + 8, endian)?),
            st_info: cursor.read_u8_at(offset + 12)?,
            st_other: cursor.read_u8_at(offset + 13)?,
            st_shndx: cursor.read_u16_at(offset + 14, endian)?,
        }),
        ElfClass::Elf64 => Ok(ElfSymbol {
            st_name: cursor.read_u32_at(offset, endian)?,
            st_info: cursor.read_u8_at(offset + 4)?,
            st_other: cursor.read_u8_at(offset + 5)?,
            st_shndx: cursor.read_u16_at(offset + 6, endian)?,
            st_value: cursor.read_u64_at(offset + 8, endian)?,
            st_size: cursor.read_u64_at(offset + 16, endian)?,
        }),
    }
}
