//! Export table parsing

use tracing::{debug, trace};

use crate::config::LoaderConfig;
use crate::core::symbol::{Symbol, SymbolSource};
use crate::cursor::{ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::pe::sections::SectionTable;
use crate::formats::pe::types::*;
use crate::symbols::LoadedTable;

const LE: Endian = Endian::Little;

/// Table name used in warnings
pub const EXPORT_TABLE: &str = "exports";

/// Longest export name read.
const MAX_EXPORT_NAME: usize = 512;

/// Export directory table fields
#[derive(Debug, Clone, Copy)]
pub struct ExportDirectory {
    pub name_rva: u32,
    pub ordinal_base: u32,
    pub number_of_functions: u32,
    pub number_of_names: u32,
    pub address_table_rva: u32,
    pub name_table_rva: u32,
    pub ordinal_table_rva: u32,
}

fn export_error(message: impl Into<String>) -> LoaderError {
    LoaderError::symbol_table(EXPORT_TABLE, message)
}

fn resolve(sections: &SectionTable, rva: u32, what: &str) -> Result<u64> {
    sections
        .rva_to_offset(rva)
        .ok_or_else(|| export_error(format!("{} RVA {:#x} not backed by file data", what, rva)))
}

/// Parse the export directory table
pub fn parse_export_directory(cursor: &ByteCursor<'_>, offset: u64) -> Result<ExportDirectory> {
    let dir = cursor
        .sub(offset, EXPORT_DIRECTORY_SIZE)
        .map_err(|_| export_error(format!("directory at {:#x} beyond end of file", offset)))?;
    Ok(ExportDirectory {
        name_rva: dir.read_u32_at(12, LE)?,
        ordinal_base: dir.read_u32_at(16, LE)?,
        number_of_functions: dir.read_u32_at(20, LE)?,
        number_of_names: dir.read_u32_at(24, LE)?,
        address_table_rva: dir.read_u32_at(28, LE)?,
        name_table_rva: dir.read_u32_at(32, LE)?,
        ordinal_table_rva: dir.read_u32_at(36, LE)?,
    })
}

/// Read named exports as function symbols.
///
/// Forwarded exports (whose address points back into the export directory)
/// and exports reachable only by ordinal are skipped.
pub fn read_exports(
    cursor: &ByteCursor<'_>,
    sections: &SectionTable,
    export_dir: &DataDirectory,
    optional: &OptionalHeader,
    config: &LoaderConfig,
) -> Result<LoadedTable> {
    let mut table = LoadedTable::new(EXPORT_TABLE);

    let dir_offset = resolve(sections, export_dir.virtual_address, "directory")?;
    let dir = parse_export_directory(cursor, dir_offset)?;

    let mut count = dir.number_of_names;
    if count as usize > config.max_exports {
        table.warn(format!(
            "{} named exports truncated to {}",
            count, config.max_exports
        ));
        count = config.max_exports as u32;
    }
    if count == 0 {
        return Ok(table);
    }

    let addr_offset = resolve(sections, dir.address_table_rva, "address table")?;
    let name_offset = resolve(sections, dir.name_table_rva, "name table")?;
    let ord_offset = resolve(sections, dir.ordinal_table_rva, "ordinal table")?;

    let read_error =
        |what: &str, i: u32| export_error(format!("{} entry {} beyond end of file", what, i));

    for i in 0..count {
        let name_rva = cursor
            .read_u32_at(name_offset + u64::from(i) * 4, LE)
            .map_err(|_| read_error("name table", i))?;
        let ordinal_index = cursor
            .read_u16_at(ord_offset + u64::from(i) * 2, LE)
            .map_err(|_| read_error("ordinal table", i))?;

        if u32::from(ordinal_index) >= dir.number_of_functions {
            table.warn(format!(
                "export {}: ordinal index {} out of range",
                i, ordinal_index
            ));
            continue;
        }

        let function_rva = cursor
            .read_u32_at(addr_offset + u64::from(ordinal_index) * 4, LE)
            .map_err(|_| read_error("address table", u32::from(ordinal_index)))?;

        if export_dir.contains(function_rva) {
            trace!(index = i, "skipping forwarded export");
            continue;
        }

        let name = match sections
            .rva_to_offset(name_rva)
            .map(|offset| cursor.read_cstr_at(offset, MAX_EXPORT_NAME))
        {
            Some(Ok(name)) => name,
            _ => {
                table.warn(format!(
                    "export {}: name RVA {:#x} not readable",
                    i, name_rva
                ));
                String::new()
            }
        };

        table.symbols.push(Symbol::function(
            name,
            optional.va(u64::from(function_rva)),
            SymbolSource::Export,
        ));
    }

    debug!(
        ordinal_base = dir.ordinal_base,
        functions = dir.number_of_functions,
        named = table.symbols.len(),
        "export directory"
    );
    Ok(table)
}
