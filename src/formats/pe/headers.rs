//! PE header parsing

use crate::cursor::{ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::pe::types::*;

const LE: Endian = Endian::Little;

/// Maximum number of data directories in an optional header
const MAX_DATA_DIRECTORIES: u32 = 16;

/// Headers located through the DOS stub
#[derive(Debug, Clone)]
pub struct PeHeaders {
    /// File offset of the `PE\0\0` signature
    pub pe_offset: u64,
    pub coff: CoffHeader,
    pub optional: OptionalHeader,
    pub data_directories: Vec<DataDirectory>,
    /// File offset of the first section table entry
    pub section_table_offset: u64,
}

impl PeHeaders {
    pub fn data_directory(&self, index: u32) -> Option<&DataDirectory> {
        self.data_directories.get(index as usize)
    }
}

fn optional_header_error(message: impl Into<String>) -> LoaderError {
    LoaderError::corrupt_section("<optional header>", message)
}

/// Parse DOS stub, signature, COFF header and optional header.
pub fn parse_headers(cursor: &ByteCursor<'_>) -> Result<PeHeaders> {
    if !cursor.starts_with_at(0, DOS_MAGIC) {
        return Err(LoaderError::UnsupportedFormat);
    }

    let pe_offset = u64::from(cursor.read_u32_at(E_LFANEW_OFFSET, LE)?);
    cursor.slice(pe_offset, PE_SIGNATURE.len() as u64)?;
    if !cursor.starts_with_at(pe_offset, PE_SIGNATURE) {
        return Err(LoaderError::UnsupportedFormat);
    }

    let coff_offset = pe_offset + 4;
    let coff = parse_coff_header(cursor, coff_offset)?;

    let opt_offset = coff_offset + COFF_HEADER_SIZE;
    let opt_size = u64::from(coff.size_of_optional_header);
    // Optional header bytes must all be in the file
    let opt = cursor.sub(opt_offset, opt_size)?;

    let magic = opt.read_u16_at(0, LE).map_err(|_| {
        optional_header_error(format!("optional header size {} too small", opt_size))
    })?;
    let dd_offset = data_directory_offset(magic).ok_or(LoaderError::UnsupportedFormat)?;
    if opt_size < dd_offset {
        return Err(optional_header_error(format!(
            "optional header size {} smaller than {}",
            opt_size, dd_offset
        )));
    }

    let address_of_entry_point = opt.read_u32_at(16, LE)?;
    let image_base = if magic == PE32PLUS_MAGIC {
        opt.read_u64_at(24, LE)?
    } else {
        u64::from(opt.read_u32_at(28, LE)?)
    };
    let number_of_rva_and_sizes = opt.read_u32_at(dd_offset - 4, LE)?;

    let optional = OptionalHeader {
        magic,
        address_of_entry_point,
        image_base,
        number_of_rva_and_sizes,
    };

    // Only the directories that fit inside the declared optional header
    let fitting = ((opt_size - dd_offset) / 8) as u32;
    let count = number_of_rva_and_sizes
        .min(MAX_DATA_DIRECTORIES)
        .min(fitting);
    let mut data_directories = Vec::with_capacity(count as usize);
    for i in 0..u64::from(count) {
        let offset = dd_offset + i * 8;
        data_directories.push(DataDirectory {
            virtual_address: opt.read_u32_at(offset, LE)?,
            size: opt.read_u32_at(offset + 4, LE)?,
        });
    }

    Ok(PeHeaders {
        pe_offset,
        coff,
        optional,
        data_directories,
        section_table_offset: opt_offset + opt_size,
    })
}

/// Parse COFF file header
fn parse_coff_header(cursor: &ByteCursor<'_>, offset: u64) -> Result<CoffHeader> {
    let coff = cursor.sub(offset, COFF_HEADER_SIZE)?;
    Ok(CoffHeader {
        machine: coff.read_u16_at(0, LE)?,
        number_of_sections: coff.read_u16_at(2, LE)?,
        pointer_to_symbol_table: coff.read_u32_at(8, LE)?,
        number_of_symbols: coff.read_u32_at(12, LE)?,
        size_of_optional_header: coff.read_u16_at(16, LE)?,
        characteristics: coff.read_u16_at(18, LE)?,
    })
}
