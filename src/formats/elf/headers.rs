//! ELF header parsing

use crate::cursor::{ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::elf::types::*;

/// Parse ELF identification bytes
pub fn parse_ident(cursor: &ByteCursor<'_>) -> Result<ElfIdent> {
    // Bounds check on the whole of e_ident first
    cursor.slice(0, EI_NIDENT)?;

    if !cursor.starts_with_at(0, ELF_MAGIC) {
        return Err(LoaderError::UnsupportedFormat);
    }

    let class = ElfClass::from_u8(cursor.read_u8_at(4)?)?;
    let data = ElfData::from_u8(cursor.read_u8_at(5)?)?;

    Ok(ElfIdent { class, data })
}

/// Parse the ELF file header.
///
/// Only the fields needed to locate sections and symbols are kept.
pub fn parse_header(cursor: &ByteCursor<'_>) -> Result<ElfHeader> {
    let ident = parse_ident(cursor)?;

    // Whole header must be present before any field is trusted
    cursor.slice(0, ident.class.header_size())?;

    let endian: Endian = ident.data.endian();
    let e_machine = cursor.read_u16_at(18, endian)?;

    let (e_entry, e_shoff, e_shentsize, e_shnum, e_shstrndx) = match ident.class {
        ElfClass::Elf32 => (
            u64::from(cursor.read_u32_at(24, endian)?),
            u64::from(cursor.read_u32_at(32, endian)?),
            cursor.read_u16_at(46, endian)?,
            cursor.read_u16_at(48, endian)?,
            cursor.read_u16_at(50, endian)?,
        ),
        ElfClass::Elf64 => (
            cursor.read_u64_at(24, endian)?,
            cursor.read_u64_at(40, endian)?,
            cursor.read_u16_at(58, endian)?,
            cursor.read_u16_at(60, endian)?,
            cursor.read_u16_at(62, endian)?,
        ),
    };

    Ok(ElfHeader {
        ident,
        e_machine,
        e_entry,
        e_shoff,
        e_shentsize,
        e_shnum,
        e_shstrndx,
    })
}
