//! Magic-number detection for supported executable formats.

use crate::core::binary::Format;
use crate::cursor::{ByteCursor, Endian};
use crate::formats::elf::types::ELF_MAGIC;
use crate::formats::pe::types::{DOS_MAGIC, E_LFANEW_OFFSET, PE_SIGNATURE};

/// Classify a buffer as ELF, PE or unrecognized.
///
/// Never fails: short or empty buffers are simply unrecognized.
pub fn sniff(data: &[u8]) -> Format {
    let cursor = ByteCursor::new(data);

    if cursor.starts_with_at(0, ELF_MAGIC) {
        return Format::Elf;
    }

    if cursor.starts_with_at(0, DOS_MAGIC) {
        if let Ok(pe_offset) = cursor.read_u32_at(E_LFANEW_OFFSET, Endian::Little) {
            if cursor.starts_with_at(u64::from(pe_offset), PE_SIGNATURE) {
                return Format::Pe;
            }
        }
    }

    Format::Unrecognized
}
