//! Core PE data types and structures

use crate::cursor::AddrWidth;

// PE constants
pub const DOS_MAGIC: &[u8; 2] = b"MZ";
pub const E_LFANEW_OFFSET: u64 = 0x3c;
pub const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

/// Size of the COFF file header
pub const COFF_HEADER_SIZE: u64 = 20;
/// Size of one section table entry
pub const SECTION_HEADER_SIZE: u64 = 40;
/// Size of one COFF symbol table record
pub const COFF_SYMBOL_SIZE: u64 = 18;
/// Size of the export directory table
pub const EXPORT_DIRECTORY_SIZE: u64 = 40;

// Machine types
pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

// Data directory indices
pub const IMAGE_DIRECTORY_ENTRY_EXPORT: u32 = 0;

// Section characteristics
pub const IMAGE_SCN_CNT_CODE: u32 = 0x00000020;
pub const IMAGE_SCN_CNT_INITIALIZED_DATA: u32 = 0x00000040;
pub const IMAGE_SCN_CNT_UNINITIALIZED_DATA: u32 = 0x00000080;
pub const IMAGE_SCN_MEM_EXECUTE: u32 = 0x20000000;
pub const IMAGE_SCN_MEM_READ: u32 = 0x40000000;
pub const IMAGE_SCN_MEM_WRITE: u32 = 0x80000000;

// COFF symbol fields
pub const IMAGE_SYM_DTYPE_FUNCTION: u16 = 0x20;
pub const IMAGE_SYM_CLASS_EXTERNAL: u8 = 2;
pub const IMAGE_SYM_CLASS_STATIC: u8 = 3;

/// COFF header (20 bytes)
#[derive(Debug, Clone, Copy)]
pub struct CoffHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
}

/// Fields of the optional header the loader reads
#[derive(Debug, Clone, Copy)]
pub struct OptionalHeader {
    pub magic: u16,
    pub address_of_entry_point: u32,
    pub image_base: u64,
    pub number_of_rva_and_sizes: u32,
}

impl OptionalHeader {
    pub fn is_pe32_plus(&self) -> bool {
        self.magic == PE32PLUS_MAGIC
    }

    pub fn width(&self) -> AddrWidth {
        if self.is_pe32_plus() {
            AddrWidth::W64
        } else {
            AddrWidth::W32
        }
    }

    /// Virtual address of `rva`, wrapped to the image's word width.
    pub fn va(&self, rva: u64) -> u64 {
        let va = self.image_base.wrapping_add(rva);
        if self.is_pe32_plus() {
            va
        } else {
            va & 0xffff_ffff
        }
    }

    /// Entry point as a virtual address; 0 when the image has none.
    pub fn entry(&self) -> u64 {
        match self.address_of_entry_point {
            0 => 0,
            rva => self.va(u64::from(rva)),
        }
    }
}

/// Offset of the data directory array from the start of the optional header
pub fn data_directory_offset(magic: u16) -> Option<u64> {
    match magic {
        PE32_MAGIC => Some(96),
        PE32PLUS_MAGIC => Some(112),
        _ => None,
    }
}

/// Data directory entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    pub fn is_present(&self) -> bool {
        self.virtual_address != 0 && self.size != 0
    }

    pub fn contains(&self, rva: u32) -> bool {
        rva >= self.virtual_address && rva - self.virtual_address < self.size
    }
}

/// Section header (40 bytes)
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub characteristics: u32,
}

impl SectionHeader {
    /// Name bytes up to the first NUL
    pub fn raw_name(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
        &self.name[..end]
    }

    pub fn is_executable(&self) -> bool {
        self.characteristics & (IMAGE_SCN_CNT_CODE | IMAGE_SCN_MEM_EXECUTE) != 0
    }

    pub fn is_writable(&self) -> bool {
        self.characteristics & IMAGE_SCN_MEM_WRITE != 0
    }

    /// Size once mapped; falls back to the raw size when the virtual size is 0
    pub fn mapped_size(&self) -> u32 {
        if self.virtual_size != 0 {
            self.virtual_size
        } else {
            self.size_of_raw_data
        }
    }

    pub fn contains_rva(&self, rva: u32) -> bool {
        let size = self.virtual_size.max(self.size_of_raw_data);
        rva >= self.virtual_address && rva - self.virtual_address < size
    }
}
