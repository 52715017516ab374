//! Core ELF types and constants

use crate::cursor::{AddrWidth, Endian};
use crate::error::{LoaderError, Result};

/// ELF magic number
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Size of `e_ident`
pub const EI_NIDENT: u64 = 16;

/// ELF class (32-bit or 64-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    Elf32 = 1,
    Elf64 = 2,
}

impl ElfClass {
    pub fn from_u8(val: u8) -> Result<Self> {
        match val {
            1 => Ok(ElfClass::Elf32),
            2 => Ok(ElfClass::Elf64),
            // An unknown class leaves no way to decode the rest of the header
            _ => Err(LoaderError::UnsupportedFormat),
        }
    }

    pub fn width(&self) -> AddrWidth {
        match self {
            ElfClass::Elf32 => AddrWidth::W32,
            ElfClass::Elf64 => AddrWidth::W64,
        }
    }

    /// Size of the file header
    pub fn header_size(&self) -> u64 {
        match self {
            ElfClass::Elf32 => 52,
            ElfClass::Elf64 => 64,
        }
    }

    /// Size of one section header table entry
    pub fn section_header_size(&self) -> u64 {
        match self {
            ElfClass::Elf32 => 40,
            ElfClass::Elf64 => 64,
        }
    }

    /// Size of one symbol table entry
    pub fn symbol_size(&self) -> u64 {
        match self {
            ElfClass::Elf32 => 16,
            ElfClass::Elf64 => 24,
        }
    }
}

/// ELF data encoding (endianness)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfData {
    Little = 1,
    Big = 2,
}

impl ElfData {
    pub fn from_u8(val: u8) -> Result<Self> {
        match val {
            1 => Ok(ElfData::Little),
            2 => Ok(ElfData::Big),
            _ => Err(LoaderError::UnsupportedFormat),
        }
    }

    pub fn endian(&self) -> Endian {
        match self {
            ElfData::Little => Endian::Little,
            ElfData::Big => Endian::Big,
        }
    }
}

/// Machine codes the loader accepts
pub const EM_386: u16 = 3;
pub const EM_X86_64: u16 = 62;

/// ELF identification (first 16 bytes)
#[derive(Debug, Clone, Copy)]
pub struct ElfIdent {
    pub class: ElfClass,
    pub data: ElfData,
}

/// The subset of the ELF header the loader needs
#[derive(Debug, Clone, Copy)]
pub struct ElfHeader {
    pub ident: ElfIdent,
    pub e_machine: u16,
    pub e_entry: u64,
    pub e_shoff: u64,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl ElfHeader {
    pub fn endian(&self) -> Endian {
        self.ident.data.endian()
    }

    pub fn width(&self) -> AddrWidth {
        self.ident.class.width()
    }
}

/// Section header
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionHeader {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_entsize: u64,
}

impl SectionHeader {
    pub fn is_executable(&self) -> bool {
        self.sh_flags & SHF_EXECINSTR != 0
    }

    pub fn is_writable(&self) -> bool {
        self.sh_flags & SHF_WRITE != 0
    }

    pub fn has_file_data(&self) -> bool {
        self.sh_type != SHT_NOBITS
    }
}

/// Section types
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_DYNSYM: u32 = 11;

/// Section flags
pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;

/// Special section indices
pub const SHN_UNDEF: u16 = 0;
pub const SHN_XINDEX: u16 = 0xffff;

/// Symbol entry
#[derive(Debug, Clone, Copy)]
pub struct ElfSymbol {
    pub st_name: u32,
    pub st_value: u64,
    pub st_size: u64,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
}

impl ElfSymbol {
    pub fn st_type(&self) -> u8 {
        self.st_info & 0xf
    }

    pub fn is_undefined(&self) -> bool {
        self.st_shndx == SHN_UNDEF
    }

    /// Plain and indirect functions both count as functions.
    pub fn is_function(&self) -> bool {
        matches!(self.st_type(), STT_FUNC | STT_GNU_IFUNC)
    }
}

/// Symbol types
pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;
pub const STT_GNU_IFUNC: u8 = 10;
