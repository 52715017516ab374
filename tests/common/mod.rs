//! Common test utilities and helpers.
//!
//! Builders for small synthetic ELF and PE images. Every image is laid out
//! deterministically so tests can patch individual header fields.

#![allow(dead_code)]

use binload::formats::elf::types::{
    SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHT_DYNSYM, SHT_NOBITS, SHT_PROGBITS, SHT_STRTAB,
    SHT_SYMTAB,
};
use binload::formats::pe::types::{
    IMAGE_FILE_MACHINE_AMD64, IMAGE_FILE_MACHINE_I386, IMAGE_SCN_CNT_CODE,
    IMAGE_SCN_CNT_INITIALIZED_DATA, IMAGE_SCN_CNT_UNINITIALIZED_DATA, IMAGE_SCN_MEM_EXECUTE,
    IMAGE_SCN_MEM_READ, IMAGE_SCN_MEM_WRITE, PE32PLUS_MAGIC, PE32_MAGIC,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16, big: bool) {
    let bytes = if big {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    };
    buf[offset..offset + 2].copy_from_slice(&bytes);
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32, big: bool) {
    let bytes = if big {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    };
    buf[offset..offset + 4].copy_from_slice(&bytes);
}

fn put_u64(buf: &mut [u8], offset: usize, value: u64, big: bool) {
    let bytes = if big {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    };
    buf[offset..offset + 8].copy_from_slice(&bytes);
}

/// Overwrite a little-endian u32 in an image
pub fn patch_u32(buf: &mut [u8], offset: usize, value: u32) {
    put_u32(buf, offset, value, false);
}

/// Overwrite a little-endian u64 in an image
pub fn patch_u64(buf: &mut [u8], offset: usize, value: u64) {
    put_u64(buf, offset, value, false);
}

/// String table with a leading NUL, as ELF uses
struct StrTab {
    bytes: Vec<u8>,
}

impl StrTab {
    fn new() -> Self {
        Self { bytes: vec![0] }
    }

    fn add(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        offset
    }
}

// ---------------------------------------------------------------------------
// ELF
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ElfSection {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub data: Vec<u8>,
    /// sh_size for NOBITS sections
    pub size: Option<u64>,
}

impl ElfSection {
    pub fn new(name: &str, sh_type: u32, flags: u64, addr: u64, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            sh_type,
            flags,
            addr,
            data,
            size: None,
        }
    }

    pub fn text(addr: u64, data: Vec<u8>) -> Self {
        Self::new(".text", SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, addr, data)
    }

    pub fn data(addr: u64, data: Vec<u8>) -> Self {
        Self::new(".data", SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, addr, data)
    }

    pub fn rodata(addr: u64, data: Vec<u8>) -> Self {
        Self::new(".rodata", SHT_PROGBITS, SHF_ALLOC, addr, data)
    }

    pub fn bss(addr: u64, size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::new(".bss", SHT_NOBITS, SHF_ALLOC | SHF_WRITE, addr, Vec::new())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElfSym {
    pub name: String,
    pub value: u64,
    pub info: u8,
    pub shndx: u16,
    /// Raw st_name instead of the string table offset
    pub name_offset: Option<u32>,
}

impl ElfSym {
    fn with_info(name: &str, value: u64, info: u8, shndx: u16) -> Self {
        Self {
            name: name.to_string(),
            value,
            info,
            shndx,
            name_offset: None,
        }
    }

    /// GLOBAL FUNC defined in section 1
    pub fn func(name: &str, value: u64) -> Self {
        Self::with_info(name, value, 0x12, 1)
    }

    /// GLOBAL GNU_IFUNC defined in section 1
    pub fn ifunc(name: &str, value: u64) -> Self {
        Self::with_info(name, value, 0x1a, 1)
    }

    /// GLOBAL OBJECT defined in section 1
    pub fn object(name: &str, value: u64) -> Self {
        Self::with_info(name, value, 0x11, 1)
    }

    /// GLOBAL FUNC, undefined
    pub fn undefined(name: &str) -> Self {
        Self::with_info(name, 0, 0x12, 0)
    }

    pub fn with_name_offset(mut self, offset: u32) -> Self {
        self.name_offset = Some(offset);
        self
    }
}

struct RawSection {
    name: String,
    sh_type: u32,
    flags: u64,
    addr: u64,
    data: Vec<u8>,
    size: u64,
    link: u32,
    entsize: u64,
}

/// Builder for ELF images.
///
/// Layout: header, section contents, then the section header table at the
/// very end, so any truncation of the image cuts the table.
#[derive(Debug, Clone)]
pub struct ElfBuilder {
    class64: bool,
    big_endian: bool,
    machine: u16,
    entry: u64,
    sections: Vec<ElfSection>,
    symtab: Option<Vec<ElfSym>>,
    dynsym: Option<Vec<ElfSym>>,
    symtab_link: Option<u32>,
}

impl ElfBuilder {
    /// Little-endian x86-64
    pub fn elf64() -> Self {
        Self {
            class64: true,
            big_endian: false,
            machine: 62,
            entry: 0,
            sections: Vec::new(),
            symtab: None,
            dynsym: None,
            symtab_link: None,
        }
    }

    /// Little-endian i386
    pub fn elf32() -> Self {
        Self {
            class64: false,
            machine: 3,
            ..Self::elf64()
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub fn section(mut self, section: ElfSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn symbol(mut self, sym: ElfSym) -> Self {
        self.symtab.get_or_insert_with(Vec::new).push(sym);
        self
    }

    pub fn dynamic_symbol(mut self, sym: ElfSym) -> Self {
        self.dynsym.get_or_insert_with(Vec::new).push(sym);
        self
    }

    /// Override `.symtab`'s sh_link
    pub fn symtab_link(mut self, link: u32) -> Self {
        self.symtab_link = Some(link);
        self
    }

    fn encode_symbols(&self, syms: &[ElfSym]) -> (Vec<u8>, Vec<u8>) {
        let big = self.big_endian;
        let entsize = if self.class64 { 24 } else { 16 };
        let mut strings = StrTab::new();
        // Entry 0 is the null symbol
        let mut data = vec![0u8; entsize * (syms.len() + 1)];
        for (i, sym) in syms.iter().enumerate() {
            let off = entsize * (i + 1);
            let name = strings.add(&sym.name);
            let st_name = sym.name_offset.unwrap_or(name);
            put_u32(&mut data, off, st_name, big);
            if self.class64 {
                data[off + 4] = sym.info;
                put_u16(&mut data, off + 6, sym.shndx, big);
                put_u64(&mut data, off + 8, sym.value, big);
            } else {
                put_u32(&mut data, off + 4, sym.value as u32, big);
                data[off + 12] = sym.info;
                put_u16(&mut data, off + 14, sym.shndx, big);
            }
        }
        (data, strings.bytes)
    }

    pub fn build(&self) -> Vec<u8> {
        let big = self.big_endian;
        let c64 = self.class64;
        let sym_entsize: u64 = if c64 { 24 } else { 16 };

        let mut raw: Vec<RawSection> = self
            .sections
            .iter()
            .map(|s| RawSection {
                name: s.name.clone(),
                sh_type: s.sh_type,
                flags: s.flags,
                addr: s.addr,
                size: s.size.unwrap_or(s.data.len() as u64),
                data: s.data.clone(),
                link: 0,
                entsize: 0,
            })
            .collect();

        for (table, syms, sh_type, strname) in [
            (".symtab", &self.symtab, SHT_SYMTAB, ".strtab"),
            (".dynsym", &self.dynsym, SHT_DYNSYM, ".dynstr"),
        ] {
            if let Some(syms) = syms {
                let (data, strings) = self.encode_symbols(syms);
                // Index of the string table that follows (section 0 is NULL)
                let strtab_index = raw.len() as u32 + 2;
                let link = if sh_type == SHT_SYMTAB {
                    self.symtab_link.unwrap_or(strtab_index)
                } else {
                    strtab_index
                };
                let flags = if sh_type == SHT_DYNSYM { SHF_ALLOC } else { 0 };
                raw.push(RawSection {
                    name: table.to_string(),
                    sh_type,
                    flags,
                    addr: 0,
                    size: data.len() as u64,
                    data,
                    link,
                    entsize: sym_entsize,
                });
                raw.push(RawSection {
                    name: strname.to_string(),
                    sh_type: SHT_STRTAB,
                    flags,
                    addr: 0,
                    size: strings.len() as u64,
                    data: strings,
                    link: 0,
                    entsize: 0,
                });
            }
        }

        let mut shstrtab = StrTab::new();
        let mut name_offsets: Vec<u32> = raw.iter().map(|s| shstrtab.add(&s.name)).collect();
        let shstrtab_name = shstrtab.add(".shstrtab");
        let shstrtab_bytes = shstrtab.bytes.clone();
        raw.push(RawSection {
            name: ".shstrtab".to_string(),
            sh_type: SHT_STRTAB,
            flags: 0,
            addr: 0,
            size: shstrtab_bytes.len() as u64,
            data: shstrtab_bytes,
            link: 0,
            entsize: 0,
        });
        name_offsets.push(shstrtab_name);

        let header_size = if c64 { 64 } else { 52 };
        let mut buf = vec![0u8; header_size];

        let mut offsets = Vec::with_capacity(raw.len());
        for s in &raw {
            buf.resize(align_up(buf.len(), 8), 0);
            offsets.push(buf.len() as u64);
            if s.sh_type != SHT_NOBITS {
                buf.extend_from_slice(&s.data);
            }
        }

        buf.resize(align_up(buf.len(), 8), 0);
        let shoff = buf.len();
        let shentsize = if c64 { 64 } else { 40 };
        let shnum = raw.len() + 1;
        buf.resize(shoff + shnum * shentsize, 0);

        for (i, s) in raw.iter().enumerate() {
            let off = shoff + (i + 1) * shentsize;
            put_u32(&mut buf, off, name_offsets[i], big);
            put_u32(&mut buf, off + 4, s.sh_type, big);
            if c64 {
                put_u64(&mut buf, off + 8, s.flags, big);
                put_u64(&mut buf, off + 16, s.addr, big);
                put_u64(&mut buf, off + 24, offsets[i], big);
                put_u64(&mut buf, off + 32, s.size, big);
                put_u32(&mut buf, off + 40, s.link, big);
                put_u64(&mut buf, off + 48, 1, big);
                put_u64(&mut buf, off + 56, s.entsize, big);
            } else {
                put_u32(&mut buf, off + 8, s.flags as u32, big);
                put_u32(&mut buf, off + 12, s.addr as u32, big);
                put_u32(&mut buf, off + 16, offsets[i] as u32, big);
                put_u32(&mut buf, off + 20, s.size as u32, big);
                put_u32(&mut buf, off + 24, s.link, big);
                put_u32(&mut buf, off + 32, 1, big);
                put_u32(&mut buf, off + 36, s.entsize as u32, big);
            }
        }

        // ELF header
        buf[0..4].copy_from_slice(b"\x7fELF");
        buf[4] = if c64 { 2 } else { 1 };
        buf[5] = if big { 2 } else { 1 };
        buf[6] = 1;
        put_u16(&mut buf, 16, 2, big); // ET_EXEC
        put_u16(&mut buf, 18, self.machine, big);
        put_u32(&mut buf, 20, 1, big);
        if c64 {
            put_u64(&mut buf, 24, self.entry, big);
            put_u64(&mut buf, 40, shoff as u64, big);
            put_u16(&mut buf, 52, 64, big);
            put_u16(&mut buf, 58, shentsize as u16, big);
            put_u16(&mut buf, 60, shnum as u16, big);
            put_u16(&mut buf, 62, (shnum - 1) as u16, big);
        } else {
            put_u32(&mut buf, 24, self.entry as u32, big);
            put_u32(&mut buf, 32, shoff as u32, big);
            put_u16(&mut buf, 40, 52, big);
            put_u16(&mut buf, 46, shentsize as u16, big);
            put_u16(&mut buf, 48, shnum as u16, big);
            put_u16(&mut buf, 50, (shnum - 1) as u16, big);
        }

        buf
    }
}

/// File offset of section header `index` in a little-endian ELF image
pub fn elf_section_header_offset(data: &[u8], index: usize) -> usize {
    let read_u16 = |o: usize| u16::from_le_bytes([data[o], data[o + 1]]) as usize;
    if data[4] == 2 {
        let shoff = u64::from_le_bytes(data[40..48].try_into().unwrap()) as usize;
        shoff + index * read_u16(58)
    } else {
        let shoff = u32::from_le_bytes(data[32..36].try_into().unwrap()) as usize;
        shoff + index * read_u16(46)
    }
}

/// Minimal ELF64: `.text` at 0x1000 (0x20 bytes) and `main` at 0x1000
pub fn minimal_elf64() -> Vec<u8> {
    ElfBuilder::elf64()
        .entry(0x1000)
        .section(ElfSection::text(0x1000, vec![0x90; 0x20]))
        .symbol(ElfSym::func("main", 0x1000))
        .build()
}

/// ELF64 with code, data, bss and both symbol tables
pub fn full_elf64() -> Vec<u8> {
    ElfBuilder::elf64()
        .entry(0x40_1000)
        .section(ElfSection::text(0x40_1000, vec![0xc3; 0x40]))
        .section(ElfSection::rodata(0x40_2000, b"hello\0".to_vec()))
        .section(ElfSection::data(0x40_3000, vec![1, 2, 3, 4, 5, 6, 7, 8]))
        .section(ElfSection::bss(0x40_4000, 0x100))
        .symbol(ElfSym::func("_start", 0x40_1000))
        .symbol(ElfSym::object("counter", 0x40_3000))
        .symbol(ElfSym::func("helper", 0x40_1020))
        .dynamic_symbol(ElfSym::undefined("puts"))
        .dynamic_symbol(ElfSym::func("exported", 0x40_1030))
        .build()
}

/// ELF32 i386 with one function
pub fn minimal_elf32() -> Vec<u8> {
    ElfBuilder::elf32()
        .entry(0x0804_8080)
        .section(ElfSection::text(0x0804_8080, vec![0x90; 0x10]))
        .section(ElfSection::data(0x0804_9000, vec![0; 4]))
        .symbol(ElfSym::func("_start", 0x0804_8080))
        .build()
}

// ---------------------------------------------------------------------------
// PE
// ---------------------------------------------------------------------------

const FILE_ALIGN: usize = 0x200;
const SECTION_ALIGN: u32 = 0x1000;

#[derive(Debug, Clone)]
pub struct PeSection {
    pub name: String,
    pub va: u32,
    pub vsize: u32,
    pub characteristics: u32,
    pub data: Vec<u8>,
}

impl PeSection {
    pub fn new(name: &str, va: u32, characteristics: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            va,
            vsize: data.len() as u32,
            characteristics,
            data,
        }
    }

    pub fn text(va: u32, data: Vec<u8>) -> Self {
        Self::new(
            ".text",
            va,
            IMAGE_SCN_CNT_CODE | IMAGE_SCN_MEM_EXECUTE | IMAGE_SCN_MEM_READ,
            data,
        )
    }

    pub fn data(va: u32, data: Vec<u8>) -> Self {
        Self::new(
            ".data",
            va,
            IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE,
            data,
        )
    }

    pub fn rdata(va: u32, data: Vec<u8>) -> Self {
        Self::new(
            ".rdata",
            va,
            IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
            data,
        )
    }

    pub fn bss(va: u32, vsize: u32) -> Self {
        Self {
            vsize,
            ..Self::new(
                ".bss",
                va,
                IMAGE_SCN_CNT_UNINITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE,
                Vec::new(),
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoffSym {
    pub name: String,
    /// Offset from the start of the section
    pub value: u32,
    /// 1-based section number
    pub section: i16,
    pub function: bool,
}

/// Builder for PE32 / PE32+ images.
///
/// Layout: headers (0x200), raw section data in table order, an `.edata`
/// section when exports exist, then the COFF symbol and string tables.
#[derive(Debug, Clone)]
pub struct PeBuilder {
    pe32_plus: bool,
    machine: u16,
    image_base: u64,
    entry_rva: u32,
    sections: Vec<PeSection>,
    exports: Vec<(String, u32)>,
    coff_symbols: Vec<CoffSym>,
}

impl PeBuilder {
    /// PE32 for i386, image base 0x400000
    pub fn pe32() -> Self {
        Self {
            pe32_plus: false,
            machine: IMAGE_FILE_MACHINE_I386,
            image_base: 0x40_0000,
            entry_rva: 0,
            sections: Vec::new(),
            exports: Vec::new(),
            coff_symbols: Vec::new(),
        }
    }

    /// PE32+ for x86-64, image base 0x140000000
    pub fn pe64() -> Self {
        Self {
            pe32_plus: true,
            machine: IMAGE_FILE_MACHINE_AMD64,
            image_base: 0x1_4000_0000,
            ..Self::pe32()
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn image_base(mut self, base: u64) -> Self {
        self.image_base = base;
        self
    }

    pub fn entry_rva(mut self, rva: u32) -> Self {
        self.entry_rva = rva;
        self
    }

    pub fn section(mut self, section: PeSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn export(mut self, name: &str, rva: u32) -> Self {
        self.exports.push((name.to_string(), rva));
        self
    }

    pub fn coff_function(mut self, name: &str, section: i16, value: u32) -> Self {
        self.coff_symbols.push(CoffSym {
            name: name.to_string(),
            value,
            section,
            function: true,
        });
        self
    }

    pub fn coff_object(mut self, name: &str, section: i16, value: u32) -> Self {
        self.coff_symbols.push(CoffSym {
            name: name.to_string(),
            value,
            section,
            function: false,
        });
        self
    }

    fn edata(&self, va: u32) -> Vec<u8> {
        let n = self.exports.len();
        let addr_tbl = 40;
        let name_tbl = addr_tbl + 4 * n;
        let ord_tbl = name_tbl + 4 * n;
        let mut strings_at = ord_tbl + 2 * n;

        let mut data = vec![0u8; strings_at];
        let dll_name = b"fixture.dll\0";
        put_u32(&mut data, 12, va + strings_at as u32, false);
        data.extend_from_slice(dll_name);
        strings_at += dll_name.len();

        put_u32(&mut data, 16, 1, false); // ordinal base
        put_u32(&mut data, 20, n as u32, false);
        put_u32(&mut data, 24, n as u32, false);
        put_u32(&mut data, 28, va + addr_tbl as u32, false);
        put_u32(&mut data, 32, va + name_tbl as u32, false);
        put_u32(&mut data, 36, va + ord_tbl as u32, false);

        for (i, (name, rva)) in self.exports.iter().enumerate() {
            put_u32(&mut data, addr_tbl + 4 * i, *rva, false);
            put_u32(&mut data, name_tbl + 4 * i, va + strings_at as u32, false);
            put_u16(&mut data, ord_tbl + 2 * i, i as u16, false);
            data.extend_from_slice(name.as_bytes());
            data.push(0);
            strings_at += name.len() + 1;
        }
        data
    }

    pub fn build(&self) -> Vec<u8> {
        let mut sections = self.sections.clone();

        let mut export_dir = (0u32, 0u32);
        if !self.exports.is_empty() {
            let end = sections
                .iter()
                .map(|s| s.va + s.vsize.max(s.data.len() as u32))
                .max()
                .unwrap_or(SECTION_ALIGN);
            let va = (end as usize).div_ceil(SECTION_ALIGN as usize) as u32 * SECTION_ALIGN;
            let data = self.edata(va);
            export_dir = (va, data.len() as u32);
            sections.push(PeSection::new(
                ".edata",
                va,
                IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
                data,
            ));
        }

        // COFF string table: size field first
        let mut strings: Vec<u8> = vec![0; 4];
        let long_name = |name: &str, strings: &mut Vec<u8>| -> u32 {
            let offset = strings.len() as u32;
            strings.extend_from_slice(name.as_bytes());
            strings.push(0);
            offset
        };

        let opt_size: usize = if self.pe32_plus { 240 } else { 224 };
        let pe_offset = 0x40;
        let sh_offset = pe_offset + 24 + opt_size;
        let headers_end = sh_offset + 40 * sections.len();
        let mut buf = vec![0u8; align_up(headers_end, FILE_ALIGN)];

        // Section table and raw data
        for (i, s) in sections.iter().enumerate() {
            let off = sh_offset + 40 * i;
            if s.name.len() > 8 {
                let o = long_name(&s.name, &mut strings);
                let short = format!("/{}", o);
                buf[off..off + short.len()].copy_from_slice(short.as_bytes());
            } else {
                buf[off..off + s.name.len()].copy_from_slice(s.name.as_bytes());
            }
            put_u32(&mut buf, off + 8, s.vsize, false);
            put_u32(&mut buf, off + 12, s.va, false);
            if !s.data.is_empty() {
                let ptr = buf.len();
                let raw_size = align_up(s.data.len(), FILE_ALIGN);
                buf.extend_from_slice(&s.data);
                buf.resize(ptr + raw_size, 0);
                put_u32(&mut buf, off + 16, raw_size as u32, false);
                put_u32(&mut buf, off + 20, ptr as u32, false);
            }
            put_u32(&mut buf, off + 36, s.characteristics, false);
        }

        // COFF symbols, each function with one zeroed aux record
        let mut records: Vec<u8> = Vec::new();
        let mut nrecords = 0u32;
        for sym in &self.coff_symbols {
            let mut rec = [0u8; 18];
            if sym.name.len() > 8 {
                let o = long_name(&sym.name, &mut strings);
                rec[4..8].copy_from_slice(&o.to_le_bytes());
            } else {
                rec[..sym.name.len()].copy_from_slice(sym.name.as_bytes());
            }
            rec[8..12].copy_from_slice(&sym.value.to_le_bytes());
            rec[12..14].copy_from_slice(&sym.section.to_le_bytes());
            let typ: u16 = if sym.function { 0x20 } else { 0 };
            rec[14..16].copy_from_slice(&typ.to_le_bytes());
            rec[16] = 2; // IMAGE_SYM_CLASS_EXTERNAL
            rec[17] = if sym.function { 1 } else { 0 };
            records.extend_from_slice(&rec);
            nrecords += 1;
            if sym.function {
                records.extend_from_slice(&[0u8; 18]);
                nrecords += 1;
            }
        }

        let mut ptr_symtab = 0u32;
        if nrecords > 0 || strings.len() > 4 {
            ptr_symtab = buf.len() as u32;
            buf.extend_from_slice(&records);
            let size = strings.len() as u32;
            strings[0..4].copy_from_slice(&size.to_le_bytes());
            buf.extend_from_slice(&strings);
        }

        // DOS header
        buf[0..2].copy_from_slice(b"MZ");
        put_u32(&mut buf, 0x3c, pe_offset as u32, false);
        buf[pe_offset..pe_offset + 4].copy_from_slice(b"PE\0\0");

        // COFF header
        let coff = pe_offset + 4;
        put_u16(&mut buf, coff, self.machine, false);
        put_u16(&mut buf, coff + 2, sections.len() as u16, false);
        put_u32(&mut buf, coff + 8, ptr_symtab, false);
        put_u32(&mut buf, coff + 12, nrecords, false);
        put_u16(&mut buf, coff + 16, opt_size as u16, false);
        put_u16(&mut buf, coff + 18, 0x0102, false);

        // Optional header
        let opt = coff + 20;
        let magic = if self.pe32_plus {
            PE32PLUS_MAGIC
        } else {
            PE32_MAGIC
        };
        put_u16(&mut buf, opt, magic, false);
        put_u32(&mut buf, opt + 16, self.entry_rva, false);
        if self.pe32_plus {
            put_u64(&mut buf, opt + 24, self.image_base, false);
        } else {
            put_u32(&mut buf, opt + 28, self.image_base as u32, false);
        }
        put_u32(&mut buf, opt + 32, SECTION_ALIGN, false);
        put_u32(&mut buf, opt + 36, FILE_ALIGN as u32, false);
        put_u32(&mut buf, opt + 60, FILE_ALIGN as u32, false);
        let dd = if self.pe32_plus { opt + 112 } else { opt + 96 };
        put_u32(&mut buf, dd - 4, 16, false);
        put_u32(&mut buf, dd, export_dir.0, false);
        put_u32(&mut buf, dd + 4, export_dir.1, false);

        buf
    }
}

/// File offset of section table entry `index` in a PE image
pub fn pe_section_header_offset(data: &[u8], index: usize) -> usize {
    let pe = u32::from_le_bytes(data[0x3c..0x40].try_into().unwrap()) as usize;
    let opt_size = u16::from_le_bytes([data[pe + 20], data[pe + 21]]) as usize;
    pe + 24 + opt_size + 40 * index
}

/// PE32+ with code, data and bss and an entry at .text
pub fn minimal_pe64() -> Vec<u8> {
    PeBuilder::pe64()
        .entry_rva(0x1000)
        .section(PeSection::text(0x1000, vec![0xcc; 0x30]))
        .section(PeSection::data(0x2000, vec![0xaa; 0x10]))
        .section(PeSection::bss(0x3000, 0x800))
        .build()
}

/// PE32 DLL with two exports and COFF symbols
pub fn pe32_dll() -> Vec<u8> {
    PeBuilder::pe32()
        .entry_rva(0x1000)
        .section(PeSection::text(0x1000, vec![0x90; 0x40]))
        .section(PeSection::data(0x2000, vec![0; 0x20]))
        .coff_function("_DllMain", 1, 0x0)
        .coff_object("_state", 2, 0x8)
        .coff_function("_long_internal_helper", 1, 0x20)
        .export("Alpha", 0x1010)
        .export("Beta", 0x1030)
        .build()
}
