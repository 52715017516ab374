//! Section table management

use tracing::{debug, trace};

use crate::config::LoaderConfig;
use crate::core::section::{Section, SectionKind, UNNAMED_SECTION};
use crate::cursor::{ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::elf::types::*;

/// Longest section name read from the section name string table.
const MAX_SECTION_NAME: usize = 256;

const SECTION_HEADERS: &str = "<section headers>";

/// Section headers with their resolved names
pub struct SectionTable<'data> {
    cursor: ByteCursor<'data>,
    class: ElfClass,
    headers: Vec<SectionHeader>,
    names: Vec<String>,
}

impl<'data> SectionTable<'data> {
    /// Parse the section header table described by `header`.
    pub fn parse(
        cursor: ByteCursor<'data>,
        header: &ElfHeader,
        config: &LoaderConfig,
    ) -> Result<Self> {
        let class = header.ident.class;
        let endian = header.endian();

        if header.e_shoff == 0 {
            // No section header table
            return Ok(Self {
                cursor,
                class,
                headers: Vec::new(),
                names: Vec::new(),
            });
        }

        let entsize = u64::from(header.e_shentsize);
        if entsize < class.section_header_size() {
            return Err(LoaderError::corrupt_section(
                SECTION_HEADERS,
                format!(
                    "entry size {} smaller than {}",
                    entsize,
                    class.section_header_size()
                ),
            ));
        }

        // Section 0 carries the real count and string table index when they
        // overflow the header fields
        let first = parse_section_header(&cursor, header.e_shoff, class, endian)?;
        let count = if header.e_shnum == 0 {
            first.sh_size
        } else {
            u64::from(header.e_shnum)
        };
        let shstrndx = if header.e_shstrndx == SHN_XINDEX {
            u64::from(first.sh_link)
        } else {
            u64::from(header.e_shstrndx)
        };

        if count > config.max_sections as u64 {
            return Err(LoaderError::corrupt_section(
                SECTION_HEADERS,
                format!("{} sections exceeds limit of {}", count, config.max_sections),
            ));
        }

        // Whole table must be in the file
        let table_len = count.checked_mul(entsize).ok_or(LoaderError::OutOfBounds {
            offset: header.e_shoff,
            len: u64::MAX,
            size: cursor.len() as u64,
        })?;
        cursor.slice(header.e_shoff, table_len)?;

        let mut headers = Vec::with_capacity(count as usize);
        for i in 0..count {
            let offset = header.e_shoff + i * entsize;
            headers.push(parse_section_header(&cursor, offset, class, endian)?);
        }

        let strings = match headers.get(shstrndx as usize) {
            Some(sh) if shstrndx != 0 => {
                let strtab = cursor.sub(sh.sh_offset, sh.sh_size).map_err(|_| {
                    LoaderError::corrupt_section(
                        ".shstrtab",
                        format!(
                            "contents at {:#x}+{:#x} exceed file size {:#x}",
                            sh.sh_offset,
                            sh.sh_size,
                            cursor.len()
                        ),
                    )
                })?;
                Some(strtab)
            }
            _ => {
                debug!(shstrndx, "no section name string table");
                None
            }
        };

        let mut names = Vec::with_capacity(headers.len());
        for sh in &headers {
            let name = strings
                .and_then(|s| s.read_cstr_at(u64::from(sh.sh_name), MAX_SECTION_NAME).ok())
                .unwrap_or_default();
            names.push(name);
        }

        Ok(Self {
            cursor,
            class,
            headers,
            names,
        })
    }


    /// Get section header by index
    pub fn by_index(&self, index: usize) -> Option<&SectionHeader> {
        self.headers.get(index)
    }

    /// Section name as stored in the string table; empty if unresolvable
    pub fn name(&self, index: usize) -> &str {
        self.names.get(index).map(String::as_str).unwrap_or("")
    }

    /// Indices of all sections of the given type, in table order
    pub fn indices_of_type(&self, sh_type: u32) -> impl Iterator<Item = usize> + '_ {
        self.headers
            .iter()
            .enumerate()
            .filter(move |(_, sh)| sh.sh_type == sh_type)
            .map(|(i, _)| i)
    }

    /// Count sections
    pub fn count(&self) -> usize {
        self.headers.len()
    }

    /// Contents of a section, bounds-checked against the file
    pub fn contents(&self, index: usize) -> Result<ByteCursor<'data>> {
        let sh = self.headers.get(index).ok_or_else(|| {
            LoaderError::corrupt_section(
                SECTION_HEADERS,
                format!("section index {} out of range", index),
            )
        })?;
        if !sh.has_file_data() {
            return Ok(ByteCursor::new(&[]));
        }
        self.cursor.sub(sh.sh_offset, sh.sh_size)
    }

    /// Build the code and data sections, copying their contents.
    ///
    /// Any section whose contents fall outside the file fails the whole load.
    pub fn load(&self, source: &str, config: &LoaderConfig) -> Result<Vec<Section>> {
        let width = self.class.width();
        let mut sections = Vec::new();

        for (i, sh) in self.headers.iter().enumerate() {
            let kind = match SectionKind::classify(sh.is_executable(), sh.is_writable()) {
                Some(kind) => kind,
                None => {
                    trace!(index = i, name = self.name(i), "skipping section");
                    continue;
                }
            };

            let name = match self.name(i) {
                "" => UNNAMED_SECTION.to_string(),
                name => name.to_string(),
            };

            if !width.fits(sh.sh_addr, sh.sh_size) {
                return Err(LoaderError::corrupt_section(
                    name,
                    format!(
                        "address range {:#x}+{:#x} overflows {}-bit address space",
                        sh.sh_addr,
                        sh.sh_size,
                        width.bits()
                    ),
                ));
            }

            let bytes = if sh.has_file_data() {
                if sh.sh_size > config.max_section_bytes {
                    return Err(LoaderError::OutOfMemory {
                        requested: sh.sh_size,
                    });
                }
                self.cursor
                    .read_bytes_at(sh.sh_offset, sh.sh_size)
                    .map_err(|err| match err {
                        LoaderError::OutOfBounds { .. } => LoaderError::corrupt_section(
                            name.clone(),
                            format!(
                                "contents at {:#x}+{:#x} exceed file size {:#x}",
                                sh.sh_offset,
                                sh.sh_size,
                                self.cursor.len()
                            ),
                        ),
                        other => other,
                    })?
            } else {
                Vec::new()
            };

            debug!(name = %name, kind = %kind, vma = sh.sh_addr, size = sh.sh_size, "section");
            sections.push(Section {
                binary: source.to_string(),
                name,
                kind,
                vma: sh.sh_addr,
                size: sh.sh_size,
                file_offset: sh.sh_offset,
                flags: sh.sh_flags,
                bytes,
            });
        }

        Ok(sections)
    }
}

/// Parse a single section header
fn parse_section_header(
    cursor: &ByteCursor<'_>,
    offset: u64,
    class: ElfClass,
    endian: Endian,
) -> Result<SectionHeader> {
    cursor.slice(offset, class.section_header_size())?;
    match class {
        ElfClass::Elf32 => Ok(SectionHeader {
            sh_name: cursor.read_u32_at(offset, endian)?,
            sh_type: cursor.read_u32_at(offset + 4, endian)?,
            sh_flags: u64::from(cursor.read_u32_at(offset + 8, endian)?),
            sh_addr: u64::from(cursor.read_u32_at(offset + 12, endian)?),
            sh_offset: u64::from(cursor.read_u32_at(offset + 16, endian)?),
            sh_size: u64::from(cursor.read_u32_at(offset + 20, endian)?),
            sh_link: cursor.read_u32_at(offset + 24, endian)?,
            sh_info: cursor.read_u32_at(offset + 28, endian)?,
            sh_entsize: u64::from(cursor.read_u32_at(offset + 36, endian)?),
        }),
        ElfClass::Elf64 => Ok(SectionHeader {
            sh_name: cursor.read_u32_at(offset, endian)?,
            sh_type: cursor.read_u32_at(offset + 4, endian)?,
            sh_flags: cursor.read_u64_at(offset + 8, endian)?,
            sh_addr: cursor.read_u64_at(offset + 16, endian)?,
            sh_offset: cursor.read_u64_at(offset + 24, endian)?,
            sh_size: cursor.read_u64_at(offset + 32, endian)?,
            sh_link: cursor.read_u32_at(offset + 40, endian)?,
            sh_info: cursor.read_u32_at(offset + 44, endian)?,
            sh_entsize: cursor.read_u64_at(offset + 56, endian)?,
        }),
    }
}
