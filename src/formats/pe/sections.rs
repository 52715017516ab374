//! Section management for PE files

use tracing::{debug, trace};

use crate::config::LoaderConfig;
use crate::core::section::{Section, SectionKind, UNNAMED_SECTION};
use crate::cursor::{AddrWidth, ByteCursor, Endian};
use crate::error::{LoaderError, Result};
use crate::formats::pe::coff::StringTable;
use crate::formats::pe::types::*;

const SECTION_TABLE: &str = "<section table>";

/// Section table in file order, with resolved names
#[derive(Debug, Clone)]
pub struct SectionTable {
    headers: Vec<SectionHeader>,
    names: Vec<String>,
}

impl SectionTable {
    /// Parse `count` section headers starting at `offset`.
    pub fn parse(
        cursor: &ByteCursor<'_>,
        offset: u64,
        count: u16,
        strings: Option<&StringTable<'_>>,
        config: &LoaderConfig,
    ) -> Result<Self> {
        if usize::from(count) > config.max_sections {
            return Err(LoaderError::corrupt_section(
                SECTION_TABLE,
                format!("{} sections exceeds limit of {}", count, config.max_sections),
            ));
        }

        let table = cursor.sub(offset, u64::from(count) * SECTION_HEADER_SIZE)?;

        let mut headers = Vec::with_capacity(usize::from(count));
        let mut names = Vec::with_capacity(usize::from(count));
        for i in 0..u64::from(count) {
            let header = parse_section_header(&table, i * SECTION_HEADER_SIZE)?;
            names.push(resolve_name(&header, strings));
            headers.push(header);
        }

        Ok(Self { headers, names })
    }

    pub fn by_index(&self, index: usize) -> Option<&SectionHeader> {
        self.headers.get(index)
    }

    /// Section name; empty if unresolvable
    pub fn name(&self, index: usize) -> &str {
        self.names.get(index).map(String::as_str).unwrap_or("")
    }

    /// Count sections
    pub fn count(&self) -> usize {
        self.headers.len()
    }

    /// Convert RVA to file offset.
    ///
    /// RVAs in the zero-filled tail of a section have no file offset.
    pub fn rva_to_offset(&self, rva: u32) -> Option<u64> {
        let section = self.headers.iter().find(|s| s.contains_rva(rva))?;
        let delta = rva - section.virtual_address;
        if delta >= section.size_of_raw_data {
            return None;
        }
        Some(u64::from(section.pointer_to_raw_data) + u64::from(delta))
    }

    /// Build the code and data sections, copying their raw data.
    ///
    /// Raw data outside the file fails the whole load.
    pub fn load(
        &self,
        cursor: &ByteCursor<'_>,
        image_base: u64,
        width: AddrWidth,
        source: &str,
        config: &LoaderConfig,
    ) -> Result<Vec<Section>> {
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

            let size = u64::from(sh.mapped_size());
            let vma = image_base
                .checked_add(u64::from(sh.virtual_address))
                .filter(|&vma| width.fits(vma, size))
                .ok_or_else(|| {
                    LoaderError::corrupt_section(
                        name.clone(),
                        format!(
                            "address {:#x}+{:#x} overflows {}-bit address space",
                            sh.virtual_address,
                            size,
                            width.bits()
                        ),
                    )
                })?;

            let raw_offset = u64::from(sh.pointer_to_raw_data);
            let raw_size = u64::from(sh.size_of_raw_data);
            let bytes = if raw_size == 0 {
                Vec::new()
            } else {
                // The full raw extent must be in the file even though only
                // the mapped part is copied
                cursor.slice(raw_offset, raw_size).map_err(|_| {
                    LoaderError::corrupt_section(
                        name.clone(),
                        format!(
                            "raw data at {:#x}+{:#x} exceeds file size {:#x}",
                            raw_offset,
                            raw_size,
                            cursor.len()
                        ),
                    )
                })?;
                let copy_len = raw_size.min(size);
                if copy_len > config.max_section_bytes {
                    return Err(LoaderError::OutOfMemory {
                        requested: copy_len,
                    });
                }
                cursor.read_bytes_at(raw_offset, copy_len)?
            };

            debug!(name = %name, kind = %kind, vma, size, "section");
            sections.push(Section {
                binary: source.to_string(),
                name,
                kind,
                vma,
                size,
                file_offset: raw_offset,
                flags: u64::from(sh.characteristics),
                bytes,
            });
        }

        Ok(sections)
    }
}

/// Inline name, or `/NNN` resolved through the COFF string table
fn resolve_name(header: &SectionHeader, strings: Option<&StringTable<'_>>) -> String {
    let raw = header.raw_name();
    if let Some(digits) = raw.strip_prefix(b"/") {
        let offset = std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse::<u32>().ok());
        if let (Some(offset), Some(strings)) = (offset, strings) {
            if let Ok(name) = strings.get(offset) {
                return name;
            }
        }
        debug!(name = %String::from_utf8_lossy(raw), "unresolved long section name");
    }
    String::from_utf8_lossy(raw).into_owned()
}

/// Parse a single section header
fn parse_section_header(table: &ByteCursor<'_>, offset: u64) -> Result<SectionHeader> {
    let le = Endian::Little;
    let mut name = [0u8; 8];
    name.copy_from_slice(table.slice(offset, 8)?);
    Ok(SectionHeader {
        name,
        virtual_size: table.read_u32_at(offset + 8, le)?,
        virtual_address: table.read_u32_at(offset + 12, le)?,
        size_of_raw_data: table.read_u32_at(offset + 16, le)?,
        pointer_to_raw_data: table.read_u32_at(offset + 20, le)?,
        characteristics: table.read_u32_at(offset + 36, le)?,
    })
}
