//! Section type for loadable code and data regions.
//!
//! Sections are the loadable organizational units of an executable. Only
//! code and data sections are kept; everything else is dropped during
//! loading, so there is no "other" kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder name for sections without a usable name.
pub const UNNAMED_SECTION: &str = "<unnamed>";

/// Canonical name of the main code section.
pub const TEXT_SECTION: &str = ".text";

/// Whether a section holds code or data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Executable contents
    Code,
    /// Writable, non-executable contents
    Data,
}

impl SectionKind {
    /// Classify from raw permission bits.
    ///
    /// Execute wins over write: a section that is both is reported as code.
    /// Returns `None` for sections that are neither.
    pub fn classify(executable: bool, writable: bool) -> Option<Self> {
        if executable {
            Some(SectionKind::Code)
        } else if writable {
            Some(SectionKind::Data)
        } else {
            None
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Code => write!(f, "CODE"),
            SectionKind::Data => write!(f, "DATA"),
        }
    }
}

/// A loaded section with an owned copy of its file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Source identifier of the owning binary (lookup only, never ownership)
    pub binary: String,
    /// Section name (e.g., ".text", ".data")
    pub name: String,
    /// Code or data
    pub kind: SectionKind,
    /// Virtual memory address once loaded
    pub vma: u64,
    /// Size in bytes
    pub size: u64,
    /// File offset of the contents
    pub file_offset: u64,
    /// Format-specific flags (sh_flags or PE characteristics)
    pub flags: u64,
    /// Contents copied from the file.
    ///
    /// Empty for uninitialized sections (`.bss` and friends), and may be
    /// shorter than `size` when the file holds less than the mapped size.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Section {
    /// One past the last address of the section.
    pub fn end(&self) -> u64 {
        self.vma.saturating_add(self.size)
    }

    /// Returns true if the address is in this section.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.vma && addr - self.vma < self.size
    }

    pub fn is_code(&self) -> bool {
        self.kind == SectionKind::Code
    }

    pub fn is_data(&self) -> bool {
        self.kind == SectionKind::Data
    }

    /// Bytes backing `addr` onwards, if the file provides them.
    pub fn bytes_at(&self, addr: u64) -> Option<&[u8]> {
        if !self.contains(addr) {
            return None;
        }
        let start = usize::try_from(addr - self.vma).ok()?;
        self.bytes.get(start..)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#018x} {:<8} {:<20} {}",
            self.vma, self.size, self.name, self.kind
        )
    }
}
