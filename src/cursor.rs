//! Bounds-checked reads over an untrusted byte buffer.
//!
//! Every offset and length that reaches this module comes from a header
//! field, so all range arithmetic is checked and failures surface as
//! [`LoaderError::OutOfBounds`] instead of panics.

use crate::error::{LoaderError, Result};

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

/// Width of an address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrWidth {
    W32,
    W64,
}

impl AddrWidth {
    pub fn bits(&self) -> u8 {
        match self {
            AddrWidth::W32 => 32,
            AddrWidth::W64 => 64,
        }
    }

    /// Size of an address in bytes.
    pub fn bytes(&self) -> usize {
        match self {
            AddrWidth::W32 => 4,
            AddrWidth::W64 => 8,
        }
    }

    /// Largest address representable at this width.
    pub fn max_addr(&self) -> u64 {
        match self {
            AddrWidth::W32 => u32::MAX as u64,
            AddrWidth::W64 => u64::MAX,
        }
    }

    /// True when `[start, start + len)` lies inside the address space.
    pub fn fits(&self, start: u64, len: u64) -> bool {
        match self {
            AddrWidth::W32 => start
                .checked_add(len)
                .map_or(false, |end| end <= 1u64 << 32),
            AddrWidth::W64 => start.checked_add(len).is_some(),
        }
    }
}

/// Immutable, bounds-checked view over a binary image.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'data> {
    data: &'data [u8],
}

impl<'data> ByteCursor<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Self { data }
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Validate `[offset, offset + len)` and return it as a `usize` range.
    fn range(&self, offset: u64, len: u64) -> Result<std::ops::Range<usize>> {
        let oob = || LoaderError::OutOfBounds {
            offset,
            len,
            size: self.data.len() as u64,
        };
        let end = offset.checked_add(len).ok_or_else(oob)?;
        if end > self.data.len() as u64 {
            return Err(oob());
        }
        // end fits in the buffer, so both ends fit in usize
        Ok(offset as usize..end as usize)
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'data [u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.data[range])
    }

    /// Copy `len` bytes starting at `offset` into an owned buffer.
    pub fn read_bytes_at(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let src = self.slice(offset, len)?;
        let mut out = Vec::new();
        out.try_reserve_exact(src.len())
            .map_err(|_| LoaderError::OutOfMemory { requested: len })?;
        out.extend_from_slice(src);
        Ok(out)
    }

    /// Sub-cursor over `[offset, offset + len)`; offsets inside it are relative.
    pub fn sub(&self, offset: u64, len: u64) -> Result<ByteCursor<'data>> {
        self.slice(offset, len).map(ByteCursor::new)
    }

    fn array<const N: usize>(&self, offset: u64) -> Result<[u8; N]> {
        let range = self.range(offset, N as u64)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[range]);
        Ok(out)
    }

    pub fn read_u8_at(&self, offset: u64) -> Result<u8> {
        self.array::<1>(offset).map(|b| b[0])
    }

    pub fn read_u16_at(&self, offset: u64, endian: Endian) -> Result<u16> {
        let bytes = self.array::<2>(offset)?;
        Ok(match endian {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    pub fn read_u32_at(&self, offset: u64, endian: Endian) -> Result<u32> {
        let bytes = self.array::<4>(offset)?;
        Ok(match endian {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }

    pub fn read_u64_at(&self, offset: u64, endian: Endian) -> Result<u64> {
        let bytes = self.array::<8>(offset)?;
        Ok(match endian {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        })
    }

    /// Read an address whose size depends on the word width.
    pub fn read_addr_at(&self, offset: u64, width: AddrWidth, endian: Endian) -> Result<u64> {
        match width {
            AddrWidth::W32 => self.read_u32_at(offset, endian).map(u64::from),
            AddrWidth::W64 => self.read_u64_at(offset, endian),
        }
    }

    /// Read a zero-terminated string of at most `max_len` bytes.
    ///
    /// A string that runs into the end of the buffer or the length cap is
    /// returned truncated. Invalid UTF-8 is replaced lossily.
    pub fn read_cstr_at(&self, offset: u64, max_len: usize) -> Result<String> {
        if offset >= self.data.len() as u64 {
            return Err(LoaderError::OutOfBounds {
                offset,
                len: 1,
                size: self.data.len() as u64,
            });
        }
        let start = offset as usize;
        let end = start.saturating_add(max_len).min(self.data.len());
        let bytes = &self.data[start..end];
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }

    /// Compare the bytes at `offset` with `magic`, treating short reads as a mismatch.
    pub fn starts_with_at(&self, offset: u64, magic: &[u8]) -> bool {
        self.slice(offset, magic.len() as u64)
            .map(|b| b == magic)
            .unwrap_or(false)
    }
}
