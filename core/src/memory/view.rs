//! Bounds-checked view over captured packet bytes.
//!
//! ## Remarks
//! A `ByteView` never owns its bytes and never copies them. Every read is checked against the
//! captured length, so a truncated capture can only ever produce a [`ViewError`], never a panic.
//! Multi-byte reads are big-endian (network byte order).

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

/// A read-only window over a captured frame.
#[derive(Clone, Copy)]
pub struct ByteView<'a> {
    data: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// Creates a view over the whole of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteView { data }
    }

    /// Creates a view over the first `len` bytes of `data`.
    ///
    /// Errors if `len` exceeds the length of `data`.
    pub fn with_len(data: &'a [u8], len: usize) -> Result<Self, ViewError> {
        match data.get(..len) {
            Some(data) => Ok(ByteView { data }),
            None => Err(ViewError::ReadPastBuffer),
        }
    }

    /// Returns the number of bytes in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the view holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the contents of the view as a byte slice.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns `true` if `count` bytes are readable starting at `offset`.
    #[inline]
    pub fn has(&self, offset: usize, count: usize) -> bool {
        offset
            .checked_add(count)
            .map_or(false, |end| end <= self.data.len())
    }

    /// Returns `count` bytes starting at `offset`.
    ///
    /// Errors if `offset` is greater than or equal to the view length or `count` exceeds the
    /// bytes remaining at `offset`.
    #[inline]
    pub fn get_slice(&self, offset: usize, count: usize) -> Result<&'a [u8], ViewError> {
        if offset >= self.data.len() {
            return Err(ViewError::BadOffset);
        }
        if !self.has(offset, count) {
            return Err(ViewError::ReadPastBuffer);
        }
        Ok(&self.data[offset..offset + count])
    }

    /// Reads the byte at `offset`.
    #[inline]
    pub fn u8_at(&self, offset: usize) -> Result<u8, ViewError> {
        self.data.get(offset).copied().ok_or(ViewError::BadOffset)
    }

    /// Reads a big-endian `u16` at `offset`.
    #[inline]
    pub fn u16_at(&self, offset: usize) -> Result<u16, ViewError> {
        self.get_slice(offset, 2).map(BigEndian::read_u16)
    }

    /// Reads a big-endian 24-bit value at `offset`.
    #[inline]
    pub fn u24_at(&self, offset: usize) -> Result<u32, ViewError> {
        self.get_slice(offset, 3).map(BigEndian::read_u24)
    }

    /// Reads a big-endian `u32` at `offset`.
    #[inline]
    pub fn u32_at(&self, offset: usize) -> Result<u32, ViewError> {
        self.get_slice(offset, 4).map(BigEndian::read_u32)
    }
}

impl fmt::Debug for ByteView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.data.len())
            .finish()
    }
}

// hex dump, 16 bytes per line
impl fmt::Display for ByteView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.data.chunks(16).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:04x}  {}", i * 16, hex::encode(line))?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewError {
    #[error("Offset exceeds view length")]
    BadOffset,

    #[error("Data read exceeds view")]
    ReadPastBuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_view_reads_big_endian() {
        let bytes = [0x12, 0x34, 0x56, 0x78, 0x9a];
        let view = ByteView::new(&bytes);
        assert_eq!(view.u8_at(0), Ok(0x12));
        assert_eq!(view.u16_at(1), Ok(0x3456));
        assert_eq!(view.u24_at(0), Ok(0x123456));
        assert_eq!(view.u32_at(1), Ok(0x3456789a));
    }

    #[test]
    fn core_view_rejects_reads_past_end() {
        let bytes = [0u8; 4];
        let view = ByteView::new(&bytes);
        assert_eq!(view.u8_at(4), Err(ViewError::BadOffset));
        assert_eq!(view.u16_at(3), Err(ViewError::ReadPastBuffer));
        assert_eq!(view.u32_at(1), Err(ViewError::ReadPastBuffer));
        assert!(view.has(0, 4));
        assert!(!view.has(1, 4));
        assert!(!view.has(usize::MAX, 2));
    }

    #[test]
    fn core_view_with_len_truncates() {
        let bytes = [1u8, 2, 3, 4, 5, 6];
        let view = ByteView::with_len(&bytes, 3).unwrap();
        assert_eq!(view.len(), 3);
        assert!(view.u8_at(3).is_err());
        assert!(ByteView::with_len(&bytes, 7).is_err());
    }

    #[test]
    fn core_view_display_hex_dump() {
        let bytes: Vec<u8> = (0u8..18).collect();
        let dump = ByteView::new(&bytes).to_string();
        let mut lines = dump.lines();
        assert_eq!(
            lines.next(),
            Some("0000  000102030405060708090a0b0c0d0e0f")
        );
        assert_eq!(lines.next(), Some("0010  1011"));
    }
}
