//! Typed accessors over dissected headers.
//!
//! The dissector only locates headers. Once a Record is known, the types in this module give
//! field-level access to the bytes it covers without copying them. Every header type borrows the
//! captured frame and checks that the Record it is bound to carries its protocol id.

pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;

use crate::dissector::record::Record;
use crate::protocols::id::CoreProtocol;

use anyhow::{bail, Result};
use thiserror::Error;

/// A header located by a Record.
pub trait Header<'a>: Sized {
    /// Protocol id a Record must carry to bind to this type.
    const PROTOCOL: CoreProtocol;

    /// Smallest valid header length in bytes.
    const MIN_LEN: usize;

    /// Wraps the header bytes. `data` is exactly the span of the Record.
    fn from_bytes(data: &'a [u8], offset: usize) -> Self;

    /// Bytes covered by the header, including options.
    fn bytes(&self) -> &'a [u8];

    /// Offset of the header from the start of the frame.
    fn offset(&self) -> usize;

    /// Binds `record` to the header bytes in `frame`.
    fn bind(frame: &'a [u8], record: Record) -> Result<Self> {
        if record.id != Self::PROTOCOL.id() {
            bail!(PacketParseError::InvalidProtocol);
        }
        let length = record.length as usize;
        if length < Self::MIN_LEN {
            bail!(PacketParseError::InvalidRead);
        }
        match frame.get(record.offset as usize..record.end()) {
            Some(data) => Ok(Self::from_bytes(data, record.offset as usize)),
            None => bail!(PacketParseError::InvalidRead),
        }
    }

    /// Length of the header in bytes.
    #[inline]
    fn header_len(&self) -> usize {
        self.bytes().len()
    }

    /// Offset of the first byte after the header from the start of the frame.
    #[inline]
    fn next_header_offset(&self) -> usize {
        self.offset() + self.header_len()
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketParseError {
    #[error("Record does not describe this protocol")]
    InvalidProtocol,

    #[error("Record does not fit the frame")]
    InvalidRead,
}
