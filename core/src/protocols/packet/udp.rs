//! UDP header.

use crate::protocols::id::CoreProtocol;
use crate::protocols::packet::Header;

use byteorder::{BigEndian, ByteOrder};

/// A UDP header.
#[derive(Debug, Clone, Copy)]
pub struct Udp<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Udp<'a> {
    /// Returns the sending port.
    #[inline]
    pub fn src_port(&self) -> u16 {
        BigEndian::read_u16(&self.data[0..2])
    }

    /// Returns the receiving port.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        BigEndian::read_u16(&self.data[2..4])
    }

    /// Returns the length of packet (both header and payload) in bytes.
    #[inline]
    pub fn length(&self) -> u16 {
        BigEndian::read_u16(&self.data[4..6])
    }

    /// Returns the UDP checksum.
    #[inline]
    pub fn checksum(&self) -> u16 {
        BigEndian::read_u16(&self.data[6..8])
    }
}

impl<'a> Header<'a> for Udp<'a> {
    const PROTOCOL: CoreProtocol = CoreProtocol::Udp;
    const MIN_LEN: usize = 8;

    fn from_bytes(data: &'a [u8], offset: usize) -> Self {
        Udp { data, offset }
    }

    fn bytes(&self) -> &'a [u8] {
        self.data
    }

    fn offset(&self) -> usize {
        self.offset
    }
}
