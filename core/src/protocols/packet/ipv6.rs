//! IPv6 header.
//!
//! The Record of an IPv6 header spans the fixed header and the whole extension header chain.

use crate::protocols::id::CoreProtocol;
use crate::protocols::packet::Header;

use std::net::Ipv6Addr;

use byteorder::{BigEndian, ByteOrder};

/// An IPv6 header plus its extension headers.
#[derive(Debug, Clone, Copy)]
pub struct Ipv6<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Ipv6<'a> {
    /// Returns the IP protocol version.
    #[inline]
    pub fn version(&self) -> u8 {
        self.data[0] >> 4
    }

    /// Returns the 8-bit traffic class.
    #[inline]
    pub fn traffic_class(&self) -> u8 {
        ((self.version_to_flow_label() >> 20) & 0xff) as u8
    }

    /// Returns the 20-bit flow label.
    #[inline]
    pub fn flow_label(&self) -> u32 {
        self.version_to_flow_label() & 0x000f_ffff
    }

    #[inline]
    fn version_to_flow_label(&self) -> u32 {
        BigEndian::read_u32(&self.data[0..4])
    }

    /// Returns the length of the payload in bytes, extension headers included.
    #[inline]
    pub fn payload_length(&self) -> u16 {
        BigEndian::read_u16(&self.data[4..6])
    }

    /// Returns the next header field of the fixed header.
    #[inline]
    pub fn next_header(&self) -> u8 {
        self.data[6]
    }

    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.data[7]
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv6Addr {
        Ipv6Addr::from(BigEndian::read_u128(&self.data[8..24]))
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv6Addr {
        Ipv6Addr::from(BigEndian::read_u128(&self.data[24..40]))
    }

    /// Returns the bytes of the extension header chain.
    #[inline]
    pub fn extensions(&self) -> &'a [u8] {
        &self.data[40..]
    }
}

impl<'a> Header<'a> for Ipv6<'a> {
    const PROTOCOL: CoreProtocol = CoreProtocol::Ipv6;
    const MIN_LEN: usize = 40;

    fn from_bytes(data: &'a [u8], offset: usize) -> Self {
        Ipv6 { data, offset }
    }

    fn bytes(&self) -> &'a [u8] {
        self.data
    }

    fn offset(&self) -> usize {
        self.offset
    }
}
