//! IPv4 header.

use crate::protocols::id::CoreProtocol;
use crate::protocols::packet::Header;

use std::net::Ipv4Addr;

use byteorder::{BigEndian, ByteOrder};

/// Flag: "Don't fragment"
const IPV4_DF: u16 = 0x4000;
/// Flag: "More fragments"
pub const IPV4_MF: u16 = 0x2000;
/// Fragment offset part
pub const IPV4_FRAG_OFFSET: u16 = 0x1FFF;

/// An IPv4 header, options included.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Ipv4<'a> {
    /// Returns the IP protocol version.
    #[inline]
    pub fn version(&self) -> u8 {
        self.data[0] >> 4
    }

    /// Returns the header length measured in 32-bit words (IHL).
    #[inline]
    pub fn ihl(&self) -> u8 {
        self.data[0] & 0x0f
    }

    /// Returns the differentiated services field.
    #[inline]
    pub fn dscp_ecn(&self) -> u8 {
        self.data[1]
    }

    /// Returns the total length of the packet in bytes, including the header and data.
    #[inline]
    pub fn total_length(&self) -> u16 {
        BigEndian::read_u16(&self.data[2..4])
    }

    #[inline]
    pub fn identification(&self) -> u16 {
        BigEndian::read_u16(&self.data[4..6])
    }

    /// Returns the 16-bit field containing the 3-bit flags and 13-bit fragment offset.
    #[inline]
    pub fn flags_to_fragment_offset(&self) -> u16 {
        BigEndian::read_u16(&self.data[6..8])
    }

    /// Returns `true` if the Don't Fragment flag is set.
    #[inline]
    pub fn df(&self) -> bool {
        self.flags_to_fragment_offset() & IPV4_DF != 0
    }

    /// Returns `true` if the More Fragments flag is set.
    #[inline]
    pub fn mf(&self) -> bool {
        self.flags_to_fragment_offset() & IPV4_MF != 0
    }

    /// Returns the fragment offset in units of 8 bytes.
    #[inline]
    pub fn fragment_offset(&self) -> u16 {
        self.flags_to_fragment_offset() & IPV4_FRAG_OFFSET
    }

    #[inline]
    pub fn time_to_live(&self) -> u8 {
        self.data[8]
    }

    /// Returns the encapsulated IP protocol number.
    #[inline]
    pub fn protocol(&self) -> u8 {
        self.data[9]
    }

    #[inline]
    pub fn header_checksum(&self) -> u16 {
        BigEndian::read_u16(&self.data[10..12])
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(BigEndian::read_u32(&self.data[12..16]))
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(BigEndian::read_u32(&self.data[16..20]))
    }

    /// Returns the raw option bytes.
    #[inline]
    pub fn options(&self) -> &'a [u8] {
        &self.data[20..]
    }
}

impl<'a> Header<'a> for Ipv4<'a> {
    const PROTOCOL: CoreProtocol = CoreProtocol::Ipv4;
    const MIN_LEN: usize = 20;

    fn from_bytes(data: &'a [u8], offset: usize) -> Self {
        Ipv4 { data, offset }
    }

    fn bytes(&self) -> &'a [u8] {
        self.data
    }

    fn offset(&self) -> usize {
        self.offset
    }
}
