//! TCP header.

use crate::protocols::id::CoreProtocol;
use crate::protocols::packet::Header;

use byteorder::{BigEndian, ByteOrder};

// TCP flags.
pub const CWR: u8 = 0b1000_0000;
pub const ECE: u8 = 0b0100_0000;
pub const URG: u8 = 0b0010_0000;
pub const ACK: u8 = 0b0001_0000;
pub const PSH: u8 = 0b0000_1000;
pub const RST: u8 = 0b0000_0100;
pub const SYN: u8 = 0b0000_0010;
pub const FIN: u8 = 0b0000_0001;

/// A TCP header, options included.
#[derive(Debug, Clone, Copy)]
pub struct Tcp<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Tcp<'a> {
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

    /// Returns the sequence number.
    #[inline]
    pub fn seq_no(&self) -> u32 {
        BigEndian::read_u32(&self.data[4..8])
    }

    /// Returns the acknowledgment number.
    #[inline]
    pub fn ack_no(&self) -> u32 {
        BigEndian::read_u32(&self.data[8..12])
    }

    /// Returns the header length measured in 32-bit words.
    #[inline]
    pub fn data_offset(&self) -> u8 {
        self.data[12] >> 4
    }

    /// Returns the 8-bit field containing the control flags.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.data[13]
    }

    #[inline]
    pub fn window(&self) -> u16 {
        BigEndian::read_u16(&self.data[14..16])
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        BigEndian::read_u16(&self.data[16..18])
    }

    #[inline]
    pub fn urgent_pointer(&self) -> u16 {
        BigEndian::read_u16(&self.data[18..20])
    }

    /// Returns `true` if the (SYN) flag is set.
    #[inline]
    pub fn syn(&self) -> bool {
        self.flags() & SYN != 0
    }

    /// Returns `true` if the (ACK) flag is set.
    #[inline]
    pub fn ack(&self) -> bool {
        self.flags() & ACK != 0
    }

    /// Returns `true` if both `SYN` and `ACK` flags are set.
    #[inline]
    pub fn synack(&self) -> bool {
        self.flags() & (ACK | SYN) == (ACK | SYN)
    }

    #[inline]
    pub fn fin(&self) -> bool {
        self.flags() & FIN != 0
    }

    #[inline]
    pub fn rst(&self) -> bool {
        self.flags() & RST != 0
    }

    /// Returns the raw option bytes.
    #[inline]
    pub fn options(&self) -> &'a [u8] {
        &self.data[20..]
    }
}

impl<'a> Header<'a> for Tcp<'a> {
    const PROTOCOL: CoreProtocol = CoreProtocol::Tcp;
    const MIN_LEN: usize = 20;

    fn from_bytes(data: &'a [u8], offset: usize) -> Self {
        Tcp { data, offset }
    }

    fn bytes(&self) -> &'a [u8] {
        self.data
    }

    fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dissector::record::Record;

    #[test]
    fn core_tcp_fields() {
        let frame = hex::decode("c35000501234567800000000a0027210abcd0000020405b4").unwrap();
        let record = Record {
            id: CoreProtocol::Tcp.id(),
            offset: 0,
            length: 24,
        };
        let tcp = Tcp::bind(&frame, record).unwrap();
        assert_eq!(tcp.src_port(), 50000);
        assert_eq!(tcp.dst_port(), 80);
        assert_eq!(tcp.seq_no(), 0x1234_5678);
        assert_eq!(tcp.data_offset(), 10);
        assert!(tcp.syn());
        assert!(!tcp.synack());
        assert_eq!(tcp.window(), 0x7210);
        assert_eq!(tcp.options(), &[0x02, 0x04, 0x05, 0xb4]);
    }
}
