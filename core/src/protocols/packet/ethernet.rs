//! Ethernet header.

use crate::protocols::id::CoreProtocol;
use crate::protocols::packet::Header;

use byteorder::{BigEndian, ByteOrder};
use pnet::datalink::MacAddr;

/// An Ethernet II or 802.3 header. VLAN tags are separate Records.
#[derive(Debug, Clone, Copy)]
pub struct Ethernet<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Ethernet<'a> {
    /// Returns the destination MAC address.
    #[inline]
    pub fn dst(&self) -> MacAddr {
        mac_at(self.data, 0)
    }

    /// Returns the source MAC address.
    #[inline]
    pub fn src(&self) -> MacAddr {
        mac_at(self.data, 6)
    }

    /// Returns the raw type/length field.
    #[inline]
    pub fn ether_type(&self) -> u16 {
        BigEndian::read_u16(&self.data[12..14])
    }

    /// Returns `true` if the type/length field holds an 802.3 payload length.
    #[inline]
    pub fn is_802_3(&self) -> bool {
        self.ether_type() < crate::protocols::constants::ethertype::MIN_ETHERTYPE
    }
}

fn mac_at(data: &[u8], at: usize) -> MacAddr {
    MacAddr::new(
        data[at],
        data[at + 1],
        data[at + 2],
        data[at + 3],
        data[at + 4],
        data[at + 5],
    )
}

impl<'a> Header<'a> for Ethernet<'a> {
    const PROTOCOL: CoreProtocol = CoreProtocol::Ethernet;
    const MIN_LEN: usize = 14;

    fn from_bytes(data: &'a [u8], offset: usize) -> Self {
        Ethernet { data, offset }
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
    fn core_ethernet_fields() {
        let frame = hex::decode("000c29340bde000c29c5f69b8035").unwrap();
        let record = Record {
            id: CoreProtocol::Ethernet.id(),
            offset: 0,
            length: 14,
        };
        let eth = Ethernet::bind(&frame, record).unwrap();
        assert_eq!(eth.dst(), MacAddr::new(0x00, 0x0c, 0x29, 0x34, 0x0b, 0xde));
        assert_eq!(eth.src(), MacAddr::new(0x00, 0x0c, 0x29, 0xc5, 0xf6, 0x9b));
        assert_eq!(eth.ether_type(), 0x8035);
        assert!(!eth.is_802_3());
        assert_eq!(eth.next_header_offset(), 14);
    }

    #[test]
    fn core_ethernet_rejects_wrong_record() {
        let frame = [0u8; 14];
        let record = Record {
            id: CoreProtocol::Ipv4.id(),
            offset: 0,
            length: 14,
        };
        assert!(Ethernet::bind(&frame, record).is_err());
        let record = Record {
            id: CoreProtocol::Ethernet.id(),
            offset: 4,
            length: 14,
        };
        assert!(Ethernet::bind(&frame, record).is_err());
    }
}
