//! Option and sub-record walkers: IPv4/TCP options, Hop-by-Hop TLVs, Neighbor-Discovery options
//! and MLDv2 multicast address records.
//!
//! All walkers stay synchronized on unrecognized entries by skipping their declared length, and
//! stop at the first entry whose length is malformed or runs past its enclosing header.

use super::Dissector;
use crate::memory::view::ByteView;
use crate::protocols::constants::{header_len, ip6_option};
use crate::protocols::id::{Icmp6Option, Ip6Option, ProtocolId};

/// Kind shared by IPv4 and TCP options for End of Option List.
const KIND_END_OF_LIST: u8 = 0;
/// Kind shared by IPv4 and TCP options for No Operation.
const KIND_NOP: u8 = 1;

impl Dissector {
    /// Walks IPv4 or TCP options in `start..end`.
    ///
    /// `lookup` maps an option kind to its protocol id; unrecognized kinds are skipped.
    pub(super) fn dissect_options<F>(
        &mut self,
        view: &ByteView<'_>,
        start: usize,
        end: usize,
        lookup: F,
    ) where
        F: Fn(u8) -> Option<ProtocolId>,
    {
        let mut offset = start;
        while offset < end {
            let kind = match view.u8_at(offset) {
                Ok(kind) => kind,
                Err(_) => break,
            };
            let length = match kind {
                KIND_END_OF_LIST | KIND_NOP => 1,
                _ => match view.u8_at(offset + 1) {
                    Ok(length) => length as usize,
                    Err(_) => break,
                },
            };
            if (kind > KIND_NOP && length < 2) || offset + length > end {
                log::debug!("Malformed option {} of length {} at {}", kind, length, offset);
                break;
            }
            match lookup(kind) {
                Some(id) => {
                    if self.add(id, offset, length).is_none() {
                        break;
                    }
                }
                None => log::trace!("Skipping unrecognized option {} at {}", kind, offset),
            }
            if kind == KIND_END_OF_LIST {
                break;
            }
            offset += length;
        }
    }

    /// Walks the TLV options of a Hop-by-Hop header in `start..end`.
    pub(super) fn dissect_hop_by_hop(&mut self, view: &ByteView<'_>, start: usize, end: usize) {
        let mut offset = start;
        while offset < end {
            let kind = match view.u8_at(offset) {
                Ok(kind) => kind,
                Err(_) => break,
            };
            let length = if kind == ip6_option::PAD1 {
                1
            } else {
                match view.u8_at(offset + 1) {
                    Ok(length) => 2 + length as usize,
                    Err(_) => break,
                }
            };
            if offset + length > end {
                log::debug!("Hop-by-Hop option {} overruns header at {}", kind, offset);
                break;
            }
            match Ip6Option::from_tlv_type(kind) {
                Some(option) => {
                    if self.add(option, offset, length).is_none() {
                        break;
                    }
                }
                None => log::trace!("Skipping unrecognized Hop-by-Hop option {:#04x}", kind),
            }
            offset += length;
        }
    }

    /// Walks Neighbor-Discovery options from `start` to the end of the capture.
    pub(super) fn dissect_nd_options(&mut self, view: &ByteView<'_>, start: usize) {
        let mut offset = start;
        while offset < view.len() {
            let (kind, units) = match (view.u8_at(offset), view.u8_at(offset + 1)) {
                (Ok(kind), Ok(units)) => (kind, units as usize),
                _ => break,
            };
            // A zero length is invalid and would never advance.
            if units == 0 {
                log::debug!("Zero-length ND option {} at {}", kind, offset);
                break;
            }
            let length = units * 8;
            match Icmp6Option::from_nd_type(kind) {
                Some(option) => {
                    if self.add(option, offset, length).is_none() {
                        break;
                    }
                }
                None => {
                    if !view.has(offset, length) {
                        break;
                    }
                    log::trace!("Skipping unrecognized ND option {} at {}", kind, offset);
                }
            }
            offset += length;
        }
    }

    /// Records the multicast address records of a Multicast Listener Report v2 whose 8-byte
    /// fixed header starts at `offset`. Returns the total message length.
    pub(super) fn dissect_mcast_records(&mut self, view: &ByteView<'_>, offset: usize) -> usize {
        let count = match view.u16_at(offset + 6) {
            Ok(count) => count,
            Err(_) => return header_len::ICMP6_MLR_V2,
        };
        let mut cursor = offset + header_len::ICMP6_MLR_V2;
        for _ in 0..count {
            let header = (
                view.u8_at(cursor),
                view.u8_at(cursor + 1),
                view.u16_at(cursor + 2),
            );
            let (kind, aux_words, sources) = match header {
                (Ok(kind), Ok(aux), Ok(sources)) => (kind, aux as usize, sources as usize),
                _ => break,
            };
            let length = header_len::MCAST_ADDRESS_RECORD
                + aux_words * 4
                + sources * header_len::IPV6_ADDRESS;
            let record = Icmp6Option::from_mcast_record_type(kind);
            if self.add(record, cursor, length).is_none() {
                break;
            }
            cursor += length;
        }
        cursor - offset
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::spans;
    use super::super::*;
    use crate::memory::view::ByteView;
    use crate::protocols::id::TcpOption;

    #[test]
    fn core_options_tcp_eol_stops_walk() {
        let view_bytes = hex::decode("0101000204").unwrap();
        let view = ByteView::new(&view_bytes);
        let mut dissector = Dissector::new();
        dissector.records.reset(view.len(), 0);
        dissector.dissect_options(&view, 0, view.len(), |kind| {
            TcpOption::from_kind(kind).map(TcpOption::id)
        });
        assert_eq!(
            spans(&dissector),
            vec![("nop", 0, 1), ("nop", 1, 1), ("end_of_list", 2, 1)]
        );
    }

    #[test]
    fn core_options_overrun_stops_walk() {
        // MSS claims 6 bytes but only 4 remain in the header.
        let view_bytes = hex::decode("0206ffff").unwrap();
        let view = ByteView::new(&view_bytes);
        let mut dissector = Dissector::new();
        dissector.records.reset(view.len(), 0);
        dissector.dissect_options(&view, 0, view.len(), |kind| {
            TcpOption::from_kind(kind).map(TcpOption::id)
        });
        assert!(dissector.records().is_empty());

        let view_bytes = hex::decode("02010000").unwrap();
        let view = ByteView::new(&view_bytes);
        dissector.records.reset(view.len(), 0);
        dissector.dissect_options(&view, 0, view.len(), |kind| {
            TcpOption::from_kind(kind).map(TcpOption::id)
        });
        assert!(dissector.records().is_empty());
    }

    #[test]
    fn core_options_hop_by_hop_pad1() {
        let view_bytes = hex::decode("000001020000").unwrap();
        let view = ByteView::new(&view_bytes);
        let mut dissector = Dissector::new();
        dissector.records.reset(view.len(), 0);
        dissector.dissect_hop_by_hop(&view, 0, view.len());
        assert_eq!(
            spans(&dissector),
            vec![("pad1", 0, 1), ("pad1", 1, 1), ("pad_n", 2, 4)]
        );
    }

    #[test]
    fn core_options_nd_zero_length_stops() {
        let view_bytes = hex::decode("0101000c29c5f69b0200000000000000").unwrap();
        let view = ByteView::new(&view_bytes);
        let mut dissector = Dissector::new();
        dissector.records.reset(view.len(), 0);
        dissector.dissect_nd_options(&view, 0);
        assert_eq!(spans(&dissector), vec![("source_link_layer_address", 0, 8)]);
    }
}
