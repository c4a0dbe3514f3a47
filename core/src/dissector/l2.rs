//! Link-layer stage: Ethernet, VLAN, 802.3/LLC/SNAP, MPLS, ARP, IPX and spanning tree.

use super::{DatalinkType, Dissector, L2FrameType};
use crate::memory::view::ByteView;
use crate::protocols::constants::{bpdu, ethertype, header_len, llc};
use crate::protocols::id::CoreProtocol;

impl Dissector {
    /// Records the link-layer headers and hands the payload to L3. Returns `false` if not even
    /// the Ethernet header fits the capture.
    pub(super) fn dissect_l2(&mut self, view: &ByteView<'_>) -> bool {
        if self.add(CoreProtocol::Ethernet, 0, header_len::ETHERNET).is_none() {
            return false;
        }
        match self.datalink {
            DatalinkType::Ethernet => {
                self.dissect_ethernet_payload(view);
            }
            DatalinkType::NovellRaw => {
                self.l2_type = L2FrameType::NovellRaw;
                self.dissect_ipx(header_len::ETHERNET);
            }
        }
        true
    }

    fn dissect_ethernet_payload(&mut self, view: &ByteView<'_>) -> Option<()> {
        let mut offset = header_len::ETHERNET;
        let mut ether_type = view.u16_at(offset - 2).ok()?;
        if ether_type >= ethertype::MIN_ETHERTYPE {
            self.l2_type = L2FrameType::Ether;
        }

        while is_vlan_tpid(ether_type) {
            self.add(CoreProtocol::Vlan, offset, header_len::VLAN)?;
            self.vlan_count = self.vlan_count.saturating_add(1);
            ether_type = view.u16_at(offset + 2).ok()?;
            offset += header_len::VLAN;
        }

        if ether_type < ethertype::MIN_ETHERTYPE {
            return self.dissect_802_3(view, offset);
        }
        self.dissect_ethertype(view, ether_type, offset)
    }

    /// Walks an 802.3 payload: Novell raw IPX, or LLC optionally followed by SNAP.
    fn dissect_802_3(&mut self, view: &ByteView<'_>, offset: usize) -> Option<()> {
        if view.u16_at(offset).ok()? == llc::NOVELL_RAW_MARKER {
            self.l2_type = L2FrameType::NovellRaw;
            return self.dissect_ipx(offset);
        }

        let dsap = view.u8_at(offset).ok()?;
        let ssap = view.u8_at(offset + 1).ok()?;
        let control = view.u8_at(offset + 2).ok()?;
        let llc_len = if control & llc::CONTROL_U_FORMAT == llc::CONTROL_U_FORMAT {
            header_len::LLC
        } else {
            header_len::LLC_EXTENDED
        };
        self.add(CoreProtocol::Llc, offset, llc_len)?;
        self.l2_type = L2FrameType::Llc;
        let payload = offset + llc_len;

        match (dsap, ssap) {
            (llc::SAP_SNAP, llc::SAP_SNAP) if control == llc::CONTROL_UI => {
                self.add(CoreProtocol::Snap, payload, header_len::SNAP)?;
                self.l2_type = L2FrameType::Snap;
                let ether_type = view.u16_at(payload + 3).ok()?;
                self.dissect_ethertype(view, ether_type, payload + header_len::SNAP)
            }
            (llc::SAP_IPX, llc::SAP_IPX) => self.dissect_ipx(payload),
            (llc::SAP_STP, llc::SAP_STP) => self.dissect_stp(view, payload),
            _ => {
                log::trace!("Unrecognized LLC SAPs {:#04x}/{:#04x}", dsap, ssap);
                None
            }
        }
    }

    /// Dispatches on an EtherType found after Ethernet, VLAN or SNAP.
    pub(super) fn dissect_ethertype(
        &mut self,
        view: &ByteView<'_>,
        ether_type: u16,
        offset: usize,
    ) -> Option<()> {
        match ether_type {
            ethertype::IPV4 => self.dissect_ipv4(view, offset, 0),
            ethertype::IPV6 => self.dissect_ipv6(view, offset, 0),
            ethertype::ARP | ethertype::RARP => self.dissect_arp(view, offset),
            ethertype::MPLS_UNICAST | ethertype::MPLS_MULTICAST => self.dissect_mpls(view, offset),
            ethertype::IPX => self.dissect_ipx(offset),
            _ => {
                let recognized = match self.extension.as_mut() {
                    Some(ext) => ext.dissect_ethertype(ether_type, view, offset, &mut self.records),
                    None => false,
                };
                if !recognized {
                    log::trace!("Unrecognized EtherType {:#06x} at {}", ether_type, offset);
                }
                None
            }
        }
    }

    fn dissect_arp(&mut self, view: &ByteView<'_>, offset: usize) -> Option<()> {
        let hw_len = view.u8_at(offset + 4).ok()? as usize;
        let proto_len = view.u8_at(offset + 5).ok()? as usize;
        let length = header_len::ARP_FIXED + 2 * (hw_len + proto_len);
        self.add(CoreProtocol::Arp, offset, length)?;
        Some(())
    }

    /// Records every label stack entry up to the bottom of stack, then guesses the payload from
    /// its version nibble.
    fn dissect_mpls(&mut self, view: &ByteView<'_>, mut offset: usize) -> Option<()> {
        loop {
            let entry = view.u32_at(offset).ok()?;
            self.add(CoreProtocol::Mpls, offset, header_len::MPLS)?;
            self.mpls_count = self.mpls_count.saturating_add(1);
            offset += header_len::MPLS;
            if entry & MPLS_BOTTOM_OF_STACK != 0 {
                break;
            }
        }
        match view.u8_at(offset).ok()? >> 4 {
            4 => self.dissect_ipv4(view, offset, 0),
            6 => self.dissect_ipv6(view, offset, 0),
            version => {
                log::trace!("Unrecognized MPLS payload version {}", version);
                None
            }
        }
    }

    fn dissect_ipx(&mut self, offset: usize) -> Option<()> {
        self.add(CoreProtocol::Ipx, offset, header_len::IPX)?;
        Some(())
    }

    fn dissect_stp(&mut self, view: &ByteView<'_>, offset: usize) -> Option<()> {
        let length = match view.u8_at(offset + 3).ok()? {
            bpdu::CONFIGURATION => header_len::STP_CONFIGURATION,
            bpdu::TOPOLOGY_CHANGE => header_len::STP_TOPOLOGY_CHANGE,
            bpdu::RAPID => header_len::STP_RAPID,
            kind => {
                log::trace!("Unrecognized BPDU type {:#04x}", kind);
                return None;
            }
        };
        self.add(CoreProtocol::Stp, offset, length)?;
        Some(())
    }
}

const MPLS_BOTTOM_OF_STACK: u32 = 0x0000_0100;

#[inline]
fn is_vlan_tpid(ether_type: u16) -> bool {
    matches!(
        ether_type,
        ethertype::VLAN_802_1Q | ethertype::VLAN_802_1AD | ethertype::VLAN_9100
    )
}
