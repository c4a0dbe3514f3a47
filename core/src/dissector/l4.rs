//! Transport-layer stage: TCP, UDP, SCTP, GRE, ICMPv4 and ICMPv6.

use super::{Dissector, L4FrameType};
use crate::memory::view::ByteView;
use crate::protocols::constants::{ethertype, gre_flags, header_len, icmp4_type, icmp6_type};
use crate::protocols::id::{CoreProtocol, TcpOption};

use super::l3::nested;

impl Dissector {
    /// Sets the L4 frame type for headers of the outermost IP packet.
    #[inline]
    fn set_l4_type(&mut self, l4_type: L4FrameType, depth: u8) {
        if depth == 0 {
            self.l4_type = l4_type;
        }
    }

    pub(super) fn dissect_tcp(&mut self, view: &ByteView<'_>, offset: usize, depth: u8) -> Option<()> {
        let data_offset = (view.u8_at(offset + 12).ok()? >> 4) as usize * 4;
        if data_offset < header_len::TCP {
            log::debug!("TCP data offset {} below minimum at {}", data_offset, offset);
            return None;
        }
        self.add(CoreProtocol::Tcp, offset, data_offset)?;
        self.set_l4_type(L4FrameType::Tcp, depth);
        if data_offset > header_len::TCP {
            self.dissect_options(
                view,
                offset + header_len::TCP,
                offset + data_offset,
                |kind| TcpOption::from_kind(kind).map(TcpOption::id),
            );
        }
        Some(())
    }

    /// Records the UDP header and offers its ports to the extension.
    pub(super) fn dissect_udp(&mut self, view: &ByteView<'_>, offset: usize, depth: u8) -> Option<()> {
        self.add(CoreProtocol::Udp, offset, header_len::UDP)?;
        self.set_l4_type(L4FrameType::Udp, depth);
        let src_port = view.u16_at(offset).ok()?;
        let dst_port = view.u16_at(offset + 2).ok()?;
        if let Some(ext) = self.extension.as_mut() {
            ext.dissect_ports(
                src_port,
                dst_port,
                view,
                offset + header_len::UDP,
                &mut self.records,
            );
        }
        Some(())
    }

    pub(super) fn dissect_sctp(&mut self, offset: usize, depth: u8) -> Option<()> {
        self.add(CoreProtocol::Sctp, offset, header_len::SCTP)?;
        self.set_l4_type(L4FrameType::Sctp, depth);
        Some(())
    }

    /// Records a GRE header sized from its flags and source routes, then dissects an IPv4 or IPv6
    /// payload.
    pub(super) fn dissect_gre(&mut self, view: &ByteView<'_>, offset: usize, depth: u8) -> Option<()> {
        let flags = view.u16_at(offset).ok()?;
        let protocol = view.u16_at(offset + 2).ok()?;
        let mut length = header_len::GRE;
        if flags & (gre_flags::CHECKSUM | gre_flags::ROUTING) != 0 {
            length += header_len::GRE_OPTIONAL_FIELD;
        }
        if flags & gre_flags::KEY != 0 {
            length += header_len::GRE_OPTIONAL_FIELD;
        }
        if flags & gre_flags::SEQUENCE != 0 {
            length += header_len::GRE_OPTIONAL_FIELD;
        }
        // Enhanced GRE (PPTP) carries an acknowledgment number.
        if flags & gre_flags::VERSION == 1 && flags & gre_flags::ACKNOWLEDGMENT != 0 {
            length += header_len::GRE_OPTIONAL_FIELD;
        }
        if flags & gre_flags::ROUTING != 0 {
            length += sre_list_len(view, offset + length)?;
        }
        self.add(CoreProtocol::Gre, offset, length)?;
        self.set_l4_type(L4FrameType::Gre, depth);

        let payload = offset + length;
        match protocol {
            ethertype::IPV4 => self.dissect_ipv4(view, payload, nested(depth)?),
            ethertype::IPV6 => self.dissect_ipv6(view, payload, nested(depth)?),
            _ => {
                log::trace!("Unrecognized GRE payload {:#06x}", protocol);
                None
            }
        }
    }

    pub(super) fn dissect_icmp4(&mut self, view: &ByteView<'_>, offset: usize, depth: u8) -> Option<()> {
        let (proto, length) = match view.u8_at(offset).ok()? {
            icmp4_type::ECHO_REQUEST => (CoreProtocol::Icmp4EchoRequest, header_len::ICMP4_ECHO),
            icmp4_type::ECHO_REPLY => (CoreProtocol::Icmp4EchoReply, header_len::ICMP4_ECHO),
            _ => (CoreProtocol::Icmp4, header_len::ICMP4),
        };
        self.add(proto, offset, length)?;
        self.set_l4_type(L4FrameType::Icmp4, depth);
        Some(())
    }

    /// Dissects an ICMPv6 message.
    ///
    /// Error messages re-enter L3 on the packet they quote. Neighbor-Discovery messages are
    /// followed by ND options. A Multicast Listener Report v2 is recorded first with its fixed
    /// header length and widened once its address records have been walked.
    pub(super) fn dissect_icmp6(&mut self, view: &ByteView<'_>, offset: usize, depth: u8) -> Option<()> {
        let kind = view.u8_at(offset).ok()?;
        match kind {
            icmp6_type::DESTINATION_UNREACHABLE
            | icmp6_type::TIME_EXCEEDED
            | icmp6_type::PARAMETER_PROBLEM => {
                let proto = match kind {
                    icmp6_type::DESTINATION_UNREACHABLE => CoreProtocol::Icmp6DestinationUnreachable,
                    icmp6_type::TIME_EXCEEDED => CoreProtocol::Icmp6TimeExceeded,
                    _ => CoreProtocol::Icmp6ParameterProblem,
                };
                self.add(proto, offset, header_len::ICMP6_ERROR)?;
                self.set_l4_type(L4FrameType::Icmp6, depth);
                self.dissect_embedded_ip(view, offset + header_len::ICMP6_ERROR, depth)
            }
            icmp6_type::ECHO_REQUEST => {
                self.add(CoreProtocol::Icmp6EchoRequest, offset, header_len::ICMP6_ECHO)?;
                self.set_l4_type(L4FrameType::Icmp6, depth);
                Some(())
            }
            icmp6_type::ECHO_REPLY => {
                self.add(CoreProtocol::Icmp6EchoReply, offset, header_len::ICMP6_ECHO)?;
                self.set_l4_type(L4FrameType::Icmp6, depth);
                Some(())
            }
            icmp6_type::ROUTER_SOLICITATION
            | icmp6_type::ROUTER_ADVERTISEMENT
            | icmp6_type::NEIGHBOR_SOLICITATION
            | icmp6_type::NEIGHBOR_ADVERTISEMENT => {
                let (proto, length) = match kind {
                    icmp6_type::ROUTER_SOLICITATION => (
                        CoreProtocol::Icmp6RouterSolicitation,
                        header_len::ICMP6_ROUTER_SOLICITATION,
                    ),
                    icmp6_type::ROUTER_ADVERTISEMENT => (
                        CoreProtocol::Icmp6RouterAdvertisement,
                        header_len::ICMP6_ROUTER_ADVERTISEMENT,
                    ),
                    icmp6_type::NEIGHBOR_SOLICITATION => (
                        CoreProtocol::Icmp6NeighborSolicitation,
                        header_len::ICMP6_NEIGHBOR_SOLICITATION,
                    ),
                    _ => (
                        CoreProtocol::Icmp6NeighborAdvertisement,
                        header_len::ICMP6_NEIGHBOR_ADVERTISEMENT,
                    ),
                };
                self.add(proto, offset, length)?;
                self.set_l4_type(L4FrameType::Icmp6, depth);
                self.dissect_nd_options(view, offset + length);
                Some(())
            }
            icmp6_type::MULTICAST_LISTENER_REPORT_V2 => {
                let index = self.add(
                    CoreProtocol::Icmp6MulticastListenerReportV2,
                    offset,
                    header_len::ICMP6_MLR_V2,
                )?;
                self.set_l4_type(L4FrameType::Icmp6, depth);
                let length = self.dissect_mcast_records(view, offset);
                self.records.update_length(index, length);
                Some(())
            }
            _ => {
                self.add(CoreProtocol::Icmp6, offset, header_len::ICMP6)?;
                self.set_l4_type(L4FrameType::Icmp6, depth);
                Some(())
            }
        }
    }
}

/// Length of an RFC 1701 Source Route Entry list starting at `start`, including the NULL entry
/// that terminates it.
fn sre_list_len(view: &ByteView<'_>, start: usize) -> Option<usize> {
    let mut offset = start;
    loop {
        let address_family = view.u16_at(offset).ok()?;
        let sre_length = view.u8_at(offset + 3).ok()? as usize;
        offset += header_len::GRE_SRE + sre_length;
        if address_family == 0 && sre_length == 0 {
            return Some(offset - start);
        }
    }
}
