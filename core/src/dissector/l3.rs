//! Network-layer stage: IPv4 with options, IPv6 with its extension header chain.

use super::{Dissector, L3FrameType, MAX_NESTING_DEPTH};
use crate::memory::view::ByteView;
use crate::protocols::constants::{header_len, ip_protocol};
use crate::protocols::id::{CoreProtocol, Ip4Option, Ip6Option};
use crate::protocols::packet::ipv4::{IPV4_FRAG_OFFSET, IPV4_MF};

/// Outcome of walking an IPv6 extension header chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Ip6Chain {
    /// Upper-layer protocol after the last extension header, or `No Next Header` if the chain was
    /// cut short.
    pub(super) next_header: u8,
    /// Offset of the first byte after the chain.
    pub(super) end: usize,
    /// `(more fragments, fragment offset)` of a Fragment header, if one was present.
    pub(super) fragment: Option<(bool, u16)>,
}

impl Dissector {
    /// Dissects an IPv4 header at `offset`. `depth` is `0` for the outermost IP header.
    pub(super) fn dissect_ipv4(
        &mut self,
        view: &ByteView<'_>,
        offset: usize,
        depth: u8,
    ) -> Option<()> {
        let version_ihl = view.u8_at(offset).ok()?;
        if version_ihl >> 4 != 4 {
            log::trace!("Expected IPv4 at {}, found version {}", offset, version_ihl >> 4);
            return None;
        }
        let ihl = (version_ihl & 0x0f) as usize * 4;
        if ihl < header_len::IPV4 {
            log::debug!("IPv4 header length {} below minimum at {}", ihl, offset);
            return None;
        }
        let flags_to_fragment_offset = view.u16_at(offset + 6).ok()?;
        let protocol = view.u8_at(offset + 9).ok()?;
        self.add(CoreProtocol::Ipv4, offset, ihl)?;

        let more_fragments = flags_to_fragment_offset & IPV4_MF != 0;
        let fragment_offset = flags_to_fragment_offset & IPV4_FRAG_OFFSET;
        if depth == 0 {
            self.l3_type = L3FrameType::Ipv4;
            self.set_fragment(more_fragments, fragment_offset);
        }

        if ihl > header_len::IPV4 {
            self.dissect_options(
                view,
                offset + header_len::IPV4,
                offset + ihl,
                |kind| Ip4Option::from_type(kind).map(Ip4Option::id),
            );
        }

        // Only the first fragment carries the upper-layer header.
        if fragment_offset > 0 {
            return Some(());
        }
        self.dissect_ip_protocol(view, protocol, offset + ihl, depth)
    }

    /// Dissects an IPv6 header at `offset` and its extension headers.
    ///
    /// The IPv6 Record is added with the fixed header length first and widened to cover the
    /// whole extension chain once its end is known.
    pub(super) fn dissect_ipv6(
        &mut self,
        view: &ByteView<'_>,
        offset: usize,
        depth: u8,
    ) -> Option<()> {
        let version = view.u8_at(offset).ok()? >> 4;
        if version != 6 {
            log::trace!("Expected IPv6 at {}, found version {}", offset, version);
            return None;
        }
        let next_header = view.u8_at(offset + 6).ok()?;
        let index = self.add(CoreProtocol::Ipv6, offset, header_len::IPV6)?;
        if depth == 0 {
            self.l3_type = L3FrameType::Ipv6;
        }

        let chain = self.dissect_ip6_extensions(view, next_header, offset + header_len::IPV6);
        self.records.update_length(index, chain.end - offset);

        let mut fragment_offset = 0;
        if let Some((more_fragments, frag_off)) = chain.fragment {
            if depth == 0 {
                self.set_fragment(more_fragments, frag_off);
            }
            fragment_offset = frag_off;
        }
        if fragment_offset > 0 {
            return Some(());
        }
        self.dissect_ip_protocol(view, chain.next_header, chain.end, depth)
    }

    /// Walks extension headers starting at `offset`, recording each one.
    pub(super) fn dissect_ip6_extensions(
        &mut self,
        view: &ByteView<'_>,
        mut next_header: u8,
        mut offset: usize,
    ) -> Ip6Chain {
        let mut fragment = None;
        while let Some(ext) = Ip6Option::from_next_header(next_header) {
            let parsed = match ext {
                Ip6Option::Fragment => self.dissect_ip6_fragment(view, offset),
                Ip6Option::EncapsulatingSecurityPayload => self
                    .add(ext, offset, header_len::IPV6_ESP)
                    .map(|_| (ip_protocol::NO_NEXT_HEADER, header_len::IPV6_ESP, None)),
                _ => self.dissect_ip6_generic(view, ext, offset),
            };
            match parsed {
                Some((next, length, frag)) => {
                    next_header = next;
                    offset += length;
                    if let Some((_, frag_off)) = frag {
                        fragment = frag;
                        // A non-first fragment carries payload, not headers.
                        if frag_off > 0 {
                            next_header = ip_protocol::NO_NEXT_HEADER;
                            break;
                        }
                    }
                }
                None => {
                    next_header = ip_protocol::NO_NEXT_HEADER;
                    break;
                }
            }
        }
        Ip6Chain {
            next_header,
            end: offset,
            fragment,
        }
    }

    /// Extension headers with a `(next header, length)` prefix.
    fn dissect_ip6_generic(
        &mut self,
        view: &ByteView<'_>,
        ext: Ip6Option,
        offset: usize,
    ) -> Option<(u8, usize, Option<(bool, u16)>)> {
        let next = view.u8_at(offset).ok()?;
        let len_field = view.u8_at(offset + 1).ok()? as usize;
        let length = match ext {
            // Authentication Header length is in 4-byte units, minus two.
            Ip6Option::Authentication => (len_field + 2) * 4,
            _ => (len_field + 1) * 8,
        };
        self.add(ext, offset, length)?;
        if ext == Ip6Option::HopByHop {
            self.dissect_hop_by_hop(view, offset + 2, offset + length);
        }
        Some((next, length, None))
    }

    fn dissect_ip6_fragment(
        &mut self,
        view: &ByteView<'_>,
        offset: usize,
    ) -> Option<(u8, usize, Option<(bool, u16)>)> {
        let next = view.u8_at(offset).ok()?;
        let offset_flags = view.u16_at(offset + 2).ok()?;
        self.add(Ip6Option::Fragment, offset, header_len::IPV6_FRAGMENT)?;
        let fragment_offset = offset_flags >> 3;
        let more_fragments = offset_flags & 0x0001 != 0;
        Some((
            next,
            header_len::IPV6_FRAGMENT,
            Some((more_fragments, fragment_offset)),
        ))
    }

    /// Dispatches on an IP protocol number found after IPv4 or the IPv6 extension chain.
    pub(super) fn dissect_ip_protocol(
        &mut self,
        view: &ByteView<'_>,
        protocol: u8,
        offset: usize,
        depth: u8,
    ) -> Option<()> {
        match protocol {
            ip_protocol::TCP => self.dissect_tcp(view, offset, depth),
            ip_protocol::UDP => self.dissect_udp(view, offset, depth),
            ip_protocol::ICMP => self.dissect_icmp4(view, offset, depth),
            ip_protocol::ICMPV6 => self.dissect_icmp6(view, offset, depth),
            ip_protocol::SCTP => self.dissect_sctp(offset, depth),
            ip_protocol::GRE => self.dissect_gre(view, offset, depth),
            ip_protocol::IPIP => {
                let depth = nested(depth)?;
                self.dissect_ipv4(view, offset, depth)
            }
            ip_protocol::IPV6 => {
                let depth = nested(depth)?;
                self.dissect_ipv6(view, offset, depth)
            }
            ip_protocol::NO_NEXT_HEADER => Some(()),
            _ => {
                let recognized = match self.extension.as_mut() {
                    Some(ext) => ext.dissect_ip_protocol(protocol, view, offset, &mut self.records),
                    None => false,
                };
                if !recognized {
                    log::trace!("Unrecognized IP protocol {} at {}", protocol, offset);
                }
                None
            }
        }
    }

    /// Re-enters L3 on an embedded packet, picking IPv4 or IPv6 from its version nibble.
    pub(super) fn dissect_embedded_ip(
        &mut self,
        view: &ByteView<'_>,
        offset: usize,
        depth: u8,
    ) -> Option<()> {
        let depth = nested(depth)?;
        match view.u8_at(offset).ok()? >> 4 {
            4 => self.dissect_ipv4(view, offset, depth),
            6 => self.dissect_ipv6(view, offset, depth),
            _ => None,
        }
    }
}

/// Returns the depth of a nested IP header, or `None` past the nesting limit.
#[inline]
pub(super) fn nested(depth: u8) -> Option<u8> {
    let depth = depth + 1;
    if depth >= MAX_NESTING_DEPTH {
        log::debug!("Nesting depth {} reached, not descending", depth);
        return None;
    }
    Some(depth)
}
