//! Numeric protocol identifiers and fixed header lengths used while walking a frame.

/// EtherType values (and the 802.3 length/type boundary).
pub mod ethertype {
    /// Values at or above this are EtherTypes, values below are 802.3 lengths.
    pub const MIN_ETHERTYPE: u16 = 0x0600;
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const RARP: u16 = 0x8035;
    pub const VLAN_802_1Q: u16 = 0x8100;
    pub const IPX: u16 = 0x8137;
    pub const IPV6: u16 = 0x86DD;
    pub const MPLS_UNICAST: u16 = 0x8847;
    pub const MPLS_MULTICAST: u16 = 0x8848;
    pub const VLAN_802_1AD: u16 = 0x88A8;
    pub const VLAN_9100: u16 = 0x9100;
}

/// 802.2 LLC service access points and control values.
pub mod llc {
    pub const SAP_SNAP: u8 = 0xAA;
    pub const SAP_IPX: u8 = 0xE0;
    pub const SAP_STP: u8 = 0x42;
    /// Unnumbered Information.
    pub const CONTROL_UI: u8 = 0x03;
    /// Low two control bits set for U-format frames; I/S frames use a 2-byte control field.
    pub const CONTROL_U_FORMAT: u8 = 0x03;
    /// First two bytes of a Novell "raw" 802.3 frame (IPX checksum field).
    pub const NOVELL_RAW_MARKER: u16 = 0xFFFF;
}

/// Spanning-tree BPDU types.
pub mod bpdu {
    pub const CONFIGURATION: u8 = 0x00;
    pub const RAPID: u8 = 0x02;
    pub const TOPOLOGY_CHANGE: u8 = 0x80;
}

/// IANA IP protocol numbers, shared by the IPv4 protocol field and IPv6 next-header chain.
pub mod ip_protocol {
    pub const HOP_BY_HOP: u8 = 0;
    pub const ICMP: u8 = 1;
    pub const IPIP: u8 = 4;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const IPV6: u8 = 41;
    pub const ROUTING: u8 = 43;
    pub const FRAGMENT: u8 = 44;
    pub const GRE: u8 = 47;
    pub const ESP: u8 = 50;
    pub const AH: u8 = 51;
    pub const ICMPV6: u8 = 58;
    pub const NO_NEXT_HEADER: u8 = 59;
    pub const DESTINATION: u8 = 60;
    pub const SCTP: u8 = 132;
    pub const MOBILITY: u8 = 135;
    pub const HIP: u8 = 139;
    pub const SHIM6: u8 = 140;
}

/// IPv4 option types (full type octet: copied flag, class and number).
pub mod ip4_option {
    pub const END_OF_LIST: u8 = 0;
    pub const NOP: u8 = 1;
    pub const RECORD_ROUTE: u8 = 7;
    pub const MTU_PROBE: u8 = 11;
    pub const MTU_REPLY: u8 = 12;
    pub const TIMESTAMP: u8 = 68;
    pub const TRACEROUTE: u8 = 82;
    pub const SECURITY: u8 = 130;
    pub const LOOSE_SOURCE_ROUTE: u8 = 131;
    pub const EXTENDED_SECURITY: u8 = 133;
    pub const CIPSO: u8 = 134;
    pub const STREAM_ID: u8 = 136;
    pub const STRICT_SOURCE_ROUTE: u8 = 137;
    pub const ROUTER_ALERT: u8 = 148;
}

/// IPv6 Hop-by-Hop TLV option types.
pub mod ip6_option {
    pub const PAD1: u8 = 0x00;
    pub const PADN: u8 = 0x01;
    pub const TUNNEL_ENCAP_LIMIT: u8 = 0x04;
    pub const ROUTER_ALERT: u8 = 0x05;
    pub const CALIPSO: u8 = 0x07;
    pub const QUICK_START: u8 = 0x26;
    pub const JUMBO_PAYLOAD: u8 = 0xC2;
}

/// TCP option kinds.
pub mod tcp_option {
    pub const END_OF_LIST: u8 = 0;
    pub const NOP: u8 = 1;
    pub const MSS: u8 = 2;
    pub const WINDOW_SCALE: u8 = 3;
    pub const SACK_PERMITTED: u8 = 4;
    pub const SACK: u8 = 5;
    pub const TIMESTAMP: u8 = 8;
    pub const FAST_OPEN: u8 = 34;
}

/// ICMPv4 message types.
pub mod icmp4_type {
    pub const ECHO_REPLY: u8 = 0;
    pub const ECHO_REQUEST: u8 = 8;
}

/// ICMPv6 message types.
pub mod icmp6_type {
    pub const DESTINATION_UNREACHABLE: u8 = 1;
    pub const TIME_EXCEEDED: u8 = 3;
    pub const PARAMETER_PROBLEM: u8 = 4;
    pub const ECHO_REQUEST: u8 = 128;
    pub const ECHO_REPLY: u8 = 129;
    pub const ROUTER_SOLICITATION: u8 = 133;
    pub const ROUTER_ADVERTISEMENT: u8 = 134;
    pub const NEIGHBOR_SOLICITATION: u8 = 135;
    pub const NEIGHBOR_ADVERTISEMENT: u8 = 136;
    pub const MULTICAST_LISTENER_REPORT_V2: u8 = 143;
}

/// ICMPv6 Neighbor-Discovery option types.
pub mod nd_option {
    pub const SOURCE_LINK_LAYER_ADDRESS: u8 = 1;
    pub const TARGET_LINK_LAYER_ADDRESS: u8 = 2;
    pub const PREFIX_INFORMATION: u8 = 3;
    pub const REDIRECTED_HEADER: u8 = 4;
    pub const MTU: u8 = 5;
    pub const ROUTE_INFORMATION: u8 = 24;
    pub const RECURSIVE_DNS_SERVER: u8 = 25;
    pub const DNS_SEARCH_LIST: u8 = 31;
}

/// MLDv2 multicast address record types.
pub mod mcast_record {
    pub const MODE_IS_INCLUDE: u8 = 1;
    pub const MODE_IS_EXCLUDE: u8 = 2;
    pub const CHANGE_TO_INCLUDE: u8 = 3;
    pub const CHANGE_TO_EXCLUDE: u8 = 4;
    pub const ALLOW_NEW_SOURCES: u8 = 5;
    pub const BLOCK_OLD_SOURCES: u8 = 6;
}

/// GRE flag bits in the first 16-bit word.
pub mod gre_flags {
    pub const CHECKSUM: u16 = 0x8000;
    pub const ROUTING: u16 = 0x4000;
    pub const KEY: u16 = 0x2000;
    pub const SEQUENCE: u16 = 0x1000;
    pub const ACKNOWLEDGMENT: u16 = 0x0080;
    pub const VERSION: u16 = 0x0007;
}

/// Fixed header lengths in bytes.
pub mod header_len {
    pub const ETHERNET: usize = 14;
    pub const VLAN: usize = 4;
    pub const MPLS: usize = 4;
    pub const LLC: usize = 3;
    pub const LLC_EXTENDED: usize = 4;
    pub const SNAP: usize = 5;
    pub const IPX: usize = 30;
    pub const ARP_FIXED: usize = 8;
    pub const STP_CONFIGURATION: usize = 35;
    pub const STP_TOPOLOGY_CHANGE: usize = 4;
    pub const STP_RAPID: usize = 36;
    pub const IPV4: usize = 20;
    pub const IPV6: usize = 40;
    pub const IPV6_FRAGMENT: usize = 8;
    pub const IPV6_ESP: usize = 8;
    pub const TCP: usize = 20;
    pub const UDP: usize = 8;
    pub const SCTP: usize = 12;
    pub const GRE: usize = 4;
    pub const GRE_OPTIONAL_FIELD: usize = 4;
    /// Fixed part of a GRE Source Route Entry: address family, SRE offset and SRE length.
    pub const GRE_SRE: usize = 4;
    pub const ICMP4: usize = 4;
    pub const ICMP4_ECHO: usize = 8;
    pub const ICMP6: usize = 4;
    pub const ICMP6_ECHO: usize = 8;
    pub const ICMP6_ERROR: usize = 8;
    pub const ICMP6_ROUTER_SOLICITATION: usize = 8;
    pub const ICMP6_ROUTER_ADVERTISEMENT: usize = 16;
    pub const ICMP6_NEIGHBOR_SOLICITATION: usize = 24;
    pub const ICMP6_NEIGHBOR_ADVERTISEMENT: usize = 24;
    pub const ICMP6_MLR_V2: usize = 8;
    pub const MCAST_ADDRESS_RECORD: usize = 20;
    pub const IPV6_ADDRESS: usize = 16;
}
