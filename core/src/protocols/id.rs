//! Protocol identifiers.
//!
//! A [`ProtocolId`] combines a [`Pack`] (protocol family) with an ordinal inside that pack. Every
//! Record written by the dissector carries one. The encoding is fixed:
//!
//! ```text
//!  15            8 7             0
//! +---------------+---------------+
//! |     pack      |    ordinal    |
//! +---------------+---------------+
//! ```
//!
//! so any id also fits the 16-bit id of a
//! [`CompactDescriptor`](crate::dissector::record::CompactDescriptor).

use crate::protocols::constants::*;

use std::collections::HashMap;
use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

/// Bit position of the pack inside a [`ProtocolId`].
pub const PACK_SHIFT: u32 = 8;
/// Mask of the pack after shifting.
pub const PACK_MASK: u32 = 0xFF;
/// Mask of the intra-pack ordinal.
pub const ORDINAL_MASK: u32 = 0xFF;

/// A protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Pack {
    Core = 0,
    Ip4Option = 1,
    Ip6Option = 2,
    TcpOption = 3,
    Icmp6Option = 4,
}

impl Pack {
    /// Returns the pack with ordinal `ordinal`, if any.
    pub fn from_ordinal(ordinal: u8) -> Option<Pack> {
        Pack::iter().find(|p| *p as u8 == ordinal)
    }
}

/// Identifies one kind of header (or option) that may appear in a Record.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolId(u32);

impl ProtocolId {
    /// Encodes `(pack, ordinal)`.
    #[inline]
    pub const fn new(pack: Pack, ordinal: u8) -> Self {
        ProtocolId(((pack as u32) << PACK_SHIFT) | ordinal as u32)
    }

    /// Wraps a raw id, for example one read back from a descriptor.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ProtocolId(raw)
    }

    /// Returns the raw integer id.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the pack ordinal bits.
    #[inline]
    pub const fn pack_ordinal(self) -> u8 {
        ((self.0 >> PACK_SHIFT) & PACK_MASK) as u8
    }

    /// Returns the pack, or `None` if the pack ordinal is not a known pack.
    #[inline]
    pub fn pack(self) -> Option<Pack> {
        Pack::from_ordinal(self.pack_ordinal())
    }

    /// Returns the ordinal within the pack.
    #[inline]
    pub const fn ordinal(self) -> u8 {
        (self.0 & ORDINAL_MASK) as u8
    }

    /// Returns `true` if this id belongs to the core pack.
    #[inline]
    pub const fn is_core(self) -> bool {
        self.0 >> PACK_SHIFT == Pack::Core as u32
    }

    /// Returns the snake_case name of the protocol, or `"unknown"`.
    pub fn name(self) -> &'static str {
        PROTOCOL_NAMES.get(&self).copied().unwrap_or("unknown")
    }
}

impl fmt::Debug for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#06x})", self.name(), self.0)
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! pack_ids {
    ($ty:ty, $pack:expr) => {
        impl $ty {
            /// Returns the protocol id of this variant.
            #[inline]
            pub const fn id(self) -> ProtocolId {
                ProtocolId::new($pack, self as u8)
            }
        }

        impl From<$ty> for ProtocolId {
            fn from(item: $ty) -> Self {
                item.id()
            }
        }
    };
}

/// Core-pack protocols. Ordinals index the protocol-seen bitmask and must stay below 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum CoreProtocol {
    Ethernet = 0,
    Llc,
    Snap,
    Vlan,
    Mpls,
    Arp,
    Ipx,
    Stp,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Sctp,
    Gre,
    Icmp4,
    Icmp4EchoRequest,
    Icmp4EchoReply,
    Icmp6,
    Icmp6EchoRequest,
    Icmp6EchoReply,
    Icmp6DestinationUnreachable,
    Icmp6TimeExceeded,
    Icmp6ParameterProblem,
    Icmp6RouterSolicitation,
    Icmp6RouterAdvertisement,
    Icmp6NeighborSolicitation,
    Icmp6NeighborAdvertisement,
    Icmp6MulticastListenerReportV2,
}
pack_ids!(CoreProtocol, Pack::Core);

impl CoreProtocol {
    /// Returns the bit this protocol occupies in the protocol-seen bitmask.
    #[inline]
    pub const fn mask(self) -> u64 {
        1u64 << (self as u8)
    }
}

/// IPv4 options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Ip4Option {
    EndOfList = 0,
    Nop,
    RecordRoute,
    MtuProbe,
    MtuReply,
    Timestamp,
    Traceroute,
    Security,
    LooseSourceRoute,
    ExtendedSecurity,
    Cipso,
    StreamId,
    StrictSourceRoute,
    RouterAlert,
}
pack_ids!(Ip4Option, Pack::Ip4Option);

impl Ip4Option {
    /// Maps an IPv4 option type octet to its variant.
    pub fn from_type(kind: u8) -> Option<Self> {
        use ip4_option::*;
        let option = match kind {
            END_OF_LIST => Ip4Option::EndOfList,
            NOP => Ip4Option::Nop,
            RECORD_ROUTE => Ip4Option::RecordRoute,
            MTU_PROBE => Ip4Option::MtuProbe,
            MTU_REPLY => Ip4Option::MtuReply,
            TIMESTAMP => Ip4Option::Timestamp,
            TRACEROUTE => Ip4Option::Traceroute,
            SECURITY => Ip4Option::Security,
            LOOSE_SOURCE_ROUTE => Ip4Option::LooseSourceRoute,
            EXTENDED_SECURITY => Ip4Option::ExtendedSecurity,
            CIPSO => Ip4Option::Cipso,
            STREAM_ID => Ip4Option::StreamId,
            STRICT_SOURCE_ROUTE => Ip4Option::StrictSourceRoute,
            ROUTER_ALERT => Ip4Option::RouterAlert,
            _ => return None,
        };
        Some(option)
    }
}

/// IPv6 extension headers and Hop-by-Hop TLV options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Ip6Option {
    HopByHop = 0,
    Routing,
    Fragment,
    DestinationOptions,
    Authentication,
    EncapsulatingSecurityPayload,
    Mobility,
    HostIdentity,
    Shim6,
    Pad1 = 32,
    PadN,
    TunnelEncapLimit,
    RouterAlert,
    Calipso,
    QuickStart,
    JumboPayload,
}
pack_ids!(Ip6Option, Pack::Ip6Option);

impl Ip6Option {
    /// Maps an IPv6 next-header value to its extension header, if it is one.
    pub fn from_next_header(next_header: u8) -> Option<Self> {
        use ip_protocol::*;
        let option = match next_header {
            HOP_BY_HOP => Ip6Option::HopByHop,
            ROUTING => Ip6Option::Routing,
            FRAGMENT => Ip6Option::Fragment,
            DESTINATION => Ip6Option::DestinationOptions,
            AH => Ip6Option::Authentication,
            ESP => Ip6Option::EncapsulatingSecurityPayload,
            MOBILITY => Ip6Option::Mobility,
            HIP => Ip6Option::HostIdentity,
            SHIM6 => Ip6Option::Shim6,
            _ => return None,
        };
        Some(option)
    }

    /// Maps a Hop-by-Hop option type to its variant.
    pub fn from_tlv_type(kind: u8) -> Option<Self> {
        use ip6_option::*;
        let option = match kind {
            PAD1 => Ip6Option::Pad1,
            PADN => Ip6Option::PadN,
            TUNNEL_ENCAP_LIMIT => Ip6Option::TunnelEncapLimit,
            ROUTER_ALERT => Ip6Option::RouterAlert,
            CALIPSO => Ip6Option::Calipso,
            QUICK_START => Ip6Option::QuickStart,
            JUMBO_PAYLOAD => Ip6Option::JumboPayload,
            _ => return None,
        };
        Some(option)
    }
}

/// TCP options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum TcpOption {
    EndOfList = 0,
    Nop,
    Mss,
    WindowScale,
    SackPermitted,
    Sack,
    Timestamp,
    FastOpen,
}
pack_ids!(TcpOption, Pack::TcpOption);

impl TcpOption {
    /// Maps a TCP option kind to its variant.
    pub fn from_kind(kind: u8) -> Option<Self> {
        use tcp_option::*;
        let option = match kind {
            END_OF_LIST => TcpOption::EndOfList,
            NOP => TcpOption::Nop,
            MSS => TcpOption::Mss,
            WINDOW_SCALE => TcpOption::WindowScale,
            SACK_PERMITTED => TcpOption::SackPermitted,
            SACK => TcpOption::Sack,
            TIMESTAMP => TcpOption::Timestamp,
            FAST_OPEN => TcpOption::FastOpen,
            _ => return None,
        };
        Some(option)
    }
}

/// ICMPv6 Neighbor-Discovery options and MLDv2 multicast address records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Icmp6Option {
    SourceLinkLayerAddress = 0,
    TargetLinkLayerAddress,
    PrefixInformation,
    RedirectedHeader,
    Mtu,
    RouteInformation,
    RecursiveDnsServer,
    DnsSearchList,
    McastAddressRecord = 32,
    ModeIsInclude,
    ModeIsExclude,
    ChangeToInclude,
    ChangeToExclude,
    AllowNewSources,
    BlockOldSources,
}
pack_ids!(Icmp6Option, Pack::Icmp6Option);

impl Icmp6Option {
    /// Maps a Neighbor-Discovery option type to its variant.
    pub fn from_nd_type(kind: u8) -> Option<Self> {
        use nd_option::*;
        let option = match kind {
            SOURCE_LINK_LAYER_ADDRESS => Icmp6Option::SourceLinkLayerAddress,
            TARGET_LINK_LAYER_ADDRESS => Icmp6Option::TargetLinkLayerAddress,
            PREFIX_INFORMATION => Icmp6Option::PrefixInformation,
            REDIRECTED_HEADER => Icmp6Option::RedirectedHeader,
            MTU => Icmp6Option::Mtu,
            ROUTE_INFORMATION => Icmp6Option::RouteInformation,
            RECURSIVE_DNS_SERVER => Icmp6Option::RecursiveDnsServer,
            DNS_SEARCH_LIST => Icmp6Option::DnsSearchList,
            _ => return None,
        };
        Some(option)
    }

    /// Maps an MLDv2 record type to its variant. Unknown types resolve to the generic
    /// [`Icmp6Option::McastAddressRecord`].
    pub fn from_mcast_record_type(kind: u8) -> Self {
        use mcast_record::*;
        match kind {
            MODE_IS_INCLUDE => Icmp6Option::ModeIsInclude,
            MODE_IS_EXCLUDE => Icmp6Option::ModeIsExclude,
            CHANGE_TO_INCLUDE => Icmp6Option::ChangeToInclude,
            CHANGE_TO_EXCLUDE => Icmp6Option::ChangeToExclude,
            ALLOW_NEW_SOURCES => Icmp6Option::AllowNewSources,
            BLOCK_OLD_SOURCES => Icmp6Option::BlockOldSources,
            _ => Icmp6Option::McastAddressRecord,
        }
    }
}

lazy_static! {
    /// Names of every known protocol id.
    static ref PROTOCOL_NAMES: HashMap<ProtocolId, &'static str> = {
        let mut names = HashMap::new();
        names.extend(CoreProtocol::iter().map(|p| (p.id(), <&'static str>::from(p))));
        names.extend(Ip4Option::iter().map(|p| (p.id(), <&'static str>::from(p))));
        names.extend(Ip6Option::iter().map(|p| (p.id(), <&'static str>::from(p))));
        names.extend(TcpOption::iter().map(|p| (p.id(), <&'static str>::from(p))));
        names.extend(Icmp6Option::iter().map(|p| (p.id(), <&'static str>::from(p))));
        names
    };
}

/// Returns every protocol id known to the crate.
pub fn known_ids() -> impl Iterator<Item = ProtocolId> {
    PROTOCOL_NAMES.keys().copied()
}
