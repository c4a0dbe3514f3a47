//! Single-pass packet dissection.
//!
//! A [`Dissector`] walks a captured frame layer by layer (L2 → L3 → L4 → options), appending a
//! [`Record`] for every header it recognizes to a fixed-capacity [`RecordTable`]. When the walk is
//! done, the accumulated state can be serialized into a binary descriptor with
//! [`Dissector::write_descriptor`].
//!
//! Dissection is best-effort. A short capture, a malformed length field, or a full record table
//! ends the affected branch of the walk silently; the Records found so far remain valid. Only
//! caller contract violations (dissecting twice without a `reset`, a captured length larger than
//! the buffer, a too-small output buffer) are reported as errors.
//!
//! ## Remarks
//! A `Dissector` is stateful and meant to be owned by one thread and reused across packets. No
//! memory is allocated per packet.
//!
//! ```rust
//! use netdissect_core::dissector::Dissector;
//! use netdissect_core::protocols::id::CoreProtocol;
//!
//! let frame = hex::decode(
//!     "000c29340bde000c29c5f69b80350001080006040004000c29c5f69b0a01010a000c29340bde0a010164",
//! )
//! .unwrap();
//!
//! let mut dissector = Dissector::new();
//! dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
//! let (_, arp) = dissector.lookup(CoreProtocol::Arp, 0).unwrap();
//! assert_eq!((arp.offset, arp.length), (14, 28));
//! ```

mod l2;
mod l3;
mod l4;
mod options;
pub mod record;

use self::record::{Record, RecordTable};
use crate::config::{ByteOrderKind, DissectorConfig};
use crate::descriptor;
use crate::memory::view::ByteView;
use crate::protocols::id::ProtocolId;
use crate::stats::{StatExt, DISSECTED_BYTE, DISSECTED_PKT, UNRECOGNIZED_PKT};

use anyhow::{bail, Result};
use bitmask_enum::bitmask;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum depth of nested L3 dissection (tunnels and ICMPv6 error payloads).
pub const MAX_NESTING_DEPTH: u8 = 4;

/// Link-layer framing assumed for the first header of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatalinkType {
    /// Ethernet II, with 802.3/LLC/SNAP detected from the type/length field.
    Ethernet,
    /// 802.3 header immediately followed by an IPX header.
    NovellRaw,
}

/// Detected link-layer framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum L2FrameType {
    Unknown = 0,
    Ether = 1,
    Llc = 2,
    Snap = 3,
    NovellRaw = 4,
}

/// Outermost network-layer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum L3FrameType {
    None = 0,
    Ipv4 = 1,
    Ipv6 = 2,
}

/// Outermost transport-layer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum L4FrameType {
    None = 0,
    Tcp = 1,
    Udp = 2,
    Sctp = 3,
    Icmp4 = 4,
    Icmp6 = 5,
    Gre = 6,
}

macro_rules! frame_type_from_raw {
    ($ty:ident, $fallback:ident, [$($variant:ident),*]) => {
        impl $ty {
            /// Decodes a raw descriptor code. Unknown codes map to the fallback variant.
            pub fn from_raw(raw: u8) -> Self {
                $(
                    if raw == $ty::$variant as u8 {
                        return $ty::$variant;
                    }
                )*
                $ty::$fallback
            }
        }
    };
}

frame_type_from_raw!(L2FrameType, Unknown, [Ether, Llc, Snap, NovellRaw]);
frame_type_from_raw!(L3FrameType, None, [Ipv4, Ipv6]);
frame_type_from_raw!(L4FrameType, None, [Tcp, Udp, Sctp, Icmp4, Icmp6, Gre]);

/// Kind of the passthrough hash supplied with a packet. The dissector never computes hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HashType {
    None = 0,
    RoundRobin = 1,
    Tuple2 = 2,
    Tuple3 = 3,
    Tuple4 = 4,
    Tuple5 = 5,
}

frame_type_from_raw!(HashType, None, [RoundRobin, Tuple2, Tuple3, Tuple4, Tuple5]);

/// Transmit-control flags carried through to the descriptor.
#[bitmask(u8)]
#[bitmask_config(vec_debug)]
pub enum TxFlags {
    Now,
    Ignore,
    CrcOverride,
    SetClock,
}

/// IP fragmentation state of the outermost IP header.
#[bitmask(u8)]
#[bitmask_config(vec_debug)]
pub enum FragFlags {
    Fragment,
    LastFragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DissectorState {
    /// Reset, ready for the next packet.
    Idle,
    /// Holds the results for one packet.
    Dissected,
}

/// Hooks for protocol packs that recognize what the core engine does not.
///
/// Every hook receives the captured frame, the offset of the unrecognized bytes and the record
/// table of the current packet, and returns `true` if it recognized something. The default
/// implementations do nothing.
pub trait DissectorExtension {
    /// Called with an EtherType the L2 stage does not know.
    fn dissect_ethertype(
        &mut self,
        _ethertype: u16,
        _view: &ByteView<'_>,
        _offset: usize,
        _records: &mut RecordTable,
    ) -> bool {
        false
    }

    /// Called with an IP protocol number the L3 stage does not know.
    fn dissect_ip_protocol(
        &mut self,
        _protocol: u8,
        _view: &ByteView<'_>,
        _offset: usize,
        _records: &mut RecordTable,
    ) -> bool {
        false
    }

    /// Called after every UDP header with its ports; `offset` is the start of the UDP payload.
    fn dissect_ports(
        &mut self,
        _src_port: u16,
        _dst_port: u16,
        _view: &ByteView<'_>,
        _offset: usize,
        _records: &mut RecordTable,
    ) -> bool {
        false
    }
}

/// Reusable per-thread packet dissector.
pub struct Dissector {
    datalink: DatalinkType,
    default_bitmask: u64,
    byte_order: ByteOrderKind,
    extension: Option<Box<dyn DissectorExtension + Send>>,

    state: DissectorState,
    timestamp: u64,
    caplen: usize,
    wirelen: usize,
    rx_port: u8,
    tx_port: u8,
    tx_flags: TxFlags,
    hash: u32,
    hash_type: HashType,
    l2_type: L2FrameType,
    l3_type: L3FrameType,
    l4_type: L4FrameType,
    vlan_count: u8,
    mpls_count: u8,
    frag: FragFlags,
    records: RecordTable,
}

impl Dissector {
    /// Creates an Ethernet dissector with an empty default bitmask and native byte order.
    pub fn new() -> Self {
        Dissector::from_config(&DissectorConfig::default())
    }

    /// Creates a dissector configured from `config`.
    pub fn from_config(config: &DissectorConfig) -> Self {
        let mut dissector = Dissector {
            datalink: config.datalink,
            default_bitmask: config.default_bitmask,
            byte_order: config.byte_order,
            extension: None,
            state: DissectorState::Idle,
            timestamp: 0,
            caplen: 0,
            wirelen: 0,
            rx_port: 0,
            tx_port: 0,
            tx_flags: TxFlags::none(),
            hash: 0,
            hash_type: HashType::None,
            l2_type: L2FrameType::Unknown,
            l3_type: L3FrameType::None,
            l4_type: L4FrameType::None,
            vlan_count: 0,
            mpls_count: 0,
            frag: FragFlags::none(),
            records: RecordTable::new(),
        };
        dissector.reset();
        dissector
    }

    /// Clears all per-packet state.
    pub fn reset(&mut self) {
        self.state = DissectorState::Idle;
        self.timestamp = 0;
        self.caplen = 0;
        self.wirelen = 0;
        self.rx_port = 0;
        self.tx_port = 0;
        self.tx_flags = TxFlags::none();
        self.hash = 0;
        self.hash_type = HashType::None;
        self.l2_type = L2FrameType::Unknown;
        self.l3_type = L3FrameType::None;
        self.l4_type = L4FrameType::None;
        self.vlan_count = 0;
        self.mpls_count = 0;
        self.frag = FragFlags::none();
        self.records.reset(0, self.default_bitmask);
    }

    /// Selects the link-layer framing of subsequent packets.
    pub fn set_datalink_type(&mut self, datalink: DatalinkType) {
        self.datalink = datalink;
    }

    /// Sets the bitmask every packet starts from.
    pub fn set_default_bitmask(&mut self, bitmask: u64) {
        self.default_bitmask = bitmask;
    }

    /// Sets the byte order used by [`Dissector::write_descriptor`].
    pub fn set_byte_order(&mut self, byte_order: ByteOrderKind) {
        self.byte_order = byte_order;
    }

    /// Installs the hooks consulted for unrecognized EtherTypes, IP protocols and UDP ports.
    pub fn set_extension(&mut self, extension: Box<dyn DissectorExtension + Send>) {
        self.extension = Some(extension);
    }

    /// Sets the receive and transmit ports of the current packet.
    pub fn set_ports(&mut self, rx_port: u8, tx_port: u8) {
        self.rx_port = rx_port;
        self.tx_port = tx_port;
    }

    /// Sets the transmit-control flags of the current packet.
    pub fn set_tx_flags(&mut self, flags: TxFlags) {
        self.tx_flags = flags;
    }

    /// Sets the passthrough hash of the current packet. Only the low 24 bits are kept.
    pub fn set_hash(&mut self, hash: u32, hash_type: HashType) {
        self.hash = hash & 0x00FF_FFFF;
        self.hash_type = hash_type;
    }

    /// Dissects the first `caplen` bytes of `packet`.
    ///
    /// Returns `caplen` if at least the link layer was recognized and `0` otherwise. Errors if
    /// the previous packet was not followed by [`Dissector::reset`], if `caplen` exceeds the
    /// buffer, or if either length does not fit 16 bits.
    pub fn dissect(
        &mut self,
        packet: &[u8],
        timestamp: u64,
        caplen: usize,
        wirelen: usize,
    ) -> Result<usize> {
        if self.state != DissectorState::Idle {
            log::warn!("dissect called without reset");
            bail!(DissectError::NotReset);
        }
        if caplen > u16::MAX as usize {
            log::warn!("Captured length {} exceeds {}", caplen, u16::MAX);
            bail!(DissectError::InvalidArgument(format!(
                "captured length {} exceeds {}",
                caplen,
                u16::MAX
            )));
        }
        if wirelen > u16::MAX as usize {
            log::warn!("Wire length {} exceeds {}", wirelen, u16::MAX);
            bail!(DissectError::InvalidArgument(format!(
                "wire length {} exceeds {}",
                wirelen,
                u16::MAX
            )));
        }
        let view = match ByteView::with_len(packet, caplen) {
            Ok(view) => view,
            Err(_) => {
                log::warn!("Captured length {} exceeds buffer of {}", caplen, packet.len());
                bail!(DissectError::InvalidArgument(format!(
                    "captured length {} exceeds buffer of {} bytes",
                    caplen,
                    packet.len()
                )))
            }
        };

        self.state = DissectorState::Dissected;
        self.timestamp = timestamp;
        self.caplen = caplen;
        self.wirelen = wirelen;
        self.records.reset(caplen, self.default_bitmask);

        DISSECTED_PKT.inc();
        DISSECTED_BYTE.inc_by(caplen as u64);

        if self.dissect_l2(&view) {
            Ok(caplen)
        } else {
            UNRECOGNIZED_PKT.inc();
            Ok(0)
        }
    }

    /// Serializes the current packet's state into `out` using the configured byte order.
    ///
    /// Returns the number of bytes written, always the full descriptor length.
    pub fn write_descriptor(&self, out: &mut [u8]) -> Result<usize> {
        match self.byte_order {
            ByteOrderKind::Big => self.write_descriptor_with::<BigEndian>(out),
            ByteOrderKind::Little => self.write_descriptor_with::<LittleEndian>(out),
        }
    }

    /// Serializes the current packet's state into `out` in byte order `B`.
    pub fn write_descriptor_with<B: ByteOrder>(&self, out: &mut [u8]) -> Result<usize> {
        if self.state != DissectorState::Dissected {
            bail!(DissectError::NoPacket);
        }
        descriptor::write_type2::<B>(self, out)
    }

    /// Appends a Record for the current packet.
    #[inline]
    fn add(&mut self, id: impl Into<ProtocolId>, offset: usize, length: usize) -> Option<usize> {
        self.records.add(id, offset, length)
    }

    fn set_fragment(&mut self, more_fragments: bool, fragment_offset: u16) {
        if more_fragments || fragment_offset > 0 {
            self.frag |= FragFlags::Fragment;
        }
        if !more_fragments && fragment_offset > 0 {
            self.frag |= FragFlags::LastFragment;
        }
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    #[inline]
    pub fn captured_length(&self) -> usize {
        self.caplen
    }

    #[inline]
    pub fn wire_length(&self) -> usize {
        self.wirelen
    }

    #[inline]
    pub fn rx_port(&self) -> u8 {
        self.rx_port
    }

    #[inline]
    pub fn tx_port(&self) -> u8 {
        self.tx_port
    }

    #[inline]
    pub fn tx_flags(&self) -> TxFlags {
        self.tx_flags
    }

    /// Returns the 24-bit passthrough hash and its kind.
    #[inline]
    pub fn hash(&self) -> (u32, HashType) {
        (self.hash, self.hash_type)
    }

    #[inline]
    pub fn l2_frame_type(&self) -> L2FrameType {
        self.l2_type
    }

    #[inline]
    pub fn l3_frame_type(&self) -> L3FrameType {
        self.l3_type
    }

    #[inline]
    pub fn l4_frame_type(&self) -> L4FrameType {
        self.l4_type
    }

    /// Number of 802.1Q/802.1ad tags.
    #[inline]
    pub fn vlan_count(&self) -> u8 {
        self.vlan_count
    }

    /// Number of MPLS label stack entries.
    #[inline]
    pub fn mpls_count(&self) -> u8 {
        self.mpls_count
    }

    #[inline]
    pub fn frag_flags(&self) -> FragFlags {
        self.frag
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.frag.contains(FragFlags::Fragment)
    }

    #[inline]
    pub fn is_last_fragment(&self) -> bool {
        self.frag.contains(FragFlags::LastFragment)
    }

    /// Records of the current packet.
    #[inline]
    pub fn records(&self) -> &RecordTable {
        &self.records
    }

    /// Protocol-seen bitmask of the current packet.
    #[inline]
    pub fn bitmask(&self) -> u64 {
        self.records.bitmask()
    }

    /// Returns the index and Record of the `depth`-th header with id `id`.
    pub fn lookup(&self, id: impl Into<ProtocolId>, depth: usize) -> Option<(usize, Record)> {
        self.records.lookup(id, depth)
    }
}

impl Default for Dissector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DissectError {
    #[error("Dissector must be reset before the next packet")]
    NotReset,

    #[error("No packet dissected since the last reset")]
    NoPacket,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}


#[cfg(test)]
mod tests {
    use super::testing::spans;
    use super::*;
    use crate::descriptor::type2::TYPE2_LEN;
    use crate::protocols::id::CoreProtocol;

    const RARP: &str =
        "000c29340bde000c29c5f69b80350001080006040004000c29c5f69b0a01010a000c29340bde0a010164";

    #[test]
    fn core_dissect_requires_reset() {
        let frame = hex::decode(RARP).unwrap();
        let mut dissector = Dissector::new();
        assert_eq!(dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap(), 42);
        let err = dissector
            .dissect(&frame, 0, frame.len(), frame.len())
            .unwrap_err();
        assert_eq!(err.downcast_ref::<DissectError>(), Some(&DissectError::NotReset));
        dissector.reset();
        assert!(dissector.dissect(&frame, 0, frame.len(), frame.len()).is_ok());
    }

    #[test]
    fn core_dissect_rejects_bad_lengths() {
        let frame = hex::decode(RARP).unwrap();
        let mut dissector = Dissector::new();
        let err = dissector.dissect(&frame, 0, frame.len() + 1, 60).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DissectError>(),
            Some(DissectError::InvalidArgument(_))
        ));
        let big = vec![0u8; 70_000];
        assert!(dissector.dissect(&big, 0, big.len(), big.len()).is_err());
        // Rejected calls leave the dissector idle.
        assert!(dissector.dissect(&frame, 0, frame.len(), frame.len()).is_ok());
    }

    #[test]
    fn core_dissect_rejects_oversized_wire_length() {
        let frame = hex::decode(RARP).unwrap();
        let mut dissector = Dissector::new();
        let err = dissector.dissect(&frame, 0, frame.len(), 70_000).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DissectError>(),
            Some(DissectError::InvalidArgument(_))
        ));

        dissector.dissect(&frame, 0, frame.len(), 65_535).unwrap();
        let mut buf = [0u8; TYPE2_LEN];
        dissector.write_descriptor(&mut buf).unwrap();
        let view = crate::descriptor::DescriptorView::<byteorder::NativeEndian>::new(
            &buf,
            crate::descriptor::DescriptorType::Type2,
        )
        .unwrap();
        assert_eq!(view.wire_length(), 65_535);
    }

    #[test]
    fn core_dissect_truncated_capture() {
        let frame = hex::decode(RARP).unwrap();
        let mut dissector = Dissector::new();
        assert_eq!(dissector.dissect(&frame, 0, 30, frame.len()).unwrap(), 30);
        assert_eq!(spans(&dissector), vec![("ethernet", 0, 14)]);
        for record in dissector.records().iter() {
            assert!(record.end() <= dissector.captured_length());
        }
    }

    #[test]
    fn core_write_requires_packet() {
        let mut dissector = Dissector::new();
        let mut buf = [0u8; TYPE2_LEN];
        let err = dissector.write_descriptor(&mut buf).unwrap_err();
        assert_eq!(err.downcast_ref::<DissectError>(), Some(&DissectError::NoPacket));

        let frame = hex::decode(RARP).unwrap();
        dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
        assert_eq!(dissector.write_descriptor(&mut buf).unwrap(), TYPE2_LEN);
        assert_eq!(dissector.write_descriptor(&mut buf).unwrap(), TYPE2_LEN);
        dissector.reset();
        assert!(dissector.write_descriptor(&mut buf).is_err());
    }

    #[test]
    fn core_reset_idempotence() {
        let frame = hex::decode(RARP).unwrap();
        let mut dissector = Dissector::new();
        let mut first = [0u8; TYPE2_LEN];
        let mut second = [0u8; TYPE2_LEN];
        dissector.dissect(&frame, 9, frame.len(), frame.len()).unwrap();
        dissector.write_descriptor(&mut first).unwrap();
        dissector.reset();
        dissector.dissect(&frame, 9, frame.len(), frame.len()).unwrap();
        dissector.write_descriptor(&mut second).unwrap();
        assert_eq!(first[..], second[..]);
    }

    #[test]
    fn core_default_bitmask_applied_on_reset() {
        let frame = hex::decode(RARP).unwrap();
        let mut dissector = Dissector::new();
        dissector.set_default_bitmask(1 << 63);
        dissector.reset();
        dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
        assert_eq!(
            dissector.bitmask(),
            (1 << 63) | CoreProtocol::Ethernet.mask() | CoreProtocol::Arp.mask()
        );
    }

    #[test]
    fn core_frame_type_codes_round_trip() {
        for raw in 0..=6u8 {
            assert_eq!(L4FrameType::from_raw(raw) as u8, raw);
        }
        assert_eq!(L2FrameType::from_raw(200), L2FrameType::Unknown);
        assert_eq!(HashType::from_raw(5), HashType::Tuple5);
    }
}
