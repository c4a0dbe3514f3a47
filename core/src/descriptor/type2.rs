//! Type2 descriptor layout.
//!
//! ```text
//!  0               8       10  11  12      14  15  16  17  18  19          22  23  24
//! +---------------+-------+---+---+-------+---+---+---+---+---+-----------+---+---+
//! |   timestamp   |caplen |rx |tx |wirelen|txf|l2 |hty|cnt|frg|  hash24   |l3 |l4 |
//! +---------------+-------+---+---+-------+---+---+---+---+---+-----------+---+---+
//! |            bitmask (24..32)           |     32 record slots (32..288)         |
//! +---------------------------------------+---------------------------------------+
//! ```

use super::{DescriptorError, DescriptorType};
use crate::dissector::record::{find_record, CompactDescriptor, Record, MAX_RECORDS};
use crate::dissector::{
    Dissector, FragFlags, HashType, L2FrameType, L3FrameType, L4FrameType, TxFlags,
};
use crate::protocols::id::ProtocolId;
use crate::protocols::packet::Header;

use std::marker::PhantomData;

use anyhow::{bail, Result};
use byteorder::ByteOrder;

pub const TIMESTAMP: usize = 0;
pub const CAPTURED_LENGTH: usize = 8;
pub const RX_PORT: usize = 10;
pub const TX_PORT: usize = 11;
pub const WIRE_LENGTH: usize = 12;
pub const TX_FLAGS: usize = 14;
pub const L2_FRAME_TYPE: usize = 15;
pub const HASH_TYPE: usize = 16;
pub const RECORD_COUNT: usize = 17;
pub const FRAG_FLAGS: usize = 18;
pub const HASH24: usize = 19;
pub const L3_FRAME_TYPE: usize = 22;
pub const L4_FRAME_TYPE: usize = 23;
pub const BITMASK: usize = 24;
pub const RECORDS: usize = 32;
const RECORD_SLOT: usize = 8;

/// Length of a Type2 descriptor in bytes.
pub const TYPE2_LEN: usize = RECORDS + MAX_RECORDS * RECORD_SLOT;

/// Writes the state of `dissector` into `out` as a Type2 descriptor in byte order `B`.
pub(crate) fn write_type2<B: ByteOrder>(dissector: &Dissector, out: &mut [u8]) -> Result<usize> {
    if out.len() < TYPE2_LEN {
        log::warn!("Descriptor buffer too small: {} < {}", out.len(), TYPE2_LEN);
        bail!(DescriptorError::BufferTooSmall {
            needed: TYPE2_LEN,
            have: out.len(),
        });
    }
    let out = &mut out[..TYPE2_LEN];
    let records = dissector.records();
    let (hash, hash_type) = dissector.hash();

    B::write_u64(&mut out[TIMESTAMP..], dissector.timestamp());
    B::write_u16(&mut out[CAPTURED_LENGTH..], dissector.captured_length() as u16);
    out[RX_PORT] = dissector.rx_port();
    out[TX_PORT] = dissector.tx_port();
    B::write_u16(&mut out[WIRE_LENGTH..], dissector.wire_length() as u16);
    out[TX_FLAGS] = dissector.tx_flags().bits();
    out[L2_FRAME_TYPE] = dissector.l2_frame_type() as u8;
    out[HASH_TYPE] = hash_type as u8;
    out[RECORD_COUNT] = records.len() as u8;
    out[FRAG_FLAGS] = dissector.frag_flags().bits();
    B::write_u24(&mut out[HASH24..], hash);
    out[L3_FRAME_TYPE] = dissector.l3_frame_type() as u8;
    out[L4_FRAME_TYPE] = dissector.l4_frame_type() as u8;
    B::write_u64(&mut out[BITMASK..], records.bitmask());

    let slots = &mut out[RECORDS..];
    slots.fill(0);
    for (slot, record) in slots.chunks_exact_mut(RECORD_SLOT).zip(records.raw()) {
        B::write_u64(slot, *record);
    }
    Ok(TYPE2_LEN)
}

/// Read-only view over a descriptor written in byte order `B`.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorView<'a, B: ByteOrder> {
    buf: &'a [u8],
    _order: PhantomData<B>,
}

impl<'a, B: ByteOrder> DescriptorView<'a, B> {
    /// Wraps `buf`, which must hold a whole descriptor of type `kind`.
    pub fn new(buf: &'a [u8], kind: DescriptorType) -> Result<Self> {
        let needed = kind.size();
        if buf.len() < needed {
            bail!(DescriptorError::BufferTooSmall {
                needed,
                have: buf.len(),
            });
        }
        Ok(DescriptorView {
            buf: &buf[..needed],
            _order: PhantomData,
        })
    }

    #[inline]
    pub fn timestamp(&self) -> u64 {
        B::read_u64(&self.buf[TIMESTAMP..])
    }

    #[inline]
    pub fn captured_length(&self) -> usize {
        B::read_u16(&self.buf[CAPTURED_LENGTH..]) as usize
    }

    #[inline]
    pub fn wire_length(&self) -> usize {
        B::read_u16(&self.buf[WIRE_LENGTH..]) as usize
    }

    #[inline]
    pub fn rx_port(&self) -> u8 {
        self.buf[RX_PORT]
    }

    #[inline]
    pub fn tx_port(&self) -> u8 {
        self.buf[TX_PORT]
    }

    #[inline]
    pub fn tx_flags(&self) -> TxFlags {
        TxFlags::from(self.buf[TX_FLAGS])
    }

    #[inline]
    pub fn l2_frame_type(&self) -> L2FrameType {
        L2FrameType::from_raw(self.buf[L2_FRAME_TYPE])
    }

    #[inline]
    pub fn l3_frame_type(&self) -> L3FrameType {
        L3FrameType::from_raw(self.buf[L3_FRAME_TYPE])
    }

    #[inline]
    pub fn l4_frame_type(&self) -> L4FrameType {
        L4FrameType::from_raw(self.buf[L4_FRAME_TYPE])
    }

    /// Returns the 24-bit passthrough hash and its kind.
    #[inline]
    pub fn hash(&self) -> (u32, HashType) {
        (
            B::read_u24(&self.buf[HASH24..]),
            HashType::from_raw(self.buf[HASH_TYPE]),
        )
    }

    #[inline]
    pub fn frag_flags(&self) -> FragFlags {
        FragFlags::from(self.buf[FRAG_FLAGS])
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.frag_flags().contains(FragFlags::Fragment)
    }

    #[inline]
    pub fn is_last_fragment(&self) -> bool {
        self.frag_flags().contains(FragFlags::LastFragment)
    }

    #[inline]
    pub fn bitmask(&self) -> u64 {
        B::read_u64(&self.buf[BITMASK..])
    }

    /// Number of Records, capped at the slot count.
    #[inline]
    pub fn record_count(&self) -> usize {
        (self.buf[RECORD_COUNT] as usize).min(MAX_RECORDS)
    }

    /// Returns the Record in slot `index`.
    pub fn record(&self, index: usize) -> Option<Record> {
        if index >= self.record_count() {
            return None;
        }
        let at = RECORDS + index * RECORD_SLOT;
        Some(Record::decode(B::read_u64(&self.buf[at..])))
    }

    /// Records in slot order.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.record_count()).filter_map(move |i| self.record(i))
    }

    /// Returns the index and Record of the `depth`-th header with id `id`.
    pub fn lookup(&self, id: impl Into<ProtocolId>, depth: usize) -> Option<(usize, Record)> {
        find_record(self.records(), id.into(), depth)
    }

    /// Like [`DescriptorView::lookup`], in compact form with the slot index as `meta`.
    pub fn lookup_compact(
        &self,
        id: impl Into<ProtocolId>,
        depth: usize,
    ) -> Option<CompactDescriptor> {
        self.lookup(id, depth)
            .map(|(index, record)| record.to_compact(index as u16))
    }

    /// Binds the `depth`-th header of type `H` to its bytes in `frame`.
    pub fn bind<H: Header<'a>>(&self, frame: &'a [u8], depth: usize) -> Result<H> {
        match self.lookup(H::PROTOCOL, depth) {
            Some((_, record)) => H::bind(frame, record),
            None => bail!(crate::protocols::packet::PacketParseError::InvalidProtocol),
        }
    }
}
