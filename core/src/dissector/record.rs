//! Record encoding and the fixed-capacity record table.
//!
//! A Record locates one recognized header inside the captured frame. It is packed into a `u64`:
//!
//! ```text
//!  63            48 47            32 31                             0
//! +----------------+----------------+--------------------------------+
//! |     length     |     offset     |          protocol id           |
//! +----------------+----------------+--------------------------------+
//! ```
//!
//! The compact descriptor form narrows the id to 16 bits and carries a 16-bit `meta` field in
//! bits 16–31 instead.

use crate::protocols::id::{CoreProtocol, ProtocolId};
use crate::stats::{StatExt, RECORDS_ADDED, RECORDS_REJECTED};

use std::fmt;

/// Maximum number of Records kept for one packet.
pub const MAX_RECORDS: usize = 32;

const ID_MASK: u64 = 0xFFFF_FFFF;
const COMPACT_ID_MASK: u64 = 0xFFFF;
const META_SHIFT: u32 = 16;
const OFFSET_SHIFT: u32 = 32;
const LENGTH_SHIFT: u32 = 48;
const U16_MASK: u64 = 0xFFFF;

/// Packs `(id, offset, length)`. Offsets and lengths wider than 16 bits are truncated.
#[inline]
pub const fn encode_record(id: u32, offset: usize, length: usize) -> u64 {
    (id as u64 & ID_MASK)
        | ((offset as u64 & U16_MASK) << OFFSET_SHIFT)
        | ((length as u64 & U16_MASK) << LENGTH_SHIFT)
}

/// Unpacks a Record into `(id, offset, length)`.
#[inline]
pub const fn decode_record(record: u64) -> (u32, u16, u16) {
    (
        (record & ID_MASK) as u32,
        ((record >> OFFSET_SHIFT) & U16_MASK) as u16,
        ((record >> LENGTH_SHIFT) & U16_MASK) as u16,
    )
}

/// Packs a compact descriptor `(id, meta, offset, length)`.
#[inline]
pub const fn encode_compact(id: u16, meta: u16, offset: u16, length: u16) -> u64 {
    id as u64
        | ((meta as u64) << META_SHIFT)
        | ((offset as u64) << OFFSET_SHIFT)
        | ((length as u64) << LENGTH_SHIFT)
}

/// Unpacks a compact descriptor into `(id, meta, offset, length)`.
#[inline]
pub const fn decode_compact(compact: u64) -> (u16, u16, u16, u16) {
    (
        (compact & COMPACT_ID_MASK) as u16,
        ((compact >> META_SHIFT) & U16_MASK) as u16,
        ((compact >> OFFSET_SHIFT) & U16_MASK) as u16,
        ((compact >> LENGTH_SHIFT) & U16_MASK) as u16,
    )
}

/// Location of one header within a captured frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record {
    pub id: ProtocolId,
    pub offset: u16,
    pub length: u16,
}

impl Record {
    /// Returns the packed form.
    #[inline]
    pub const fn encode(&self) -> u64 {
        encode_record(self.id.raw(), self.offset as usize, self.length as usize)
    }

    /// Builds a Record from its packed form.
    #[inline]
    pub const fn decode(raw: u64) -> Self {
        let (id, offset, length) = decode_record(raw);
        Record {
            id: ProtocolId::from_raw(id),
            offset,
            length,
        }
    }

    /// Offset of the first byte after the header.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset as usize + self.length as usize
    }

    /// Returns the compact form with `meta` attached. The id is narrowed to 16 bits.
    #[inline]
    pub fn to_compact(&self, meta: u16) -> CompactDescriptor {
        CompactDescriptor {
            id: self.id.raw() as u16,
            meta,
            offset: self.offset,
            length: self.length,
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}+{}", self.id, self.offset, self.length)
    }
}

/// Lightweight header reference passed between dissection and later lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompactDescriptor {
    pub id: u16,
    /// Auxiliary hint, for example the index of the Record in its table.
    pub meta: u16,
    pub offset: u16,
    pub length: u16,
}

impl CompactDescriptor {
    #[inline]
    pub const fn encode(&self) -> u64 {
        encode_compact(self.id, self.meta, self.offset, self.length)
    }

    #[inline]
    pub const fn decode(raw: u64) -> Self {
        let (id, meta, offset, length) = decode_compact(raw);
        CompactDescriptor {
            id,
            meta,
            offset,
            length,
        }
    }
}

/// Fixed-capacity table of packed Records plus the protocol-seen bitmask.
///
/// The table is allocated once and reused for every packet. Records are kept in insertion order.
/// Extensions may only append; emptying the table and rewriting a slot are reserved to the
/// dissector.
///
/// ```compile_fail
/// let mut table = netdissect_core::RecordTable::new();
/// table.reset(64, 0);
/// ```
#[derive(Clone)]
pub struct RecordTable {
    records: [u64; MAX_RECORDS],
    len: usize,
    bitmask: u64,
    /// Captured length of the current packet. No Record may extend past it.
    limit: usize,
}

impl RecordTable {
    pub fn new() -> Self {
        RecordTable {
            records: [0; MAX_RECORDS],
            len: 0,
            bitmask: 0,
            limit: 0,
        }
    }

    /// Empties the table for a packet of `limit` captured bytes.
    pub(crate) fn reset(&mut self, limit: usize, default_bitmask: u64) {
        self.records = [0; MAX_RECORDS];
        self.len = 0;
        self.bitmask = default_bitmask;
        self.limit = limit;
    }

    /// Appends a Record and returns its index.
    ///
    /// Returns `None`, storing nothing, if the table is full or the header would extend past the
    /// captured length or past a 16-bit offset.
    pub fn add(&mut self, id: impl Into<ProtocolId>, offset: usize, length: usize) -> Option<usize> {
        let id = id.into();
        if self.len == MAX_RECORDS || !self.fits(offset, length) {
            log::debug!(
                "Rejected {:?} at {}+{} (records: {}, limit: {})",
                id,
                offset,
                length,
                self.len,
                self.limit
            );
            RECORDS_REJECTED.inc();
            return None;
        }
        let index = self.len;
        self.records[index] = encode_record(id.raw(), offset, length);
        self.len += 1;
        if id.is_core() && id.ordinal() < 64 {
            self.bitmask |= 1 << id.ordinal();
        }
        RECORDS_ADDED.inc();
        Some(index)
    }

    /// Rewrites the length of the Record at `index` in place. Returns `false` if there is no such
    /// Record or the new extent would not fit the captured length.
    pub(crate) fn update_length(&mut self, index: usize, length: usize) -> bool {
        if index >= self.len {
            return false;
        }
        let record = Record::decode(self.records[index]);
        if !self.fits(record.offset as usize, length) {
            RECORDS_REJECTED.inc();
            return false;
        }
        self.records[index] = encode_record(record.id.raw(), record.offset as usize, length);
        true
    }

    #[inline]
    fn fits(&self, offset: usize, length: usize) -> bool {
        offset <= u16::MAX as usize
            && length <= u16::MAX as usize
            && offset + length <= self.limit
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == MAX_RECORDS
    }

    /// Captured length Records are checked against.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Protocol-seen bitmask, indexed by core protocol ordinal.
    #[inline]
    pub fn bitmask(&self) -> u64 {
        self.bitmask
    }

    /// Returns `true` if the bitmask contains `proto`.
    #[inline]
    pub fn contains(&self, proto: CoreProtocol) -> bool {
        self.bitmask & proto.mask() != 0
    }

    /// Packed Records in insertion order.
    #[inline]
    pub fn raw(&self) -> &[u64] {
        &self.records[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<Record> {
        self.raw().get(index).map(|r| Record::decode(*r))
    }

    pub fn iter(&self) -> impl Iterator<Item = Record> + '_ {
        self.raw().iter().map(|r| Record::decode(*r))
    }

    /// Returns the index and Record of the `depth`-th (0-based) header with id `id`.
    pub fn lookup(&self, id: impl Into<ProtocolId>, depth: usize) -> Option<(usize, Record)> {
        find_record(self.iter(), id.into(), depth)
    }
}

impl Default for RecordTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordTable")
            .field("records", &self.iter().collect::<Vec<_>>())
            .field("bitmask", &format_args!("{:#018x}", self.bitmask))
            .field("limit", &self.limit)
            .finish()
    }
}

pub(crate) fn find_record(
    records: impl Iterator<Item = Record>,
    id: ProtocolId,
    depth: usize,
) -> Option<(usize, Record)> {
    records
        .enumerate()
        .filter(|(_, r)| r.id == id)
        .nth(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::id::TcpOption;

    #[test]
    fn core_record_layout() {
        let raw = encode_record(0x0102_0304, 0x1122, 0x3344);
        assert_eq!(raw, 0x3344_1122_0102_0304);
        assert_eq!(decode_record(raw), (0x0102_0304, 0x1122, 0x3344));
    }

    #[test]
    fn core_record_truncates_wide_values() {
        let (_, offset, length) = decode_record(encode_record(1, 0x1_0005, 0x2_0007));
        assert_eq!(offset, 5);
        assert_eq!(length, 7);
    }

    #[test]
    fn core_compact_layout() {
        let raw = encode_compact(0x0a0b, 0x0c0d, 0x0e0f, 0x1011);
        assert_eq!(raw, 0x1011_0e0f_0c0d_0a0b);
        let compact = CompactDescriptor::decode(raw);
        assert_eq!(compact.meta, 0x0c0d);
        assert_eq!(compact.encode(), raw);
    }

    #[test]
    fn core_table_rejects_out_of_bounds() {
        let mut table = RecordTable::new();
        table.reset(60, 0);
        assert_eq!(table.add(CoreProtocol::Ethernet, 0, 14), Some(0));
        assert_eq!(table.add(CoreProtocol::Ipv4, 14, 20), Some(1));
        assert_eq!(table.add(CoreProtocol::Tcp, 34, 40), None);
        assert_eq!(table.len(), 2);
        assert!(table.contains(CoreProtocol::Ipv4));
        assert!(!table.contains(CoreProtocol::Tcp));
    }

    #[test]
    fn core_table_rejects_when_full() {
        let mut table = RecordTable::new();
        table.reset(1000, 0);
        for i in 0..MAX_RECORDS {
            assert_eq!(table.add(CoreProtocol::Vlan, i * 4, 4), Some(i));
        }
        assert!(table.is_full());
        assert_eq!(table.add(CoreProtocol::Ipv4, 200, 20), None);
        assert!(!table.contains(CoreProtocol::Ipv4));
    }

    #[test]
    fn core_table_update_in_place() {
        let mut table = RecordTable::new();
        table.reset(100, 0);
        let index = table.add(CoreProtocol::Ipv6, 14, 40).unwrap();
        table.add(TcpOption::Nop, 54, 1).unwrap();
        assert!(table.update_length(index, 48));
        assert_eq!(table.get(index).unwrap().length, 48);
        assert_eq!(table.get(index).unwrap().offset, 14);
        assert!(!table.update_length(index, 200));
        assert!(!table.update_length(5, 1));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn core_table_option_records_do_not_set_bits() {
        let mut table = RecordTable::new();
        table.reset(100, 0);
        table.add(TcpOption::Mss, 0, 4).unwrap();
        assert_eq!(table.bitmask(), 0);
    }

    #[test]
    fn core_table_lookup_by_depth() {
        let mut table = RecordTable::new();
        table.reset(100, 0);
        table.add(CoreProtocol::Ethernet, 0, 14);
        table.add(CoreProtocol::Vlan, 14, 4);
        table.add(CoreProtocol::Vlan, 18, 4);
        let (index, record) = table.lookup(CoreProtocol::Vlan, 1).unwrap();
        assert_eq!(index, 2);
        assert_eq!(record.offset, 18);
        assert!(table.lookup(CoreProtocol::Vlan, 2).is_none());
    }

    #[test]
    fn core_table_reset_applies_default_bitmask() {
        let mut table = RecordTable::new();
        table.reset(100, 0);
        table.add(CoreProtocol::Ethernet, 0, 14);
        table.reset(50, 1 << 63);
        assert!(table.is_empty());
        assert_eq!(table.bitmask(), 1 << 63);
        assert_eq!(table.limit(), 50);
    }
}
