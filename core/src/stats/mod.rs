//! Per-thread dissection counters.
//!
//! A dissector is used by one thread at a time, so counters are thread-local cells and cost a
//! load and a store to update. [`snapshot`] reads the calling thread's values.

use std::cell::Cell;

use serde::Serialize;

thread_local! {
    pub(crate) static DISSECTED_PKT: Cell<u64> = const { Cell::new(0) };
    pub(crate) static DISSECTED_BYTE: Cell<u64> = const { Cell::new(0) };
    pub(crate) static UNRECOGNIZED_PKT: Cell<u64> = const { Cell::new(0) };
    pub(crate) static RECORDS_ADDED: Cell<u64> = const { Cell::new(0) };
    pub(crate) static RECORDS_REJECTED: Cell<u64> = const { Cell::new(0) };
}

pub(crate) trait StatExt: Sized {
    fn inc(&'static self) {
        self.inc_by(1);
    }
    fn inc_by(&'static self, val: u64);
}

impl StatExt for std::thread::LocalKey<Cell<u64>> {
    fn inc_by(&'static self, val: u64) {
        self.set(self.get() + val);
    }
}

/// Counter values of the calling thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DissectStats {
    /// Packets passed to `dissect`.
    pub dissected_pkt: u64,
    /// Captured bytes passed to `dissect`.
    pub dissected_byte: u64,
    /// Packets where not even the link layer was recognized.
    pub unrecognized_pkt: u64,
    pub records_added: u64,
    /// Records refused because the table was full or the header was truncated.
    pub records_rejected: u64,
}

/// Returns the counters of the calling thread.
pub fn snapshot() -> DissectStats {
    DissectStats {
        dissected_pkt: DISSECTED_PKT.get(),
        dissected_byte: DISSECTED_BYTE.get(),
        unrecognized_pkt: UNRECOGNIZED_PKT.get(),
        records_added: RECORDS_ADDED.get(),
        records_rejected: RECORDS_REJECTED.get(),
    }
}

/// Zeroes the counters of the calling thread.
pub fn clear() {
    DISSECTED_PKT.set(0);
    DISSECTED_BYTE.set(0);
    UNRECOGNIZED_PKT.set(0);
    RECORDS_ADDED.set(0);
    RECORDS_REJECTED.set(0);
}
