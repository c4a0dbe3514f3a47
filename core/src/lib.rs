#![allow(clippy::needless_doctest_main)]
// #![warn(missing_docs)]

//! Single-pass packet dissection into fixed-layout binary descriptors.
//!
//! netdissect walks a captured frame once, layer by layer, and records where every recognized
//! header starts and how long it is. It never copies packet bytes: the result is a small table of
//! `(protocol, offset, length)` Records plus capture metadata, which can be serialized into a
//! fixed-size binary descriptor and later resolved back into typed header accessors over the
//! original buffer.
//!
//! Supported headers:
//!
//! - Ethernet II, 802.3 with LLC/SNAP, Novell raw IPX, stacked VLAN tags, MPLS label stacks,
//!   ARP/RARP and spanning-tree BPDUs
//! - IPv4 with options, IPv6 with its extension header chain and Hop-by-Hop options
//! - TCP with options, UDP, SCTP, GRE, ICMPv4 and ICMPv6 (including Neighbor-Discovery options
//!   and Multicast Listener Report v2 records)
//!
//! The following example dissects one frame and writes its descriptor:
//!
//! ```rust
//! use netdissect_core::config::default_config;
//! use netdissect_core::descriptor::{DescriptorType, DescriptorView};
//! use netdissect_core::protocols::id::CoreProtocol;
//! use netdissect_core::Dissector;
//! use byteorder::LittleEndian;
//!
//! let frame = hex::decode(
//!     "000c29340bde000c29c5f69b80350001080006040004000c29c5f69b0a01010a000c29340bde0a010164",
//! )
//! .unwrap();
//!
//! let mut dissector = Dissector::from_config(&default_config());
//! dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
//!
//! let mut buf = [0u8; 288];
//! dissector.write_descriptor_with::<LittleEndian>(&mut buf).unwrap();
//! dissector.reset();
//!
//! let view = DescriptorView::<LittleEndian>::new(&buf, DescriptorType::Type2).unwrap();
//! assert!(view.lookup(CoreProtocol::Arp, 0).is_some());
//! ```

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod descriptor;
pub mod dissector;
pub mod memory;
pub mod protocols;
pub mod stats;

pub use self::dissector::record::{Record, RecordTable};
pub use self::dissector::{DatalinkType, Dissector, DissectorExtension};
pub use self::memory::view::ByteView;
pub use self::protocols::id::ProtocolId;
