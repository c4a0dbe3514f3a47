//! Binary packet descriptors.
//!
//! A descriptor is the serialized result of dissecting one packet: capture metadata, frame types,
//! the protocol-seen bitmask and the Record table, laid out at fixed byte offsets so that arrays
//! of descriptors can be walked with a fixed stride. The layout is versioned by
//! [`DescriptorType`]; only [`DescriptorType::Type2`] exists today.
//!
//! Descriptors are written by [`Dissector::write_descriptor`](crate::dissector::Dissector) and
//! read back with a [`DescriptorView`].

pub mod type2;

pub use self::type2::DescriptorView;
pub(crate) use self::type2::write_type2;
pub use crate::config::{ByteOrderKind, DescriptorType};

use thiserror::Error;

impl DescriptorType {
    /// Size in bytes of a descriptor of this type.
    pub const fn size(self) -> usize {
        match self {
            DescriptorType::Type2 => type2::TYPE2_LEN,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Descriptor needs {needed} bytes, buffer has {have}")]
    BufferTooSmall { needed: usize, have: usize },
}
