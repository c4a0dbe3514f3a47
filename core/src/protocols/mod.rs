//! Protocol identifiers, wire constants, and typed header accessors.

pub mod constants;
pub mod id;
pub mod packet;
