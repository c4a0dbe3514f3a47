//! Packet buffer access.

pub mod view;
