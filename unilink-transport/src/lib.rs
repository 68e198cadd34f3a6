//! Transport layer for unilink
//!
//! This crate provides the [`Link`] contract and its TCP, UDP and serial
//! implementations. TCP and UDP reads share the deadline-bounded accumulation
//! in [`accumulate`]; serial reads rely on a deadline-bounded blocking read.

pub mod accumulate;
pub mod link;
pub mod serial;
pub mod tcp;
pub mod udp;

pub use accumulate::{accumulate, TryReceive, READ_CHUNK_SIZE};
pub use link::Link;
#[cfg(feature = "mock")]
pub use link::MockLink;
pub use serial::{read_within, Parity, PortId, SerialLink, SerialSettings, DEFAULT_BAUD_RATE};
pub use tcp::{TcpLink, TcpSettings};
pub use udp::{UdpLink, UdpSettings, MAX_UDP_PAYLOAD_SIZE};
pub use unilink_core::{LinkError, LinkResult, Payload};
