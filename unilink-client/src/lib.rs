//! Link factory for unilink
//!
//! This crate turns a textual descriptor such as `tcp:10.0.0.2:4059` or
//! `gsm:0612345678:serial:/dev/ttyUSB0` into a ready-to-open
//! [`Link`](unilink_transport::Link), either in one call with
//! [`link_from_url`] or step by step with [`LinkBuilder`].

pub mod connection;

pub use connection::{link_from_url, Descriptor, Framing, LinkBuilder};
