//! Core types for unilink
//!
//! This crate provides the error type, the text/bytes payload and the
//! constants shared by every link implementation.

pub mod error;
pub mod payload;

pub use error::{LinkError, LinkResult};
pub use payload::{hex_pairs, Payload};

use std::time::Duration;

/// Default maximum number of bytes returned by a single read
pub const MAX_STRING_SIZE: usize = 4048;

/// Default per-link timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause between two receive attempts while polling a non-blocking socket
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on draining unread bytes before a TCP socket is closed
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);
