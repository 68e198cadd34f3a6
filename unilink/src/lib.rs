//! unilink - uniform links to remote devices
//!
//! One read/write contract, [`Link`], over several carriers:
//!
//! - `unilink-core`: error type, payload, shared constants
//! - `unilink-transport`: the [`Link`] trait with TCP, UDP and serial links
//! - `unilink-gsm`: GSM modem calls layered over another link
//! - `unilink-client`: descriptors (`tcp:host:port`, ...) and the link builder
//!
//! # Usage
//!
//! ```no_run
//! use unilink::{link_from_url, Link};
//!
//! # async fn run() -> unilink::LinkResult<()> {
//! unilink::init_logger();
//! let mut link = link_from_url("tcp:192.168.1.100:4059")?;
//! link.write("hello".into()).await?;
//! let reply = link.read(Some(64), None).await?;
//! println!("{}", reply);
//! link.close().await?;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use unilink_core::{
    hex_pairs, LinkError, LinkResult, Payload, DEFAULT_TIMEOUT, DRAIN_TIMEOUT, MAX_STRING_SIZE,
    POLL_INTERVAL,
};

// Re-export links
pub use unilink_transport::{
    Link, Parity, PortId, SerialLink, SerialSettings, TcpLink, TcpSettings, UdpLink, UdpSettings,
};

// Re-export GSM sessions
pub mod gsm {
    pub use unilink_gsm::*;
}

pub use unilink_client::{link_from_url, Descriptor, Framing, LinkBuilder};

/// Install a stderr logger for command-line use
///
/// Verbosity follows `RUST_LOG` and defaults to `info`, which shows every
/// read, write and connection event. Calling it again is harmless.
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed");
    }
}
