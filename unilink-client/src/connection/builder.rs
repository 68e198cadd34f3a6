//! Link builder
//!
//! This module provides a builder pattern for creating links. The builder
//! picks a transport, applies its settings and optionally wraps the result in
//! a GSM session. The link it returns is constructed but not yet open.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use unilink_client::connection::LinkBuilder;
//! use unilink_transport::Parity;
//!
//! # fn run() -> unilink_core::LinkResult<()> {
//! // TCP link with a 3 s read deadline
//! let tcp = LinkBuilder::new()
//!     .tcp("192.168.1.100", 4059)
//!     .timeout(Duration::from_secs(3))
//!     .build()?;
//!
//! // Modem on a serial port, dialing a remote device
//! let call = LinkBuilder::new()
//!     .serial("/dev/ttyUSB0", 38400)
//!     .framing(8, Parity::None, 1)
//!     .gsm("0612345678")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::descriptor::{Descriptor, Framing};
use std::time::Duration;
use unilink_core::{LinkError, LinkResult};
use unilink_gsm::{GsmLink, GsmSettings, DEFAULT_GSM_BAUD_RATE};
use unilink_transport::{
    Link, Parity, PortId, SerialLink, SerialSettings, TcpLink, TcpSettings, UdpLink, UdpSettings,
    DEFAULT_BAUD_RATE,
};

/// Transport type configuration
#[derive(Debug, Clone)]
enum TransportType {
    Tcp { host: String, port: u16 },
    Udp { host: String, port: u16 },
    Serial { port: PortId, baud_rate: Option<u32> },
    /// Not configured
    None,
}

/// Builder for creating links
///
/// Host names are resolved by [`LinkBuilder::build`], once.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    transport_type: TransportType,
    framing: Option<Framing>,
    timeout: Option<Duration>,
    gsm: Option<GsmSettings>,
}

impl LinkBuilder {
    /// Create a new builder with no transport configured
    pub fn new() -> Self {
        Self {
            transport_type: TransportType::None,
            framing: None,
            timeout: None,
            gsm: None,
        }
    }

    /// Create a builder pre-configured from a parsed descriptor
    pub fn from_descriptor(descriptor: Descriptor) -> Self {
        let builder = Self::new();
        match descriptor {
            Descriptor::Tcp { host, port } => builder.tcp(&host, port),
            Descriptor::Udp { host, port } => builder.udp(&host, port),
            Descriptor::Serial {
                port,
                baud_rate,
                framing,
            } => Self {
                transport_type: TransportType::Serial { port, baud_rate },
                framing,
                ..builder
            },
            Descriptor::Gsm { phone, modem } => Self::from_descriptor(*modem).gsm(&phone),
        }
    }

    /// Configure TCP transport to `host:port`
    pub fn tcp(mut self, host: &str, port: u16) -> Self {
        self.transport_type = TransportType::Tcp {
            host: host.to_string(),
            port,
        };
        self
    }

    /// Configure UDP transport to `host:port`
    pub fn udp(mut self, host: &str, port: u16) -> Self {
        self.transport_type = TransportType::Udp {
            host: host.to_string(),
            port,
        };
        self
    }

    /// Configure serial transport
    ///
    /// `port` is a device name such as `/dev/ttyUSB0` or `COM1`, or a device
    /// number counting from zero.
    pub fn serial(mut self, port: impl Into<PortId>, baud_rate: u32) -> Self {
        self.transport_type = TransportType::Serial {
            port: port.into(),
            baud_rate: Some(baud_rate),
        };
        self
    }

    /// Configure serial framing; only valid with a serial transport
    pub fn framing(mut self, byte_size: u8, parity: Parity, stop_bits: u8) -> Self {
        self.framing = Some(Framing::new(byte_size, parity, stop_bits));
        self
    }

    /// Default read deadline of the built link
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Dial `phone` through the configured transport
    ///
    /// A serial transport without an explicit baud rate then defaults to
    /// [`DEFAULT_GSM_BAUD_RATE`].
    pub fn gsm(self, phone: &str) -> Self {
        self.gsm_settings(GsmSettings::new(phone))
    }

    pub fn gsm_settings(mut self, settings: GsmSettings) -> Self {
        self.gsm = Some(settings);
        self
    }

    fn build_serial(&self, port: &PortId, baud_rate: Option<u32>) -> LinkResult<SerialLink> {
        let default_baud_rate = if self.gsm.is_some() {
            DEFAULT_GSM_BAUD_RATE
        } else {
            DEFAULT_BAUD_RATE
        };
        let framing = self.framing.unwrap_or_default();
        let mut settings = SerialSettings::new(port.clone(), baud_rate.unwrap_or(default_baud_rate))
            .with_framing(framing.byte_size, framing.parity, framing.stop_bits)?;
        if let Some(timeout) = self.timeout {
            settings = settings.with_timeout(timeout);
        }
        Ok(SerialLink::new(settings))
    }

    /// Build the link
    ///
    /// # Errors
    /// Returns [`LinkError::InvalidConfig`] if:
    /// - Transport type is not configured
    /// - Framing is set for a network transport or is out of range
    /// - A host name cannot be resolved
    pub fn build(self) -> LinkResult<Box<dyn Link>> {
        if self.framing.is_some() && !matches!(self.transport_type, TransportType::Serial { .. }) {
            return Err(LinkError::invalid_config("framing only applies to a serial transport"));
        }

        let link: Box<dyn Link> = match &self.transport_type {
            TransportType::Tcp { host, port } => {
                let mut settings = TcpSettings::resolve(host, *port)?;
                if let Some(timeout) = self.timeout {
                    settings.timeout = timeout;
                }
                Box::new(TcpLink::new(settings))
            }
            TransportType::Udp { host, port } => {
                let mut settings = UdpSettings::resolve(host, *port)?;
                if let Some(timeout) = self.timeout {
                    settings.timeout = timeout;
                }
                Box::new(UdpLink::new(settings))
            }
            TransportType::Serial { port, baud_rate } => Box::new(self.build_serial(port, *baud_rate)?),
            TransportType::None => {
                return Err(LinkError::invalid_config(
                    "Transport type must be configured (TCP, UDP or serial)",
                ));
            }
        };

        let link: Box<dyn Link> = match self.gsm {
            Some(settings) => Box::new(GsmLink::with_settings(settings, link)),
            None => link,
        };
        log::debug!("built {}", link.describe());
        Ok(link)
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `url` and build the link it describes
///
/// ```rust,no_run
/// # async fn run() -> unilink_core::LinkResult<()> {
/// use unilink_transport::Link;
///
/// let mut link = unilink_client::link_from_url("tcp:localhost:7")?;
/// link.write("ping".into()).await?;
/// let reply = link.read(None, None).await?;
/// # Ok(())
/// # }
/// ```
pub fn link_from_url(url: &str) -> LinkResult<Box<dyn Link>> {
    LinkBuilder::from_descriptor(url.parse()?).build()
}
