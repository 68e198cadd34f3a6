//! UDP link implementation

use crate::accumulate::{accumulate, TryReceive};
use crate::link::Link;
use crate::tcp::resolve;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use unilink_core::{LinkError, LinkResult, DEFAULT_TIMEOUT};

/// Maximum UDP payload size
pub const MAX_UDP_PAYLOAD_SIZE: usize = 65507;

/// UDP link settings
#[derive(Debug, Clone)]
pub struct UdpSettings {
    pub remote_address: SocketAddr,
    pub timeout: Duration,
}

impl UdpSettings {
    /// Create new UDP settings
    pub fn new(remote_address: SocketAddr) -> Self {
        Self {
            remote_address,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create UDP settings with timeout
    pub fn with_timeout(remote_address: SocketAddr, timeout: Duration) -> Self {
        Self {
            remote_address,
            timeout,
        }
    }

    /// Resolve `host` and build settings for it
    pub fn resolve(host: &str, port: u16) -> LinkResult<Self> {
        Ok(Self::new(resolve(host, port)?))
    }
}

/// Receive primitive that only accepts datagrams sent by `peer`
///
/// The socket is not connected at the OS level, so anybody can reach it;
/// datagrams from other sources are consumed and dropped.
struct FromPeer<'a> {
    socket: &'a UdpSocket,
    peer: SocketAddr,
}

impl TryReceive for FromPeer<'_> {
    fn try_receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, source) = self.socket.try_recv_from(buf)?;
        if source == self.peer {
            Ok(len)
        } else {
            log::debug!("discarding {} bytes from unexpected peer {}", len, source);
            Ok(0)
        }
    }
}

/// Datagram link to a single peer
#[derive(Debug)]
pub struct UdpLink {
    socket: Option<UdpSocket>,
    settings: UdpSettings,
}

impl UdpLink {
    /// Create a new UDP link
    pub fn new(settings: UdpSettings) -> Self {
        Self {
            socket: None,
            settings,
        }
    }

    /// Resolve `host` and create a link to `host:port`
    pub fn connect_to(host: &str, port: u16) -> LinkResult<Self> {
        Ok(Self::new(UdpSettings::resolve(host, port)?))
    }

    /// Create UDP link from address string
    pub fn from_address(address: &str) -> LinkResult<Self> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| LinkError::InvalidConfig(format!("Invalid UDP address: {}", e)))?;
        Ok(Self::new(UdpSettings::new(addr)))
    }

    /// Resolved peer address
    pub fn address(&self) -> SocketAddr {
        self.settings.remote_address
    }

    /// Local address of the socket, once it is open
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|socket| socket.local_addr().ok())
    }

    async fn socket(&mut self) -> LinkResult<&UdpSocket> {
        self.open().await?;
        self.socket.as_ref().ok_or_else(|| {
            LinkError::Connection(io::Error::new(
                io::ErrorKind::NotConnected,
                "UDP socket not connected",
            ))
        })
    }
}

#[async_trait]
impl Link for UdpLink {
    async fn open(&mut self) -> LinkResult<()> {
        if self.socket.is_some() {
            return Ok(());
        }

        let local: SocketAddr = if self.settings.remote_address.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;

        self.socket = Some(socket);
        log::info!("new {} was initialized", self.describe());
        Ok(())
    }

    async fn close(&mut self) -> LinkResult<()> {
        if self.socket.take().is_some() {
            log::info!("connection {} was closed", self.describe());
        }
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> LinkResult<()> {
        let remote = self.settings.remote_address;
        let socket = self.socket().await?;

        // Each datagram carries at most MAX_UDP_PAYLOAD_SIZE bytes
        let mut remaining = data;
        while !remaining.is_empty() {
            let to_send = remaining.len().min(MAX_UDP_PAYLOAD_SIZE);
            let sent = socket.send_to(&remaining[..to_send], remote).await?;
            remaining = &remaining[sent..];
        }
        Ok(())
    }

    async fn receive(&mut self, size: usize, timeout: Duration) -> LinkResult<Bytes> {
        let peer = self.settings.remote_address;
        let socket = self.socket().await?;
        let mut source = FromPeer { socket, peer };
        Ok(accumulate(&mut source, size, timeout).await)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.settings.timeout = timeout;
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    fn url(&self) -> String {
        format!(
            "udp:{}:{}",
            self.settings.remote_address.ip(),
            self.settings.remote_address.port()
        )
    }

    fn kind(&self) -> &'static str {
        "UdpLink"
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}

impl Drop for UdpLink {
    fn drop(&mut self) {
        if self.socket.is_some() {
            log::debug!("{} dropped while open, releasing socket", self.describe());
        }
    }
}
