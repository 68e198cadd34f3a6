//! TCP link implementation

use crate::accumulate::accumulate;
use crate::link::Link;
use async_trait::async_trait;
use bytes::Bytes;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use unilink_core::{LinkError, LinkResult, DEFAULT_TIMEOUT, DRAIN_TIMEOUT, MAX_STRING_SIZE};

/// Resolve `host:port` once, preferring an IPv4 address
pub(crate) fn resolve(host: &str, port: u16) -> LinkResult<SocketAddr> {
    let addresses: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| LinkError::InvalidConfig(format!("cannot resolve {}: {}", host, e)))?
        .collect();

    addresses
        .iter()
        .find(|address| address.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
        .ok_or_else(|| LinkError::InvalidConfig(format!("no address found for {}", host)))
}

/// TCP link settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: SocketAddr,
    pub timeout: Duration,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create TCP settings with timeout
    pub fn with_timeout(address: SocketAddr, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    /// Resolve `host` and build settings for it
    ///
    /// Resolution happens here, once; failure is a configuration error.
    pub fn resolve(host: &str, port: u16) -> LinkResult<Self> {
        Ok(Self::new(resolve(host, port)?))
    }
}

/// Stream-oriented link over a TCP connection
///
/// The connection is established on first use. Reads poll the non-blocking
/// socket with the two-deadline accumulation of [`accumulate`].
#[derive(Debug)]
pub struct TcpLink {
    stream: Option<TcpStream>,
    settings: TcpSettings,
}

impl TcpLink {
    /// Create a TCP link from settings
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
        }
    }

    /// Resolve `host` and create a link to `host:port`
    pub fn connect_to(host: &str, port: u16) -> LinkResult<Self> {
        Ok(Self::new(TcpSettings::resolve(host, port)?))
    }

    /// Create TCP link from an address string such as `127.0.0.1:7`
    pub fn from_address(address: &str) -> LinkResult<Self> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| LinkError::InvalidConfig(format!("Invalid TCP address: {}", e)))?;
        Ok(Self::new(TcpSettings::new(addr)))
    }

    /// Resolved peer address
    pub fn address(&self) -> SocketAddr {
        self.settings.address
    }

    async fn stream(&mut self) -> LinkResult<&mut TcpStream> {
        self.open().await?;
        self.stream.as_mut().ok_or_else(|| {
            LinkError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "TCP stream not connected",
            ))
        })
    }
}

#[async_trait]
impl Link for TcpLink {
    async fn open(&mut self) -> LinkResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream =
            tokio::time::timeout(self.settings.timeout, TcpStream::connect(self.settings.address))
                .await
                .map_err(|_| LinkError::Timeout)??;

        self.stream = Some(stream);
        log::info!("new {} was initialized", self.describe());
        Ok(())
    }

    async fn close(&mut self) -> LinkResult<()> {
        if let Some(mut stream) = self.stream.take() {
            log::info!("closing connection {}", self.describe());
            // Unread bytes would make the peer see a reset instead of a close
            let drained = accumulate(&mut stream, MAX_STRING_SIZE, DRAIN_TIMEOUT).await;
            if !drained.is_empty() {
                log::debug!("discarded {} unread bytes", drained.len());
            }
            let _ = stream.shutdown().await;
            log::info!("connection {} was closed", self.describe());
        }
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> LinkResult<()> {
        let stream = self.stream().await?;
        stream.write_all(data).await?;
        Ok(())
    }

    async fn receive(&mut self, size: usize, timeout: Duration) -> LinkResult<Bytes> {
        let stream = self.stream().await?;
        Ok(accumulate(stream, size, timeout).await)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.settings.timeout = timeout;
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    fn url(&self) -> String {
        format!("tcp:{}:{}", self.settings.address.ip(), self.settings.address.port())
    }

    fn kind(&self) -> &'static str {
        "TcpLink"
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        if self.stream.is_some() {
            log::debug!("{} dropped while open, releasing socket", self.describe());
        }
    }
}
