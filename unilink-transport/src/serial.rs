//! Serial port link implementation

use crate::accumulate::READ_CHUNK_SIZE;
use crate::link::Link;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tokio_serial::{ClearBuffer, SerialPort, SerialStream};
use unilink_core::{LinkError, LinkResult, DEFAULT_TIMEOUT};

/// Default baud rate for serial links
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Serial port identifier: a device number or a device name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortId {
    /// Device number, counting from zero
    Index(u32),
    /// Device name, e.g. `/dev/ttyUSB0` or `COM3`
    Path(String),
}

impl PortId {
    /// Name the operating system knows the device by
    pub fn device_name(&self) -> String {
        match self {
            #[cfg(windows)]
            PortId::Index(n) => format!("COM{}", n + 1),
            #[cfg(not(windows))]
            PortId::Index(n) => format!("/dev/ttyS{}", n),
            PortId::Path(path) => path.clone(),
        }
    }
}

impl From<&str> for PortId {
    fn from(value: &str) -> Self {
        match value.parse::<u32>() {
            Ok(n) => PortId::Index(n),
            Err(_) => PortId::Path(value.to_string()),
        }
    }
}

impl From<u32> for PortId {
    fn from(value: u32) -> Self {
        PortId::Index(value)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortId::Index(n) => write!(f, "{}", n),
            PortId::Path(path) => f.write_str(path),
        }
    }
}

/// Parity checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
    Mark,
    Space,
}

impl Parity {
    /// Single-letter form used in `8N1` notation
    pub fn letter(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        }
    }

    fn to_serial(self) -> LinkResult<tokio_serial::Parity> {
        match self {
            Parity::None => Ok(tokio_serial::Parity::None),
            Parity::Even => Ok(tokio_serial::Parity::Even),
            Parity::Odd => Ok(tokio_serial::Parity::Odd),
            Parity::Mark | Parity::Space => Err(LinkError::InvalidConfig(format!(
                "parity '{}' is not supported by the serial backend",
                self.letter()
            ))),
        }
    }
}

impl TryFrom<char> for Parity {
    type Error = LinkError;

    fn try_from(value: char) -> LinkResult<Self> {
        match value.to_ascii_uppercase() {
            'N' => Ok(Parity::None),
            'E' => Ok(Parity::Even),
            'O' => Ok(Parity::Odd),
            'M' => Ok(Parity::Mark),
            'S' => Ok(Parity::Space),
            other => Err(LinkError::InvalidConfig(format!("unknown parity '{}'", other))),
        }
    }
}

/// Serial port link settings
///
/// Only the timeout can change once the settings are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    port: PortId,
    baud_rate: u32,
    byte_size: u8,
    parity: Parity,
    stop_bits: u8,
    timeout: Duration,
}

impl SerialSettings {
    /// Create new serial settings with 8N1 framing
    pub fn new(port: impl Into<PortId>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            byte_size: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the character framing
    ///
    /// `byte_size` must be within 5..=8 and `stop_bits` either 1 or 2.
    pub fn with_framing(mut self, byte_size: u8, parity: Parity, stop_bits: u8) -> LinkResult<Self> {
        if !(5..=8).contains(&byte_size) {
            return Err(LinkError::InvalidConfig(format!(
                "byte size must be between 5 and 8, got {}",
                byte_size
            )));
        }
        if stop_bits != 1 && stop_bits != 2 {
            return Err(LinkError::InvalidConfig(format!(
                "stop bits must be 1 or 2, got {}",
                stop_bits
            )));
        }
        self.byte_size = byte_size;
        self.parity = parity;
        self.stop_bits = stop_bits;
        Ok(self)
    }

    /// Replace the default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn port(&self) -> &PortId {
        &self.port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn byte_size(&self) -> u8 {
        self.byte_size
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn stop_bits(&self) -> u8 {
        self.stop_bits
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Framing in `8N1` notation
    pub fn framing(&self) -> String {
        format!("{}{}{}", self.byte_size, self.parity.letter(), self.stop_bits)
    }

    fn port_builder(&self) -> LinkResult<tokio_serial::SerialPortBuilder> {
        let data_bits = match self.byte_size {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        };
        let stop_bits = match self.stop_bits {
            2 => tokio_serial::StopBits::Two,
            _ => tokio_serial::StopBits::One,
        };

        Ok(tokio_serial::new(self.port.device_name(), self.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(self.parity.to_serial()?)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(self.timeout))
    }
}

/// Read up to `size` bytes until that many have arrived, the reader reaches
/// end of stream, or `timeout` elapses
///
/// Returns whatever was read by then. This is the blocking-with-deadline read
/// a serial handle offers natively, expressed over any async reader. A
/// timeout too large to form a deadline waits without one.
pub async fn read_within<R>(reader: &mut R, size: usize, timeout: Duration) -> io::Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let deadline = Instant::now().checked_add(timeout);
    let mut collected = BytesMut::new();
    let mut chunk = vec![0u8; size.min(READ_CHUNK_SIZE)];

    while collected.len() < size {
        let wanted = (size - collected.len()).min(chunk.len());
        let read = reader.read(&mut chunk[..wanted]);
        let result = match deadline {
            Some(deadline) => match timeout_at(deadline, read).await {
                Ok(result) => result,
                Err(_) => break,
            },
            None => read.await,
        };
        match result {
            Ok(0) => break,
            Ok(n) => collected.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) => return Err(e),
        }
    }

    Ok(collected.freeze())
}

/// Link over a local serial port
pub struct SerialLink {
    stream: Option<SerialStream>,
    settings: SerialSettings,
}

impl SerialLink {
    /// Create a new serial link
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
        }
    }

    /// Create serial link with port name and baud rate, framed 8N1
    pub fn new_simple(port: impl Into<PortId>, baud_rate: u32) -> Self {
        Self::new(SerialSettings::new(port, baud_rate))
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    async fn stream(&mut self) -> LinkResult<&mut SerialStream> {
        self.open().await?;
        self.stream.as_mut().ok_or_else(|| {
            LinkError::Connection(io::Error::new(
                io::ErrorKind::NotConnected,
                "Serial stream not connected",
            ))
        })
    }
}

impl fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialLink")
            .field("settings", &self.settings)
            .field("open", &self.stream.is_some())
            .finish()
    }
}

#[async_trait]
impl Link for SerialLink {
    async fn open(&mut self) -> LinkResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let builder = self.settings.port_builder()?;
        let stream = SerialStream::open(&builder).map_err(|e| {
            LinkError::Serial(format!(
                "Failed to open serial port {}: {}",
                self.settings.port.device_name(),
                e
            ))
        })?;

        // Bytes left over from an earlier, unclean session must not go out
        if let Err(e) = stream.clear(ClearBuffer::Output) {
            log::warn!("could not clear output buffer of {}: {}", self.url(), e);
        }

        self.stream = Some(stream);
        log::info!("new {} was initialized", self.describe());
        Ok(())
    }

    async fn close(&mut self) -> LinkResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush().await;
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
        Ok(read_within(stream, size, timeout).await?)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.settings.timeout = timeout;
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    fn url(&self) -> String {
        format!(
            "serial:{}:{}:{}",
            self.settings.port,
            self.settings.baud_rate,
            self.settings.framing()
        )
    }

    fn kind(&self) -> &'static str {
        "SerialLink"
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        if self.stream.is_some() {
            log::debug!("{} dropped while open, releasing port", self.describe());
        }
    }
}
