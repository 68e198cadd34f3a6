//! The link contract shared by every transport

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use unilink_core::{hex_pairs, LinkResult, Payload, MAX_STRING_SIZE};

/// Uniform read/write access to a remote peer, whatever carries the bytes
///
/// A link owns at most one OS resource (socket or serial handle). The
/// resource is created lazily by [`Link::open`], or implicitly by the first
/// `send`/`receive`, and released by [`Link::close`] or when the link is
/// dropped. Both `open` and `close` are idempotent.
///
/// Reads are bounded by a deadline and never fail because it elapsed: a
/// partial or empty result is a normal outcome.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Link: Send {
    /// Create the underlying resource if it does not exist yet
    async fn open(&mut self) -> LinkResult<()>;

    /// Release the underlying resource; a no-op when already closed
    async fn close(&mut self) -> LinkResult<()>;

    /// Transmit raw bytes, opening the link first if needed
    async fn send(&mut self, data: &[u8]) -> LinkResult<()>;

    /// Receive up to `size` bytes within `timeout`
    async fn receive(&mut self, size: usize, timeout: Duration) -> LinkResult<Bytes>;

    /// Set the default deadline used by subsequent reads
    fn set_timeout(&mut self, timeout: Duration);

    /// Default read deadline
    fn timeout(&self) -> Duration;

    /// Textual identity, e.g. `tcp:127.0.0.1:7`
    fn url(&self) -> String;

    /// Variant name, e.g. `TcpLink`
    fn kind(&self) -> &'static str;

    /// Whether the underlying resource currently exists
    fn is_open(&self) -> bool;

    /// `<Kind url>` rendering used in log lines
    fn describe(&self) -> String {
        format!("<{} {}>", self.kind(), self.url())
    }

    /// Write text or bytes
    ///
    /// Text is encoded as UTF-8; bytes are sent unchanged. The payload is
    /// logged after a successful transmission.
    async fn write(&mut self, data: Payload) -> LinkResult<()> {
        self.send(data.as_bytes()).await?;
        log::info!("{} write: <{}>", self.describe(), data);
        Ok(())
    }

    /// Read up to `size` bytes (default [`MAX_STRING_SIZE`]) within `timeout`
    /// (default [`Link::timeout`])
    ///
    /// The result is text when the received bytes are valid UTF-8, raw bytes
    /// otherwise. Use [`Link::read_bytes`] when the payload must never be
    /// reinterpreted as text.
    async fn read(&mut self, size: Option<usize>, timeout: Option<Duration>) -> LinkResult<Payload> {
        let size = size.unwrap_or(MAX_STRING_SIZE);
        let timeout = timeout.unwrap_or_else(|| self.timeout());
        let payload = Payload::from_received(self.receive(size, timeout).await?);
        log::info!("{} read: <{}>", self.describe(), payload);
        Ok(payload)
    }

    /// Same as [`Link::read`] but always returns the raw bytes
    async fn read_bytes(
        &mut self,
        size: Option<usize>,
        timeout: Option<Duration>,
    ) -> LinkResult<Bytes> {
        let size = size.unwrap_or(MAX_STRING_SIZE);
        let timeout = timeout.unwrap_or_else(|| self.timeout());
        let data = self.receive(size, timeout).await?;
        log::info!("{} read: <{}>", self.describe(), hex_pairs(&data));
        Ok(data)
    }
}

impl std::fmt::Debug for dyn Link + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

#[async_trait]
impl<L: Link + ?Sized> Link for Box<L> {
    async fn open(&mut self) -> LinkResult<()> {
        (**self).open().await
    }

    async fn close(&mut self) -> LinkResult<()> {
        (**self).close().await
    }

    async fn send(&mut self, data: &[u8]) -> LinkResult<()> {
        (**self).send(data).await
    }

    async fn receive(&mut self, size: usize, timeout: Duration) -> LinkResult<Bytes> {
        (**self).receive(size, timeout).await
    }

    fn set_timeout(&mut self, timeout: Duration) {
        (**self).set_timeout(timeout)
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn url(&self) -> String {
        (**self).url()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
