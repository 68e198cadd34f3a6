//! Deadline-bounded accumulation over non-blocking receives
//!
//! Sockets used by [`TcpLink`](crate::TcpLink) and [`UdpLink`](crate::UdpLink)
//! are polled without blocking. A single empty read or error does not mean the
//! peer is done, and waiting forever is not acceptable, so reads follow two
//! deadlines:
//!
//! - once some data has arrived, stop when nothing more shows up within
//!   `timeout` of the last chunk (the deadline rolls forward on every chunk);
//! - while nothing has arrived at all, give up after `2 × timeout`.
//!
//! This is a heuristic, not framing: no length prefix or terminator is
//! assumed.

use bytes::{Bytes, BytesMut};
use std::io;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use unilink_core::POLL_INTERVAL;

/// A transport primitive that can attempt a receive without blocking
///
/// `Ok(0)` means nothing usable arrived (end of stream, or a datagram that
/// was filtered out). `Err` with [`io::ErrorKind::WouldBlock`] means no data
/// is ready yet.
pub trait TryReceive {
    fn try_receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl TryReceive for tokio::net::TcpStream {
    fn try_receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.try_read(buf)
    }
}

/// Largest single receive; holds any UDP datagram
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Collect up to `size` bytes from `source`
///
/// Receive errors are swallowed: only the deadlines end the loop, and the
/// bytes gathered so far (possibly none) are returned. Memory grows with the
/// data received, not with `size`.
pub async fn accumulate<R>(source: &mut R, size: usize, timeout: Duration) -> Bytes
where
    R: TryReceive + ?Sized,
{
    let mut collected = BytesMut::new();
    if size == 0 {
        return collected.freeze();
    }

    let idle_limit = timeout.saturating_mul(2);
    let mut chunk = vec![0u8; size.min(READ_CHUNK_SIZE)];
    let mut begin = Instant::now();
    loop {
        let elapsed = begin.elapsed();
        if !collected.is_empty() && elapsed > timeout {
            break;
        }
        if elapsed > idle_limit {
            break;
        }

        let remaining = (size - collected.len()).min(chunk.len());
        match source.try_receive(&mut chunk[..remaining]) {
            Ok(0) => sleep(POLL_INTERVAL).await,
            Ok(n) => {
                collected.extend_from_slice(&chunk[..n]);
                if collected.len() == size {
                    break;
                }
                begin = Instant::now();
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => sleep(POLL_INTERVAL).await,
            Err(e) => {
                log::trace!("ignoring receive error while accumulating: {}", e);
                sleep(POLL_INTERVAL).await;
            }
        }
    }

    collected.freeze()
}
