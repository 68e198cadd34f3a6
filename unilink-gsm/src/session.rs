//! GSM modem session over a wrapped link
//!
//! [`GsmLink`] drives a Hayes-compatible modem reached through another link,
//! usually a [`SerialLink`](unilink_transport::SerialLink). Opening the link
//! dials the configured number; closing it hangs up. In between, reads and
//! writes pass through to the wrapped link unchanged.
//!
//! Modems are noisy line devices without strict framing, so replies are
//! scanned for keywords instead of being matched exactly, and every polling
//! loop is bounded.

use crate::state::GsmState;
use crate::status::{ModemStatus, CPAS_COMMAND};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use unilink_core::{hex_pairs, LinkError, LinkResult, Payload, DRAIN_TIMEOUT, MAX_STRING_SIZE};
use unilink_transport::Link;

/// Hard cap on the number of polls while waiting for the dial verdict
pub const DIAL_ATTEMPTS: usize = 100;

/// Pause between two dial polls
pub const DIAL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default baud rate of a modem behind a serial port
pub const DEFAULT_GSM_BAUD_RATE: u32 = 38400;

/// Escape from data mode back to command mode
pub const ESCAPE_SEQUENCE: &str = "+++";

/// Hang up the current call
pub const HANG_UP_COMMAND: &str = "ATH\r";

/// Bytes read per dial poll
const DIAL_REPLY_SIZE: usize = 64;

/// Length of a `\r\nOK\r\n` acknowledgement
const ACK_SIZE: usize = 6;

/// Dial replies kept for keyword matching across reads
const TRANSCRIPT_LIMIT: usize = 64;

/// Replies that end a dial attempt unsuccessfully
const FAILURE_REPLIES: [&str; 3] = ["BUSY", "NO CARRIER", "ERROR"];

/// GSM session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsmSettings {
    phone: String,
    dial_attempts: usize,
    poll_interval: Duration,
    ack_timeout: Option<Duration>,
    ready_check: bool,
}

impl GsmSettings {
    /// Create settings for dialing `phone` with the default polling policy
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            dial_attempts: DIAL_ATTEMPTS,
            poll_interval: DIAL_POLL_INTERVAL,
            ack_timeout: None,
            ready_check: false,
        }
    }

    /// Lower the number of dial polls; values above [`DIAL_ATTEMPTS`] are capped
    pub fn with_dial_attempts(mut self, attempts: usize) -> Self {
        self.dial_attempts = attempts.clamp(1, DIAL_ATTEMPTS);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Deadline for hang-up acknowledgements; defaults to the wrapped link's timeout
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = Some(timeout);
        self
    }

    /// Query `AT+CPAS` before dialing and hang up first unless the modem is ready
    pub fn with_ready_check(mut self, enabled: bool) -> Self {
        self.ready_check = enabled;
        self
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn dial_attempts(&self) -> usize {
        self.dial_attempts
    }
}

/// What the modem said about the dial so far
#[derive(Debug, PartialEq, Eq)]
enum DialVerdict {
    Connected,
    Failed(&'static str),
    Pending,
}

fn dial_verdict(transcript: &str) -> DialVerdict {
    if let Some(reply) = FAILURE_REPLIES.into_iter().find(|reply| transcript.contains(reply)) {
        return DialVerdict::Failed(reply);
    }
    if transcript.contains("CONNECT") {
        DialVerdict::Connected
    } else {
        DialVerdict::Pending
    }
}

/// Append `reply` to `transcript`, keeping only the last [`TRANSCRIPT_LIMIT`] bytes
fn push_reply(transcript: &mut String, reply: &[u8]) {
    transcript.push_str(&String::from_utf8_lossy(reply));
    if transcript.len() > TRANSCRIPT_LIMIT {
        let start = transcript.len() - TRANSCRIPT_LIMIT;
        let cut = (start..=transcript.len())
            .find(|i| transcript.is_char_boundary(*i))
            .unwrap_or(transcript.len());
        transcript.drain(..cut);
    }
}

/// Call session to a remote modem, carried by the wrapped link `L`
pub struct GsmLink<L> {
    inner: L,
    settings: GsmSettings,
    state: GsmState,
}

impl<L: Link> GsmLink<L> {
    /// Dial `phone` through `inner` when opened
    pub fn new(phone: impl Into<String>, inner: L) -> Self {
        Self::with_settings(GsmSettings::new(phone), inner)
    }

    pub fn with_settings(settings: GsmSettings, inner: L) -> Self {
        Self {
            inner,
            settings,
            state: GsmState::Closed,
        }
    }

    pub fn state(&self) -> GsmState {
        self.state
    }

    pub fn phone(&self) -> &str {
        &self.settings.phone
    }

    pub fn settings(&self) -> &GsmSettings {
        &self.settings
    }

    /// The wrapped link
    pub fn inner(&self) -> &L {
        &self.inner
    }

    fn transition_to(&mut self, new_state: GsmState) -> LinkResult<()> {
        self.state.validate_transition(new_state)?;
        log::trace!("GSM {}: {} -> {}", self.settings.phone, self.state.as_str(), new_state.as_str());
        self.state = new_state;
        Ok(())
    }

    /// Ask the modem for its activity status
    ///
    /// Never fails: I/O errors and unreadable replies map to
    /// [`ModemStatus::Unknown`].
    pub async fn status(&mut self) -> ModemStatus {
        if let Err(e) = self.inner.write(Payload::from(CPAS_COMMAND)).await {
            log::debug!("GSM status query failed: {}", e);
            return ModemStatus::Unknown;
        }
        let status = match self.inner.read_bytes(Some(MAX_STRING_SIZE), None).await {
            Ok(reply) => ModemStatus::parse(&String::from_utf8_lossy(&reply)),
            Err(e) => {
                log::debug!("GSM status reply failed: {}", e);
                ModemStatus::Unknown
            }
        };
        log::info!("GSM status: {}", status);
        status
    }

    /// Send `command` and read a short acknowledgement, ignoring failures
    async fn command(&mut self, command: &str, ack_timeout: Duration) {
        if let Err(e) = self.inner.write(Payload::from(command)).await {
            log::debug!("GSM command {:?} failed: {}", command, e);
            return;
        }
        match self.inner.read_bytes(Some(ACK_SIZE), Some(ack_timeout)).await {
            Ok(ack) => log::debug!("GSM {:?} acknowledged with <{}>", command, hex_pairs(&ack)),
            Err(e) => log::debug!("GSM {:?} not acknowledged: {}", command, e),
        }
    }

    fn ack_timeout(&self) -> Duration {
        self.settings.ack_timeout.unwrap_or_else(|| self.inner.timeout())
    }

    /// Dial the configured number and wait for the modem's verdict
    async fn dial(&mut self) -> LinkResult<()> {
        self.transition_to(GsmState::Dialing)?;

        if let Err(e) = self.inner.open().await {
            self.transition_to(GsmState::Closed)?;
            return Err(e);
        }

        if self.settings.ready_check {
            let status = self.status().await;
            if status != ModemStatus::Ready {
                log::info!("GSM modem is {}, hanging up before dialing", status);
                let ack_timeout = self.ack_timeout();
                self.command(HANG_UP_COMMAND, ack_timeout).await;
            }
        }

        log::info!("GSM call {}", self.settings.phone);
        let dial_command = format!("ATD{}\r", self.settings.phone);
        if let Err(e) = self.inner.write(Payload::Text(dial_command)).await {
            return self.abort_dial(format!("cannot send dial command: {}", e)).await;
        }

        let mut transcript = String::new();
        for attempt in 1..=self.settings.dial_attempts {
            match self.inner.read_bytes(Some(DIAL_REPLY_SIZE), None).await {
                Ok(reply) => push_reply(&mut transcript, &reply),
                Err(e) => log::debug!("GSM poll {} failed: {}", attempt, e),
            }

            match dial_verdict(&transcript) {
                DialVerdict::Connected => {
                    // Trailing bytes of the CONNECT line belong to the handshake
                    let _ = self.inner.receive(MAX_STRING_SIZE, DRAIN_TIMEOUT).await;
                    self.transition_to(GsmState::Open)?;
                    log::info!("GSM client {} is ready", self.settings.phone);
                    return Ok(());
                }
                DialVerdict::Failed(reply) => {
                    return self
                        .abort_dial(format!("{} replied {}", self.settings.phone, reply))
                        .await;
                }
                DialVerdict::Pending => {
                    log::info!(
                        "GSM dialing {} ({}/{}): {:?}",
                        self.settings.phone,
                        attempt,
                        self.settings.dial_attempts,
                        transcript.trim()
                    );
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            }
        }

        self.abort_dial(format!(
            "no answer from {} after {} attempts",
            self.settings.phone, self.settings.dial_attempts
        ))
        .await
    }

    /// Release the wrapped link so a later dial can reuse it, then report
    /// the device as unavailable
    async fn abort_dial(&mut self, reason: String) -> LinkResult<()> {
        log::warn!("GSM dial failed: {}", reason);
        if let Err(e) = self.inner.close().await {
            log::warn!("GSM could not close wrapped link: {}", e);
        }
        self.transition_to(GsmState::Closed)?;
        Err(LinkError::DeviceUnavailable(reason))
    }

    /// Leave data mode and hang up, tolerating any reply
    async fn hang_up(&mut self) -> LinkResult<()> {
        self.transition_to(GsmState::HangingUp)?;
        let ack_timeout = self.ack_timeout();
        self.command(ESCAPE_SEQUENCE, ack_timeout).await;
        self.command(HANG_UP_COMMAND, ack_timeout).await;
        Ok(())
    }
}

#[async_trait]
impl<L: Link> Link for GsmLink<L> {
    async fn open(&mut self) -> LinkResult<()> {
        if self.state.is_open() {
            return Ok(());
        }
        // A dial or hang-up cancelled midway leaves its state behind
        self.state = GsmState::Closed;
        self.dial().await
    }

    async fn close(&mut self) -> LinkResult<()> {
        let was_open = self.state.is_open();
        if was_open {
            self.hang_up().await?;
        }

        // Closed anyway: a failed session must not keep the port busy
        let result = self.inner.close().await;
        self.transition_to(GsmState::Closed)?;
        if was_open {
            log::info!("GSM call {} was closed", self.settings.phone);
        }
        result
    }

    async fn send(&mut self, data: &[u8]) -> LinkResult<()> {
        self.inner.send(data).await
    }

    async fn receive(&mut self, size: usize, timeout: Duration) -> LinkResult<Bytes> {
        self.inner.receive(size, timeout).await
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.inner.set_timeout(timeout);
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    fn url(&self) -> String {
        format!("gsm:{}:{}", self.settings.phone, self.inner.url())
    }

    fn kind(&self) -> &'static str {
        "GsmLink"
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

impl<L> Drop for GsmLink<L> {
    fn drop(&mut self) {
        if self.state.is_open() {
            log::debug!(
                "GSM call {} dropped without hang-up, releasing wrapped link",
                self.settings.phone
            );
        }
    }
}

impl<L: Link> std::fmt::Debug for GsmLink<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GsmLink")
            .field("url", &self.url())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use mockall::predicate;
    use tokio::time::Instant;
    use unilink_transport::MockLink;

    /// Wrapped link answering reads from a script and recording writes
    #[derive(Default)]
    struct ScriptedLink {
        replies: VecDeque<io::Result<Vec<u8>>>,
        sent: Vec<String>,
        open: bool,
        opens: usize,
        closes: usize,
        receives: usize,
        timeout: Duration,
    }

    impl ScriptedLink {
        fn replying(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|r| Ok(r.as_bytes().to_vec())).collect(),
                timeout: Duration::from_millis(100),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Link for ScriptedLink {
        async fn open(&mut self) -> LinkResult<()> {
            if !self.open {
                self.open = true;
                self.opens += 1;
            }
            Ok(())
        }

        async fn close(&mut self) -> LinkResult<()> {
            self.open = false;
            self.closes += 1;
            Ok(())
        }

        async fn send(&mut self, data: &[u8]) -> LinkResult<()> {
            self.sent.push(String::from_utf8_lossy(data).into_owned());
            Ok(())
        }

        async fn receive(&mut self, size: usize, _timeout: Duration) -> LinkResult<Bytes> {
            self.receives += 1;
            match self.replies.pop_front() {
                Some(Ok(mut reply)) => {
                    reply.truncate(size);
                    Ok(Bytes::from(reply))
                }
                Some(Err(e)) => Err(e.into()),
                None => Ok(Bytes::new()),
            }
        }

        fn set_timeout(&mut self, timeout: Duration) {
            self.timeout = timeout;
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        fn url(&self) -> String {
            "serial:/dev/ttyUSB0:38400:8N1".to_string()
        }

        fn kind(&self) -> &'static str {
            "ScriptedLink"
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn test_dial_verdict() {
        assert_eq!(dial_verdict("\r\nCONNECT 9600\r\n"), DialVerdict::Connected);
        assert_eq!(dial_verdict("ATD123\r\r\nBUSY\r\n"), DialVerdict::Failed("BUSY"));
        assert_eq!(dial_verdict("NO CARRIER"), DialVerdict::Failed("NO CARRIER"));
        assert_eq!(dial_verdict("\r\nERROR\r\n"), DialVerdict::Failed("ERROR"));
        assert_eq!(dial_verdict("ATD123\r"), DialVerdict::Pending);
        assert_eq!(dial_verdict(""), DialVerdict::Pending);
    }

    #[test]
    fn test_transcript_is_bounded() {
        let mut transcript = String::new();
        for _ in 0..10 {
            push_reply(&mut transcript, b"0123456789abcdef");
        }
        assert_eq!(transcript.len(), TRANSCRIPT_LIMIT);
        assert!(transcript.ends_with("0123456789abcdef"));

        // Invalid UTF-8 is replaced, never split mid-character
        push_reply(&mut transcript, &[0xFF; 40]);
        assert!(transcript.len() <= TRANSCRIPT_LIMIT);
    }

    #[test]
    fn test_dial_attempts_are_capped() {
        assert_eq!(GsmSettings::new("1").dial_attempts(), DIAL_ATTEMPTS);
        assert_eq!(GsmSettings::new("1").with_dial_attempts(500).dial_attempts(), DIAL_ATTEMPTS);
        assert_eq!(GsmSettings::new("1").with_dial_attempts(0).dial_attempts(), 1);
        assert_eq!(GsmSettings::new("1").with_dial_attempts(5).dial_attempts(), 5);
    }

    #[test]
    fn test_identity() {
        let gsm = GsmLink::new("0612345678", ScriptedLink::default());
        assert_eq!(gsm.url(), "gsm:0612345678:serial:/dev/ttyUSB0:38400:8N1");
        assert_eq!(gsm.describe(), "<GsmLink gsm:0612345678:serial:/dev/ttyUSB0:38400:8N1>");
        assert_eq!(gsm.state(), GsmState::Closed);
        assert!(!gsm.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_after_several_polls() {
        let inner = ScriptedLink::replying(&[
            "ATD0612345678\r",
            "",
            "\r\n",
            "",
            "\r\nCONNECT 9600\r\n",
        ]);
        let mut gsm = GsmLink::new("0612345678", inner);

        let start = Instant::now();
        gsm.open().await.unwrap();

        assert_eq!(gsm.state(), GsmState::Open);
        assert!(gsm.is_open());
        assert_eq!(gsm.inner().sent, vec!["ATD0612345678\r"]);
        assert_eq!(gsm.inner().opens, 1);
        assert!(gsm.inner().is_open());
        // Four inconclusive polls, one second apart
        assert_eq!(start.elapsed(), DIAL_POLL_INTERVAL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_split_across_reads() {
        let inner = ScriptedLink::replying(&["\r\nCONN", "ECT 9600\r\n"]);
        let mut gsm = GsmLink::new("0612345678", inner);
        gsm.open().await.unwrap();
        assert_eq!(gsm.state(), GsmState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_closes_wrapped_link() {
        let inner = ScriptedLink::replying(&["", "", "\r\nBUSY\r\n", "\r\nCONNECT\r\n"]);
        let mut gsm = GsmLink::new("0612345678", inner);

        let err = gsm.open().await.unwrap_err();

        assert!(err.is_device_unavailable());
        assert_eq!(gsm.state(), GsmState::Closed);
        assert!(!gsm.inner().is_open());
        assert_eq!(gsm.inner().closes, 1);
        assert_eq!(gsm.inner().receives, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_carrier_and_error_fail_the_dial() {
        for reply in ["\r\nNO CARRIER\r\n", "\r\nERROR\r\n"] {
            let inner = ScriptedLink::replying(&[reply]);
            let mut gsm = GsmLink::new("0612345678", inner);
            assert!(gsm.open().await.unwrap_err().is_device_unavailable());
            assert!(!gsm.inner().is_open());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_modem_exhausts_attempts() {
        let mut gsm = GsmLink::new("0612345678", ScriptedLink::replying(&[]));

        let err = gsm.open().await.unwrap_err();

        assert!(err.is_device_unavailable());
        assert_eq!(gsm.inner().receives, DIAL_ATTEMPTS);
        assert!(!gsm.inner().is_open());
        assert_eq!(gsm.state(), GsmState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_are_transient() {
        let mut inner = ScriptedLink::replying(&[]);
        inner.replies = VecDeque::from(vec![
            Err(io::Error::new(io::ErrorKind::Other, "framing error")),
            Ok(b"\r\nCONNECT 9600\r\n".to_vec()),
        ]);
        let mut gsm = GsmLink::new("0612345678", inner);
        gsm.open().await.unwrap();
        assert!(gsm.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_redial_after_failure() {
        let inner = ScriptedLink::replying(&["BUSY", "CONNECT 9600"]);
        let mut gsm = GsmLink::new("0612345678", inner);

        assert!(gsm.open().await.is_err());
        gsm.open().await.unwrap();

        assert!(gsm.is_open());
        assert_eq!(gsm.inner().opens, 2);
        assert_eq!(gsm.inner().sent.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_is_idempotent() {
        let inner = ScriptedLink::replying(&["CONNECT 9600"]);
        let mut gsm = GsmLink::new("0612345678", inner);

        gsm.open().await.unwrap();
        gsm.open().await.unwrap();

        assert_eq!(gsm.inner().sent.len(), 1);
        assert_eq!(gsm.inner().opens, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_state_tracks_wrapped_link() {
        let inner = ScriptedLink::replying(&["CONNECT 9600"]);
        let mut gsm = GsmLink::new("0612345678", inner);
        assert_eq!((gsm.state(), gsm.inner().is_open()), (GsmState::Closed, false));

        gsm.open().await.unwrap();
        assert_eq!((gsm.state(), gsm.inner().is_open()), (GsmState::Open, true));
        assert!(gsm.is_open());

        gsm.close().await.unwrap();
        assert_eq!((gsm.state(), gsm.inner().is_open()), (GsmState::Closed, false));
        assert!(!gsm.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_up_tolerates_garbage() {
        let mut inner = ScriptedLink::replying(&["CONNECT 9600", ""]);
        inner.replies.push_back(Ok(vec![0xFF, 0xFE, 0x00, b'O', b'K']));
        inner.replies.push_back(Ok(vec![0x13, 0x11]));
        let mut gsm = GsmLink::new("0612345678", inner);
        gsm.open().await.unwrap();

        gsm.close().await.unwrap();

        assert_eq!(gsm.state(), GsmState::Closed);
        assert!(!gsm.inner().is_open());
        assert_eq!(gsm.inner().sent, vec!["ATD0612345678\r", "+++", "ATH\r"]);

        // Second close still releases the wrapped link, without hanging up again
        gsm.close().await.unwrap();
        assert_eq!(gsm.inner().sent.len(), 3);
        assert_eq!(gsm.inner().closes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwarding_while_open() {
        let inner = ScriptedLink::replying(&["CONNECT 9600", "", "pong"]);
        let mut gsm = GsmLink::new("0612345678", inner);
        gsm.open().await.unwrap();

        gsm.write("ping".into()).await.unwrap();
        assert_eq!(gsm.read(Some(4), None).await.unwrap(), "pong");
        assert_eq!(gsm.inner().sent.last().map(String::as_str), Some("ping"));

        gsm.set_timeout(Duration::from_secs(3));
        assert_eq!(gsm.inner().timeout(), Duration::from_secs(3));
        assert_eq!(gsm.timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_status() {
        let inner = ScriptedLink::replying(&["AT+CPAS\r\r\n+CPAS: 0\r\n\r\nOK\r\n"]);
        let mut gsm = GsmLink::new("0612345678", inner);
        assert_eq!(gsm.status().await, ModemStatus::Ready);
        assert_eq!(gsm.inner().sent, vec!["AT+CPAS\r\n"]);

        // Nothing more scripted: an empty reply
        assert_eq!(gsm.status().await, ModemStatus::Unknown);
    }

    #[tokio::test]
    async fn test_status_read_error_is_unknown() {
        let mut inner = ScriptedLink::replying(&[]);
        inner.replies.push_back(Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
        let mut gsm = GsmLink::new("0612345678", inner);
        assert_eq!(gsm.status().await, ModemStatus::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_check_hangs_up_busy_modem() {
        let inner = ScriptedLink::replying(&[
            "+CPAS: 4\r\n\r\nOK\r\n",
            "\r\nOK\r\n",
            "\r\nCONNECT 9600\r\n",
        ]);
        let settings = GsmSettings::new("0612345678").with_ready_check(true);
        let mut gsm = GsmLink::with_settings(settings, inner);

        gsm.open().await.unwrap();

        assert_eq!(gsm.inner().sent, vec!["AT+CPAS\r\n", "ATH\r", "ATD0612345678\r"]);
        assert!(gsm.is_open());
    }

    #[tokio::test]
    async fn test_close_when_closed_still_closes_wrapped_link() {
        let mut inner = MockLink::new();
        inner.expect_close().times(2).returning(|| Ok(()));
        let mut gsm = GsmLink::new("0612345678", inner);

        gsm.close().await.unwrap();
        gsm.close().await.unwrap();
        assert_eq!(gsm.state(), GsmState::Closed);
    }

    #[tokio::test]
    async fn test_hang_up_closes_wrapped_link_when_commands_fail() {
        let mut inner = MockLink::new();
        inner.expect_timeout().return_const(Duration::from_millis(100));
        inner.expect_url().return_const("mock:0".to_string());
        inner.expect_kind().return_const("MockLink");
        for command in [ESCAPE_SEQUENCE, HANG_UP_COMMAND] {
            inner
                .expect_write()
                .with(predicate::eq(Payload::from(command)))
                .times(1)
                .returning(|_| {
                    Err(LinkError::Connection(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")))
                });
        }
        inner.expect_read_bytes().never();
        inner.expect_close().times(1).returning(|| Ok(()));

        let mut gsm = GsmLink::new("0612345678", inner);
        gsm.state = GsmState::Open;

        gsm.close().await.unwrap();
        assert_eq!(gsm.state(), GsmState::Closed);
    }

    #[tokio::test]
    async fn test_wrapped_open_failure_is_reported() {
        let mut inner = MockLink::new();
        inner
            .expect_open()
            .times(1)
            .returning(|| Err(LinkError::Serial("no such port".to_string())));
        inner.expect_write().never();

        let mut gsm = GsmLink::new("0612345678", inner);
        let err = gsm.open().await.unwrap_err();

        assert!(matches!(err, LinkError::Serial(_)));
        assert_eq!(gsm.state(), GsmState::Closed);
    }
}
