//! GSM modem sessions for unilink
//!
//! A [`GsmLink`] wraps another link (normally a serial port wired to a
//! modem), dials a phone number when opened and hangs up when closed.
//!
//! ```no_run
//! use unilink_gsm::GsmLink;
//! use unilink_transport::{Link, SerialLink};
//!
//! # async fn run() -> unilink_core::LinkResult<()> {
//! let modem = SerialLink::new_simple("/dev/ttyUSB0", unilink_gsm::DEFAULT_GSM_BAUD_RATE);
//! let mut call = GsmLink::new("0612345678", modem);
//! call.open().await?;
//! call.write("hello".into()).await?;
//! call.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod state;
pub mod status;

pub use session::{
    GsmLink, GsmSettings, DEFAULT_GSM_BAUD_RATE, DIAL_ATTEMPTS, DIAL_POLL_INTERVAL,
    ESCAPE_SEQUENCE, HANG_UP_COMMAND,
};
pub use state::GsmState;
pub use status::{ModemStatus, CPAS_COMMAND};
