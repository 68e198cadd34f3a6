//! GSM session state machine

use unilink_core::{LinkError, LinkResult};

/// GSM modem session state
///
/// Tracks where a [`GsmLink`](crate::GsmLink) is in the call lifecycle so
/// that dialing, forwarding and hang-up only run in the state they expect.
///
/// # State Transitions
/// ```text
/// Closed -> Dialing (on open())
/// Dialing -> Open (CONNECT received)
/// Dialing -> Closed (BUSY / NO CARRIER / ERROR, or attempts exhausted)
/// Open -> HangingUp (on close())
/// HangingUp -> Closed (wrapped link closed)
/// ```
///
/// # Ownership
/// The wrapped link is only reachable through `&` from outside the session,
/// so every open or close of the modem link goes through these transitions.
/// `Open` therefore implies the modem link is open and a call is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GsmState {
    /// No call in progress (initial state)
    ///
    /// In this state:
    /// - No call is established
    /// - The wrapped link may still be open, e.g. after a failed dial or hang-up
    /// - `open()` starts a new dial
    /// - `close()` only closes the wrapped link
    #[default]
    Closed,
    /// A call is being placed
    ///
    /// In this state:
    /// - The wrapped link is open
    /// - `ATD` has been sent
    /// - The modem is polled until a verdict or the attempt cap
    /// - Caller payloads are not forwarded yet
    Dialing,
    /// The remote side answered
    ///
    /// In this state:
    /// - `CONNECT` has been received
    /// - Reads and writes reach the callee
    /// - `open()` is a no-op
    Open,
    /// The call is being torn down
    ///
    /// In this state:
    /// - The `+++` escape and `ATH` are being sent
    /// - Replies are read but never fail the hang-up
    /// - The wrapped link is closed afterwards in every case
    HangingUp,
}

impl GsmState {
    /// Check if the call is established
    pub fn is_open(&self) -> bool {
        matches!(self, GsmState::Open)
    }

    /// Validate state transition
    ///
    /// # Valid Transitions
    /// - `Closed` -> `Dialing`
    /// - `Dialing` -> `Open` | `Closed`
    /// - `Open` -> `HangingUp` | `Closed`
    /// - `HangingUp` -> `Closed`
    /// - `Closed` -> `Closed`, `Open` -> `Open` (idempotent open/close)
    pub fn validate_transition(&self, new_state: GsmState) -> LinkResult<()> {
        let valid = match (*self, new_state) {
            (GsmState::Closed, GsmState::Dialing) => true,
            (GsmState::Dialing, GsmState::Open) => true,
            (GsmState::Dialing, GsmState::Closed) => true,
            (GsmState::Open, GsmState::HangingUp) => true,
            (GsmState::Open, GsmState::Closed) => true,
            (GsmState::HangingUp, GsmState::Closed) => true,
            (GsmState::Closed, GsmState::Closed) => true,
            (GsmState::Open, GsmState::Open) => true,
            _ => false,
        };

        if valid {
            Ok(())
        } else {
            Err(LinkError::InvalidConfig(format!(
                "Invalid GSM state transition: {:?} -> {:?}",
                self, new_state
            )))
        }
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            GsmState::Closed => "Closed",
            GsmState::Dialing => "Dialing",
            GsmState::Open => "Open",
            GsmState::HangingUp => "HangingUp",
        }
    }
}
