//! Modem activity status reported by `AT+CPAS`

use std::fmt;

/// Command querying the phone activity status
pub const CPAS_COMMAND: &str = "AT+CPAS\r\n";

/// Phone activity status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemStatus {
    Ready,
    Unavailable,
    Unknown,
    Ringing,
    CallInProgress,
    Asleep,
}

impl ModemStatus {
    /// Map a `+CPAS` code digit
    pub fn from_code(code: char) -> Self {
        match code {
            '0' => ModemStatus::Ready,
            '1' => ModemStatus::Unavailable,
            '2' => ModemStatus::Unknown,
            '3' => ModemStatus::Ringing,
            '4' => ModemStatus::CallInProgress,
            '5' => ModemStatus::Asleep,
            _ => ModemStatus::Unknown,
        }
    }

    /// Interpret a raw `AT+CPAS` reply
    ///
    /// The trailing `\r\nOK\r\n` envelope is stripped and the last remaining
    /// character is taken as the code. Echoed commands and other noise before
    /// it are ignored; anything unparseable is [`ModemStatus::Unknown`].
    pub fn parse(reply: &str) -> Self {
        let body = reply.trim_end();
        let body = body.strip_suffix("OK").unwrap_or(body).trim_end();
        body.chars().last().map_or(ModemStatus::Unknown, ModemStatus::from_code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModemStatus::Ready => "ready",
            ModemStatus::Unavailable => "unavailable",
            ModemStatus::Unknown => "unknown",
            ModemStatus::Ringing => "ringing",
            ModemStatus::CallInProgress => "call in progress",
            ModemStatus::Asleep => "asleep",
        }
    }
}

impl fmt::Display for ModemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replies() {
        assert_eq!(ModemStatus::parse("+CPAS: 0\r\nOK\r\n"), ModemStatus::Ready);
        assert_eq!(
            ModemStatus::parse("AT+CPAS\r\r\n+CPAS: 4\r\n\r\nOK\r\n"),
            ModemStatus::CallInProgress
        );
        assert_eq!(ModemStatus::parse("+CPAS: 3"), ModemStatus::Ringing);
        assert_eq!(ModemStatus::parse("\r\n+CPAS: 5\r\n"), ModemStatus::Asleep);
    }

    #[test]
    fn test_unparseable_is_unknown() {
        assert_eq!(ModemStatus::parse(""), ModemStatus::Unknown);
        assert_eq!(ModemStatus::parse("\r\nOK\r\n"), ModemStatus::Unknown);
        assert_eq!(ModemStatus::parse("ERROR\r\n"), ModemStatus::Unknown);
        assert_eq!(ModemStatus::parse("+CPAS: 9\r\nOK\r\n"), ModemStatus::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(ModemStatus::CallInProgress.to_string(), "call in progress");
        assert_eq!(ModemStatus::from_code('1').to_string(), "unavailable");
    }
}
