//! Textual link descriptors
//!
//! A descriptor names a link the same way [`Link::url`](unilink_transport::Link::url)
//! prints it:
//!
//! ```text
//! tcp:<host>:<port>
//! udp:<host>:<port>
//! serial:<port>[:<baud>[:<bits><parity><stop>]]
//! gsm:<phone>:<descriptor>
//! ```
//!
//! Schemes are case-insensitive. IPv6 hosts may be written in brackets.

use std::fmt;
use std::str::FromStr;
use unilink_core::{LinkError, LinkResult};
use unilink_transport::{Parity, PortId};

/// Serial character framing, e.g. `8N1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    pub byte_size: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl Framing {
    pub fn new(byte_size: u8, parity: Parity, stop_bits: u8) -> Self {
        Self {
            byte_size,
            parity,
            stop_bits,
        }
    }
}

impl Default for Framing {
    fn default() -> Self {
        Self::new(8, Parity::None, 1)
    }
}

impl FromStr for Framing {
    type Err = LinkError;

    fn from_str(s: &str) -> LinkResult<Self> {
        let chars: Vec<char> = s.chars().collect();
        let &[bits, parity, stop] = chars.as_slice() else {
            return Err(LinkError::InvalidConfig(format!("invalid framing '{}'", s)));
        };

        let byte_size = bits
            .to_digit(10)
            .filter(|n| (5..=8).contains(n))
            .ok_or_else(|| LinkError::InvalidConfig(format!("invalid byte size in '{}'", s)))?;
        let stop_bits = stop
            .to_digit(10)
            .filter(|n| *n == 1 || *n == 2)
            .ok_or_else(|| LinkError::InvalidConfig(format!("invalid stop bits in '{}'", s)))?;

        Ok(Self::new(byte_size as u8, Parity::try_from(parity)?, stop_bits as u8))
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.byte_size, self.parity.letter(), self.stop_bits)
    }
}

/// Parsed link descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Tcp {
        host: String,
        port: u16,
    },
    Udp {
        host: String,
        port: u16,
    },
    /// Missing baud rate and framing fall back to the builder's defaults
    Serial {
        port: PortId,
        baud_rate: Option<u32>,
        framing: Option<Framing>,
    },
    /// Call `phone` through the modem reached by `modem`
    Gsm {
        phone: String,
        modem: Box<Descriptor>,
    },
}

impl Descriptor {
    /// Scheme name as written in descriptors
    pub fn scheme(&self) -> &'static str {
        match self {
            Descriptor::Tcp { .. } => "tcp",
            Descriptor::Udp { .. } => "udp",
            Descriptor::Serial { .. } => "serial",
            Descriptor::Gsm { .. } => "gsm",
        }
    }
}

fn parse_endpoint(scheme: &str, rest: &str) -> LinkResult<(String, u16)> {
    let (host, port) = rest.rsplit_once(':').ok_or_else(|| {
        LinkError::InvalidConfig(format!("{} descriptor needs <host>:<port>, got '{}'", scheme, rest))
    })?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(LinkError::InvalidConfig(format!("{} descriptor has no host", scheme)));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| LinkError::InvalidConfig(format!("invalid {} port '{}': {}", scheme, port, e)))?;
    Ok((host.to_string(), port))
}

fn parse_serial(rest: &str) -> LinkResult<Descriptor> {
    let mut parts = rest.split(':');
    let port = match parts.next() {
        Some(port) if !port.is_empty() => PortId::from(port),
        _ => return Err(LinkError::invalid_config("serial descriptor has no port")),
    };
    let baud_rate = parts
        .next()
        .map(|baud| {
            baud.parse::<u32>()
                .map_err(|e| LinkError::InvalidConfig(format!("invalid baud rate '{}': {}", baud, e)))
        })
        .transpose()?;
    let framing = parts.next().map(Framing::from_str).transpose()?;
    if parts.next().is_some() {
        return Err(LinkError::InvalidConfig(format!(
            "too many fields in serial descriptor '{}'",
            rest
        )));
    }
    Ok(Descriptor::Serial {
        port,
        baud_rate,
        framing,
    })
}

fn parse_gsm(rest: &str) -> LinkResult<Descriptor> {
    let (phone, modem) = rest.split_once(':').ok_or_else(|| {
        LinkError::InvalidConfig(format!("gsm descriptor needs <phone>:<descriptor>, got '{}'", rest))
    })?;
    if phone.is_empty() {
        return Err(LinkError::invalid_config("gsm descriptor has no phone number"));
    }
    let modem: Descriptor = modem.parse()?;
    if let Descriptor::Gsm { .. } = modem {
        return Err(LinkError::invalid_config("a GSM call cannot be carried by another GSM call"));
    }
    Ok(Descriptor::Gsm {
        phone: phone.to_string(),
        modem: Box::new(modem),
    })
}

impl FromStr for Descriptor {
    type Err = LinkError;

    fn from_str(s: &str) -> LinkResult<Self> {
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| LinkError::InvalidConfig(format!("descriptor '{}' has no scheme", s)))?;

        match scheme.to_ascii_lowercase().as_str() {
            "tcp" => parse_endpoint("tcp", rest).map(|(host, port)| Descriptor::Tcp { host, port }),
            "udp" => parse_endpoint("udp", rest).map(|(host, port)| Descriptor::Udp { host, port }),
            "serial" => parse_serial(rest),
            "gsm" => parse_gsm(rest),
            other => Err(LinkError::InvalidConfig(format!("unknown link scheme '{}'", other))),
        }
    }
}

fn write_host(f: &mut fmt::Formatter<'_>, host: &str) -> fmt::Result {
    if host.contains(':') {
        write!(f, "[{}]", host)
    } else {
        f.write_str(host)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Tcp { host, port } | Descriptor::Udp { host, port } => {
                write!(f, "{}:", self.scheme())?;
                write_host(f, host)?;
                write!(f, ":{}", port)
            }
            Descriptor::Serial {
                port,
                baud_rate,
                framing,
            } => {
                write!(f, "serial:{}", port)?;
                if let Some(baud_rate) = baud_rate {
                    write!(f, ":{}", baud_rate)?;
                    if let Some(framing) = framing {
                        write!(f, ":{}", framing)?;
                    }
                }
                Ok(())
            }
            Descriptor::Gsm { phone, modem } => write!(f, "gsm:{}:{}", phone, modem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Descriptor {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(
            parse("tcp:localhost:4059"),
            Descriptor::Tcp {
                host: "localhost".to_string(),
                port: 4059
            }
        );
        assert_eq!(
            parse("UDP:10.0.0.2:7"),
            Descriptor::Udp {
                host: "10.0.0.2".to_string(),
                port: 7
            }
        );
        assert_eq!(
            parse("tcp:[::1]:7"),
            Descriptor::Tcp {
                host: "::1".to_string(),
                port: 7
            }
        );
    }

    #[test]
    fn test_parse_serial() {
        assert_eq!(
            parse("serial:/dev/ttyUSB0"),
            Descriptor::Serial {
                port: PortId::Path("/dev/ttyUSB0".to_string()),
                baud_rate: None,
                framing: None
            }
        );
        assert_eq!(
            parse("Serial:COM3:9600"),
            Descriptor::Serial {
                port: PortId::Path("COM3".to_string()),
                baud_rate: Some(9600),
                framing: None
            }
        );
        assert_eq!(
            parse("serial:0:300:7e1"),
            Descriptor::Serial {
                port: PortId::Index(0),
                baud_rate: Some(300),
                framing: Some(Framing::new(7, Parity::Even, 1))
            }
        );
    }

    #[test]
    fn test_parse_gsm() {
        let descriptor = parse("gsm:+33612345678:serial:/dev/ttyUSB1");
        let Descriptor::Gsm { phone, modem } = descriptor else {
            panic!("expected a GSM descriptor");
        };
        assert_eq!(phone, "+33612345678");
        assert_eq!(modem.scheme(), "serial");
    }

    #[test]
    fn test_reject_malformed() {
        for bad in [
            "",
            "localhost:80",
            "ftp:host:21",
            "tcp:localhost",
            "tcp:localhost:http",
            "tcp::80",
            "udp:host:70000",
            "serial:",
            "serial:/dev/ttyS0:fast",
            "serial:/dev/ttyS0:9600:8X1",
            "serial:/dev/ttyS0:9600:9N1",
            "serial:/dev/ttyS0:9600:8N3",
            "serial:/dev/ttyS0:9600:8N1:extra",
            "gsm:0612345678",
            "gsm::serial:0",
            "gsm:1:gsm:2:serial:0",
        ] {
            let err = bad.parse::<Descriptor>().unwrap_err();
            assert!(matches!(err, LinkError::InvalidConfig(_)), "{} -> {}", bad, err);
        }
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "tcp:127.0.0.1:4059",
            "udp:[::1]:7",
            "serial:/dev/ttyUSB0",
            "serial:/dev/ttyUSB0:19200",
            "serial:2:38400:8N1",
            "gsm:0612345678:serial:/dev/ttyUSB0:38400:8N1",
        ] {
            assert_eq!(parse(text).to_string(), text);
        }
        // Scheme case is normalized
        assert_eq!(parse("TCP:host:1").to_string(), "tcp:host:1");
    }

    #[test]
    fn test_framing() {
        assert_eq!(Framing::default().to_string(), "8N1");
        assert_eq!("5o2".parse::<Framing>().unwrap(), Framing::new(5, Parity::Odd, 2));
        assert!("8N".parse::<Framing>().is_err());
        assert!("8N12".parse::<Framing>().is_err());
    }
}
