//! `linkcat`: open a link, write one payload, print the reply
//!
//! ```text
//! linkcat tcp:10.0.0.2:4059 "hello"
//! linkcat --hex udp:10.0.0.2:4059 "06 00 FF"
//! RUST_LOG=debug linkcat gsm:0612345678:serial:/dev/ttyUSB0 "AT"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use unilink::{link_from_url, Link, Payload, MAX_STRING_SIZE};

/// Write a payload to a link and print what comes back.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Link descriptor, e.g. tcp:host:port, udp:host:port,
    /// serial:port[:baud[:8N1]] or gsm:phone:descriptor
    descriptor: String,

    /// Payload to write; nothing is written when omitted
    payload: Option<String>,

    /// Read the payload as hex pairs and print the reply as hex
    #[arg(long)]
    hex: bool,

    /// Maximum number of bytes to read
    #[arg(short, long, default_value_t = MAX_STRING_SIZE)]
    size: usize,

    /// Read deadline in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).with_context(|| format!("invalid hex payload '{}'", input))
}

fn render(reply: &Payload, as_hex: bool) -> String {
    match reply {
        _ if as_hex => hex::encode_upper(reply.as_bytes()),
        Payload::Text(text) => text.clone(),
        Payload::Bytes(_) => reply.to_string(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut link = link_from_url(&cli.descriptor)
        .with_context(|| format!("cannot build link from '{}'", cli.descriptor))?;
    link.set_timeout(Duration::from_millis(cli.timeout_ms));
    link.open()
        .await
        .with_context(|| format!("cannot open {}", link.describe()))?;

    if let Some(payload) = &cli.payload {
        let payload = if cli.hex {
            Payload::from(parse_hex(payload)?)
        } else {
            Payload::from(payload.as_str())
        };
        link.write(payload).await.context("write failed")?;
    }

    let reply = link.read(Some(cli.size), None).await.context("read failed")?;
    println!("{}", render(&reply, cli.hex));

    link.close().await.context("close failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG to control verbosity.
    unilink::init_logger();

    let cli = Cli::parse();
    log::debug!("{:?}", cli);
    run(cli).await
}
