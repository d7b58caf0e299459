//! Command-line client for the acquisition card
//!
//! Subcommands mirror the operator actions: list ports, list parameters,
//! read/write a parameter block, trigger an acquisition (optionally
//! exporting the frames to CSV), stop, reset.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use acqlink_core::export::{write_frames_csv, FRAME_HEADER_WORDS};
use acqlink_core::protocol::{
    list_ports, LinkConfig, ParamId, ReplyPacket, SerialLink, Session, DEFAULT_BAUD_RATE,
    DEFAULT_TIMEOUT_MS,
};

#[derive(Parser)]
#[command(name = "acqlink", version, about = "Serial client for the acquisition card")]
struct Cli {
    /// Serial port, e.g. /dev/ttyUSB0 or COM4
    #[arg(short, long, global = true, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Card identifier as 4 hex digits
    #[arg(long, global = true, value_parser = parse_hex16, default_value = "ffff")]
    card_id: u16,

    /// Receive timeout in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Print replies as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available serial ports
    Ports,
    /// List known parameters and their payload sizes
    Params,
    /// Read a parameter block
    Read {
        /// Parameter id as hex, e.g. 0030
        #[arg(value_parser = parse_param)]
        param: ParamId,
    },
    /// Write a parameter block
    Write {
        /// Parameter id as hex, e.g. 0030
        #[arg(value_parser = parse_param)]
        param: ParamId,
        /// One hex word per payload slot
        #[arg(value_parser = parse_hex32, required = true)]
        values: Vec<u32>,
    },
    /// Trigger an acquisition and collect the returned frames
    Acquire {
        /// Write frame payloads to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Leading payload words to skip when exporting
        #[arg(long, default_value_t = FRAME_HEADER_WORDS)]
        skip: usize,
    },
    /// Stop a running acquisition
    Stop,
    /// Reset the card
    Reset,
}

fn parse_hex16(s: &str) -> Result<u16, String> {
    u16::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_hex32(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<ParamId, String> {
    let raw = parse_hex16(s)?;
    ParamId::from_raw(raw).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Ports => {
            for port in list_ports() {
                match &port.product {
                    Some(product) => println!("{}  ({})", port.name, product),
                    None => println!("{}", port.name),
                }
            }
            Ok(())
        }
        Commands::Params => {
            for param in ParamId::ALL {
                println!(
                    "{:#06x}  {:<14}  {} word(s)",
                    param.raw(),
                    format!("{param:?}"),
                    param.word_count()
                );
            }
            Ok(())
        }
        Commands::Read { param } => {
            let mut session = connect(&cli)?;
            let reply = session
                .read_param(*param)
                .with_context(|| format!("reading {param:?}"))?;
            print_reply(&reply, cli.json)
        }
        Commands::Write { param, values } => {
            let mut session = connect(&cli)?;
            let reply = session
                .write_param(*param, values)
                .with_context(|| format!("writing {param:?}"))?;
            print_reply(&reply, cli.json)
        }
        Commands::Acquire { output, skip } => {
            let mut session = connect(&cli)?;
            let outcome = session
                .start_acquisition()
                .context("starting acquisition")?;
            debug!(frames = outcome.frames.len(), "acquisition drained");
            println!("received {} data frame(s)", outcome.frames.len());

            if let Some(path) = output {
                write_frames_csv(path, &outcome.frames, *skip)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("wrote {}", path.display());
            }
            if let Some(err) = outcome.aborted {
                bail!("acquisition aborted early: {err}");
            }
            Ok(())
        }
        Commands::Stop => {
            let mut session = connect(&cli)?;
            let reply = session.stop().context("stopping acquisition")?;
            print_reply(&reply, cli.json)
        }
        Commands::Reset => {
            let mut session = connect(&cli)?;
            let reply = session.reset().context("resetting card")?;
            print_reply(&reply, cli.json)
        }
    }
}

fn connect(cli: &Cli) -> Result<Session<SerialLink>> {
    debug!(port = %cli.port, baud = cli.baud, card_id = cli.card_id, "opening serial link");
    let link = SerialLink::open(LinkConfig {
        port_name: cli.port.clone(),
        baud_rate: cli.baud,
        ..LinkConfig::default()
    })
    .with_context(|| format!("opening {}", cli.port))?;

    Ok(Session::new(link)
        .with_card_id(cli.card_id)
        .with_timeout(Duration::from_millis(cli.timeout_ms)))
}

fn print_reply(reply: &ReplyPacket, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
        return Ok(());
    }

    let status = match (reply.ack_type, reply.ack_status) {
        (Some(cmd), Some(status)) => format!("{cmd:?} -> {status:?}"),
        _ => "unrecognized ack word".to_string(),
    };
    println!("reply: {status}");
    println!("card {:#06x}, param {:#06x}", reply.card_id, reply.param_id);
    if !reply.payload.is_empty() {
        let words: Vec<String> = reply.payload.iter().map(|w| w.to_string()).collect();
        println!("payload: {}", words.join(" "));
    }
    Ok(())
}
