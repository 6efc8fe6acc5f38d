use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use redrcp_reader::{Reader, ReaderConfig};
use redrcp_transport::SerialPortTransport;

use crate::exit::{protocol_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod exec;
pub mod info;
pub mod inventory;
pub mod ports;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version information.
    Version(VersionArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Connect to a reader and print its firmware version.
    Info(InfoArgs),
    /// Send one raw command and print the response payload.
    Exec(ExecArgs),
    /// Run a continuous inventory and print tags as they are read.
    Inventory(InventoryArgs),
    /// Decode frames from a captured byte stream.
    Decode(DecodeArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Version(args) => version::run(args),
        Command::Ports(args) => ports::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Exec(args) => exec::run(args, format),
        Command::Inventory(args) => inventory::run(args, format),
        Command::Decode(args) => decode::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Serial port name, or a JSON serial configuration object.
    pub endpoint: String,
    /// Response timeout (e.g. 2s, 500ms).
    #[arg(long, default_value = "500ms")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Serial port name, or a JSON serial configuration object.
    pub endpoint: String,
    /// Message code (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_code)]
    pub code: u8,
    /// Payload as hex digits (e.g. "01" or "00 01 A0").
    #[arg(long, default_value = "")]
    pub data: String,
    /// Response timeout (e.g. 2s, 500ms).
    #[arg(long, default_value = "500ms")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// Serial port name, or a JSON serial configuration object.
    pub endpoint: String,
    /// How long to read before stopping (e.g. 10s, 1500ms).
    #[arg(long, default_value = "5s")]
    pub duration: String,
    /// Stop after N tag reads.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file with raw bytes (or hex text with --hex).
    pub file: PathBuf,
    /// Treat the file as hex text; whitespace is ignored.
    #[arg(long)]
    pub hex: bool,
}

pub(crate) fn parse_code(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid message code: {input}"))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex data: {err}")))
}

pub(crate) fn connect(
    endpoint: &str,
    response_timeout: Duration,
) -> CliResult<Reader<SerialPortTransport>> {
    let reader = Reader::with_config(
        SerialPortTransport::new(),
        ReaderConfig { response_timeout },
    );
    reader
        .connect(endpoint)
        .map_err(|err| protocol_error("connect failed", err))?;
    Ok(reader)
}
