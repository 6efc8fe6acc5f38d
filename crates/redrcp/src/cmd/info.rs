use serde::Serialize;

use crate::cmd::{connect, parse_duration, InfoArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

#[derive(Serialize)]
struct InfoOutput {
    endpoint: String,
    firmware_version: String,
    connected: bool,
}

impl Record for InfoOutput {
    const HEADERS: &'static [&'static str] = &["ENDPOINT", "FIRMWARE", "CONNECTED"];

    fn row(&self) -> Vec<String> {
        vec![
            self.endpoint.clone(),
            self.firmware_version.clone(),
            self.connected.to_string(),
        ]
    }
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let reader = connect(&args.endpoint, timeout)?;

    let firmware_version = reader
        .firmware_version()
        .map_err(|err| protocol_error("firmware query failed", err))?;

    print_record(
        &InfoOutput {
            endpoint: args.endpoint,
            firmware_version,
            connected: reader.is_connected(),
        },
        format,
    );

    reader
        .disconnect()
        .map_err(|err| protocol_error("disconnect failed", err))?;
    Ok(SUCCESS)
}
