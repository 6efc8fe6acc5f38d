use redrcp_frame::code::code_name;
use redrcp_reader::ProtocolError;
use serde::Serialize;

use crate::cmd::{connect, parse_duration, parse_hex, ExecArgs};
use crate::exit::{protocol_error, CliError, CliResult, READER_ERROR, SUCCESS};
use crate::output::{hex_upper, print_record, OutputFormat, Record};

#[derive(Serialize)]
struct ExecOutput {
    code: u8,
    name: &'static str,
    payload_size: usize,
    payload: String,
}

impl Record for ExecOutput {
    const HEADERS: &'static [&'static str] = &["CODE", "NAME", "SIZE", "PAYLOAD"];

    fn row(&self) -> Vec<String> {
        vec![
            format!("0x{:02X}", self.code),
            self.name.to_string(),
            self.payload_size.to_string(),
            self.payload.clone(),
        ]
    }
}

pub fn run(args: ExecArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let payload = parse_hex(&args.data)?;
    let reader = connect(&args.endpoint, timeout)?;

    let response = match reader.execute(args.code, &payload) {
        Ok(response) => response,
        Err(ProtocolError::ReaderError { code, .. }) => {
            let error = reader.last_error_for(code).unwrap_or(reader.last_error());
            return Err(CliError::new(
                READER_ERROR,
                format!(
                    "reader rejected {} (0x{code:02X}): {error}",
                    code_name(code)
                ),
            ));
        }
        Err(err) => return Err(protocol_error("command failed", err)),
    };

    print_record(
        &ExecOutput {
            code: args.code,
            name: code_name(args.code),
            payload_size: response.len(),
            payload: hex_upper(&response),
        },
        format,
    );

    reader
        .disconnect()
        .map_err(|err| protocol_error("disconnect failed", err))?;
    Ok(SUCCESS)
}
