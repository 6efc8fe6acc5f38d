use std::fs;
use std::io::Cursor;

use redrcp_frame::code::code_name;
use redrcp_frame::{Frame, FrameReader, MessageType};
use serde::Serialize;
use tracing::info;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{hex_upper, print_records, OutputFormat, Record};

#[derive(Serialize)]
struct FrameOutput {
    kind: &'static str,
    code: u8,
    name: &'static str,
    payload_size: usize,
    payload: String,
}

impl FrameOutput {
    fn from_frame(frame: &Frame) -> Self {
        let kind = match frame.message_type() {
            Some(MessageType::Command) => "command",
            Some(MessageType::Response) => "response",
            Some(MessageType::Notification) => "notification",
            Some(MessageType::Reserved) => "reserved",
            None => "unknown",
        };
        Self {
            kind,
            code: frame.code,
            name: code_name(frame.code),
            payload_size: frame.payload.len(),
            payload: hex_upper(&frame.payload),
        }
    }
}

impl Record for FrameOutput {
    const HEADERS: &'static [&'static str] = &["KIND", "CODE", "NAME", "SIZE", "PAYLOAD"];

    fn row(&self) -> Vec<String> {
        vec![
            self.kind.to_string(),
            format!("0x{:02X}", self.code),
            self.name.to_string(),
            self.payload_size.to_string(),
            self.payload.clone(),
        ]
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let bytes = if args.hex {
        parse_hex(&String::from_utf8_lossy(&raw))?
    } else {
        raw
    };

    let mut reader = FrameReader::new(Cursor::new(bytes));
    let mut frames = Vec::new();
    for frame in reader.by_ref() {
        let frame = frame.map_err(|err| frame_error("decode failed", err))?;
        frames.push(FrameOutput::from_frame(&frame));
    }

    let stats = reader.stats();
    info!(
        frames = stats.frames,
        crc_errors = stats.crc_errors,
        end_mark_errors = stats.end_mark_errors,
        oversized = stats.oversized,
        "capture decoded"
    );
    print_records(&frames, format);
    Ok(SUCCESS)
}
