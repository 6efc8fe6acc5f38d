use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Something the CLI prints, one per line in JSON and pretty modes or one
/// row per item in table mode.
pub trait Record: Serialize {
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;

    fn pretty(&self) -> String {
        Self::HEADERS
            .iter()
            .zip(self.row())
            .map(|(h, v)| format!("{}={v}", h.to_ascii_lowercase()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn print_records<R: Record>(records: &[R], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Pretty => {
            for record in records {
                print_line(record, format);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(R::HEADERS.to_vec());
            for record in records {
                table.add_row(record.row());
            }
            println!("{table}");
        }
    }
}

pub fn print_record<R: Record>(record: &R, format: OutputFormat) {
    print_records(std::slice::from_ref(record), format);
}

/// Print a single record immediately, ignoring table mode.
pub fn print_line<R: Record>(record: &R, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", record.pretty()),
    }
}

pub fn hex_upper(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        code: u8,
        name: &'static str,
    }

    impl Record for Sample {
        const HEADERS: &'static [&'static str] = &["CODE", "NAME"];

        fn row(&self) -> Vec<String> {
            vec![format!("0x{:02X}", self.code), self.name.to_string()]
        }
    }

    #[test]
    fn pretty_pairs_headers_with_values() {
        let sample = Sample {
            code: 0x36,
            name: "StartAutoRead2",
        };
        assert_eq!(sample.pretty(), "code=0x36 name=StartAutoRead2");
    }

    #[test]
    fn hex_is_uppercase_without_separators() {
        assert_eq!(hex_upper(&[0xE2, 0x00, 0x0a]), "E2000A");
    }
}
