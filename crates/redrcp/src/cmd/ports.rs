use redrcp_transport::available_ports;
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat, Record};

#[derive(Serialize)]
struct PortOutput {
    name: String,
    kind: String,
}

impl Record for PortOutput {
    const HEADERS: &'static [&'static str] = &["NAME", "KIND"];

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.kind.clone()]
    }
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports: Vec<PortOutput> = available_ports()
        .map_err(|err| transport_error("listing ports failed", err))?
        .into_iter()
        .map(|port| PortOutput {
            name: port.name,
            kind: port.kind,
        })
        .collect();

    if ports.is_empty() {
        tracing::info!("no serial ports found");
    }
    print_records(&ports, format);
    Ok(SUCCESS)
}
