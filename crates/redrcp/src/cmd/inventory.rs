use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use redrcp_reader::TagUii;
use serde::Serialize;
use tracing::{info, warn};

use crate::cmd::{connect, parse_duration, InventoryArgs};
use crate::exit::{protocol_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{hex_upper, print_line, print_records, OutputFormat, Record};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Serialize)]
struct TagOutput {
    pc: String,
    epc: String,
    elapsed_ms: u128,
}

impl Record for TagOutput {
    const HEADERS: &'static [&'static str] = &["PC", "EPC", "ELAPSED_MS"];

    fn row(&self) -> Vec<String> {
        vec![self.pc.clone(), self.epc.clone(), self.elapsed_ms.to_string()]
    }
}

#[derive(Serialize)]
struct TagSummary {
    epc: String,
    reads: usize,
}

impl Record for TagSummary {
    const HEADERS: &'static [&'static str] = &["EPC", "READS"];

    fn row(&self) -> Vec<String> {
        vec![self.epc.clone(), self.reads.to_string()]
    }
}

pub fn run(args: InventoryArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let reader = connect(&args.endpoint, redrcp_reader::DEFAULT_RESPONSE_TIMEOUT)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let (tx, rx) = mpsc::channel::<TagUii>();
    reader
        .start_auto_read2(move |tag| {
            let _ = tx.send(tag);
        })
        .map_err(|err| protocol_error("inventory start failed", err))?;

    let started = Instant::now();
    let mut reads = 0usize;
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    while running.load(Ordering::SeqCst) && started.elapsed() < duration {
        let tag = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(tag) => tag,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let epc = hex_upper(&tag.epc);
        *seen.entry(epc.clone()).or_default() += 1;
        reads += 1;

        match format {
            OutputFormat::Table => {}
            _ => print_line(
                &TagOutput {
                    pc: format!("{:04X}", tag.pc),
                    epc,
                    elapsed_ms: started.elapsed().as_millis(),
                },
                format,
            ),
        }

        if args.count.is_some_and(|count| reads >= count) {
            break;
        }
    }

    if let Err(err) = reader.stop_auto_read2() {
        warn!(error = %err, "inventory stop failed");
    }
    info!(reads, unique = seen.len(), "inventory finished");

    if matches!(format, OutputFormat::Table) {
        let summary: Vec<TagSummary> = seen
            .into_iter()
            .map(|(epc, reads)| TagSummary { epc, reads })
            .collect();
        print_records(&summary, format);
    }

    reader
        .disconnect()
        .map_err(|err| protocol_error("disconnect failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
