//! Read tags for a few seconds and print each one.
//!
//! ```text
//! cargo run -p redrcp --example inventory -- /dev/ttyUSB0
//! ```

use std::sync::mpsc;
use std::time::{Duration, Instant};

use redrcp::reader::{ProtocolError, Reader};
use redrcp::transport::SerialPortTransport;

fn main() -> Result<(), ProtocolError> {
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let reader = Reader::new(SerialPortTransport::new());
    reader.connect(&endpoint)?;
    println!("firmware: {}", reader.firmware_version()?);

    // The callback runs on the receive thread; hand tags to this one.
    let (tx, rx) = mpsc::channel();
    reader.start_auto_read2(move |tag| {
        let _ = tx.send(tag);
    })?;

    let deadline = Instant::now() + Duration::from_secs(5);
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(tag) => println!("pc={:04X} epc={:02X?}", tag.pc, tag.epc.as_ref()),
            Err(_) => break,
        }
    }

    reader.stop_auto_read2()?;
    reader.disconnect()
}
