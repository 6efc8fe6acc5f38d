//! Driver for RED RCP RAIN RFID readers.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transport abstraction and the serial port link
//! - [`frame`]: wire framing, CRC-16 and the byte-at-a-time decoder
//! - [`reader`]: command/response correlation, notification sessions and
//!   the reader error ledger
//!
//! ```no_run
//! use redrcp::reader::Reader;
//! use redrcp::transport::SerialPortTransport;
//!
//! let reader = Reader::new(SerialPortTransport::new());
//! reader.connect("/dev/ttyUSB0")?;
//! println!("firmware {}", reader.firmware_version()?);
//! reader.start_auto_read2(|tag| println!("pc={:04X} epc={:02X?}", tag.pc, tag.epc.as_ref()))?;
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! reader.stop_auto_read2()?;
//! # Ok::<(), redrcp::reader::ProtocolError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use redrcp_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use redrcp_frame::*;
}

/// Re-export protocol engine types.
pub mod reader {
    pub use redrcp_reader::*;
}
