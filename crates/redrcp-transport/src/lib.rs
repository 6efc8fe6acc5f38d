//! Byte transport abstraction for RED RCP readers.
//!
//! The protocol engine never touches a device directly. It hands a
//! [`ByteHandler`] to a [`Transport`], which pushes every received byte into
//! it, in order, from whatever thread the transport reads on.
//!
//! This is the lowest layer of redrcp. The serial port implementation lives
//! in [`serial`].

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{
    available_ports, PortInfo, SerialFlowControl, SerialParity, SerialPortConfig,
    SerialPortTransport, SerialStopBits,
};
pub use traits::{ByteHandler, Transport};
