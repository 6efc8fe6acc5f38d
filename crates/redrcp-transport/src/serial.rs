use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ByteHandler, Transport};

const READ_CHUNK_SIZE: usize = 256;

/// Serial port parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    #[default]
    None,
    Odd,
    Even,
}

/// Serial port stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialStopBits {
    #[default]
    One,
    Two,
}

/// Serial port flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialFlowControl {
    #[default]
    None,
    /// RTS/CTS
    Hardware,
    /// XON/XOFF
    Software,
}

/// Serial link settings, parsed from an endpoint descriptor.
///
/// RED RCP modules talk 115200 8N1 without flow control out of the box, so
/// a bare port name is usually all that needs to be supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialPortConfig {
    /// Port name (e.g. `/dev/ttyUSB0`, `COM4`).
    #[serde(alias = "PortName")]
    pub port_name: String,
    #[serde(alias = "BaudRate")]
    pub baud_rate: u32,
    /// 5, 6, 7 or 8.
    #[serde(alias = "DataBits")]
    pub data_bits: u8,
    #[serde(alias = "Parity")]
    pub parity: SerialParity,
    #[serde(alias = "StopBits")]
    pub stop_bits: SerialStopBits,
    #[serde(alias = "Handshake")]
    pub flow_control: SerialFlowControl,
    /// Read/write timeout of the port. Bounds how long `disconnect` waits for
    /// the receive thread to notice it should stop.
    #[serde(alias = "ReadTimeout")]
    pub timeout_ms: u64,
}

impl Default for SerialPortConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: 8,
            parity: SerialParity::None,
            stop_bits: SerialStopBits::One,
            flow_control: SerialFlowControl::None,
            timeout_ms: 100,
        }
    }
}

impl SerialPortConfig {
    /// Default settings for the given port.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Parse an endpoint descriptor.
    ///
    /// A descriptor starting with `{` must be a JSON object with any subset
    /// of the config fields. Anything else is taken as a bare port name.
    pub fn from_endpoint(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "endpoint must not be empty".to_string(),
            ));
        }

        let config = if endpoint.starts_with('{') {
            serde_json::from_str::<Self>(endpoint)
                .map_err(|err| TransportError::InvalidEndpoint(err.to_string()))?
        } else {
            Self::new(endpoint)
        };

        if config.port_name.is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "port_name must not be empty".to_string(),
            ));
        }
        if !(5..=8).contains(&config.data_bits) {
            return Err(TransportError::InvalidEndpoint(format!(
                "unsupported data bits: {}",
                config.data_bits
            )));
        }
        Ok(config)
    }

    fn open(&self) -> Result<Box<dyn SerialPort>> {
        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        let parity = match self.parity {
            SerialParity::None => Parity::None,
            SerialParity::Odd => Parity::Odd,
            SerialParity::Even => Parity::Even,
        };
        let stop_bits = match self.stop_bits {
            SerialStopBits::One => StopBits::One,
            SerialStopBits::Two => StopBits::Two,
        };
        let flow_control = match self.flow_control {
            SerialFlowControl::None => FlowControl::None,
            SerialFlowControl::Hardware => FlowControl::Hardware,
            SerialFlowControl::Software => FlowControl::Software,
        };

        serialport::new(&self.port_name, self.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(flow_control)
            .timeout(Duration::from_millis(self.timeout_ms))
            .open()
            .map_err(|source| TransportError::Open {
                port: self.port_name.clone(),
                source,
            })
    }
}

/// A serial port visible to the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

/// List the serial ports visible to the system.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|err| {
        TransportError::Io(std::io::Error::other(format!(
            "serial port enumeration failed: {err}"
        )))
    })?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let kind = match port.port_type {
                serialport::SerialPortType::UsbPort(usb) => match usb.product {
                    Some(product) => format!("usb ({product})"),
                    None => format!("usb ({:04x}:{:04x})", usb.vid, usb.pid),
                },
                serialport::SerialPortType::PciPort => "pci".to_string(),
                serialport::SerialPortType::BluetoothPort => "bluetooth".to_string(),
                serialport::SerialPortType::Unknown => "unknown".to_string(),
            };
            PortInfo {
                name: port.port_name,
                kind,
            }
        })
        .collect())
}

/// Serial port transport.
///
/// A dedicated receive thread reads the port and feeds each byte to the
/// handler given at connect time.
pub struct SerialPortTransport {
    port: Option<Box<dyn SerialPort>>,
    config: Option<SerialPortConfig>,
    running: Arc<AtomicBool>,
    rx_thread: Option<JoinHandle<()>>,
}

impl SerialPortTransport {
    pub fn new() -> Self {
        Self {
            port: None,
            config: None,
            running: Arc::new(AtomicBool::new(false)),
            rx_thread: None,
        }
    }

    /// Settings of the current connection, if any.
    pub fn config(&self) -> Option<&SerialPortConfig> {
        self.config.as_ref()
    }
}

impl Default for SerialPortTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SerialPortTransport {
    fn connect(&mut self, endpoint: &str, mut on_byte: ByteHandler) -> Result<()> {
        if self.port.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let config = SerialPortConfig::from_endpoint(endpoint)?;
        let port = config.open()?;
        let mut rx_port = port.try_clone().map_err(|source| TransportError::Open {
            port: config.port_name.clone(),
            source,
        })?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let port_name = config.port_name.clone();
        let rx_thread = std::thread::Builder::new()
            .name("redrcp-serial-rx".to_string())
            .spawn(move || {
                let mut chunk = [0u8; READ_CHUNK_SIZE];
                while running.load(Ordering::SeqCst) {
                    match rx_port.read(&mut chunk) {
                        Ok(n) => {
                            for &byte in &chunk[..n] {
                                on_byte(byte);
                            }
                        }
                        Err(err)
                            if matches!(
                                err.kind(),
                                ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock
                            ) => {}
                        Err(err) => {
                            warn!(port = %port_name, error = %err, "serial receive failed");
                            break;
                        }
                    }
                }
                debug!(port = %port_name, "serial receive thread exiting");
            })
            .inspect_err(|_| self.running.store(false, Ordering::SeqCst))?;

        info!(port = %config.port_name, baud = config.baud_rate, "serial port open");
        self.port = Some(port);
        self.config = Some(config);
        self.rx_thread = Some(rx_thread);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.rx_thread.take() {
            if handle.join().is_err() {
                warn!("serial receive thread panicked");
            }
        }
        if self.port.take().is_some() {
            if let Some(config) = &self.config {
                info!(port = %config.port_name, "serial port closed");
            }
        }
        self.config = None;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(TransportError::NotConnected)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialPortTransport {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("config", &self.config)
            .field("connected", &self.port.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_port_name_uses_defaults() {
        let config = SerialPortConfig::from_endpoint("/dev/ttyUSB0").unwrap();
        assert_eq!(config.port_name, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.parity, SerialParity::None);
        assert_eq!(config.stop_bits, SerialStopBits::One);
        assert_eq!(config.flow_control, SerialFlowControl::None);
    }

    #[test]
    fn json_endpoint_overrides_fields() {
        let config = SerialPortConfig::from_endpoint(
            r#"{"port_name":"COM4","baud_rate":57600,"parity":"even","stop_bits":"two"}"#,
        )
        .unwrap();
        assert_eq!(config.port_name, "COM4");
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.parity, SerialParity::Even);
        assert_eq!(config.stop_bits, SerialStopBits::Two);
        assert_eq!(config.data_bits, 8);
    }

    #[test]
    fn json_endpoint_accepts_pascal_case_names() {
        let config =
            SerialPortConfig::from_endpoint(r#"{"PortName":"COM7","BaudRate":9600}"#).unwrap();
        assert_eq!(config.port_name, "COM7");
        assert_eq!(config.baud_rate, 9600);
    }

    #[test]
    fn rejects_empty_and_malformed_endpoints() {
        assert!(matches!(
            SerialPortConfig::from_endpoint("   "),
            Err(TransportError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            SerialPortConfig::from_endpoint("{not json"),
            Err(TransportError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            SerialPortConfig::from_endpoint(r#"{"baud_rate":9600}"#),
            Err(TransportError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            SerialPortConfig::from_endpoint(r#"{"port_name":"COM1","data_bits":9}"#),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn send_without_connection_fails() {
        let mut transport = SerialPortTransport::new();
        assert!(!transport.is_connected());
        let err = transport.send(&[0xBB]).unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut transport = SerialPortTransport::new();
        transport.disconnect().unwrap();
        transport.disconnect().unwrap();
        assert!(transport.config().is_none());
    }

    #[test]
    fn connect_to_missing_port_fails() {
        let mut transport = SerialPortTransport::new();
        let err = transport
            .connect("/dev/redrcp-does-not-exist", Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
        assert!(!transport.is_connected());
    }
}
