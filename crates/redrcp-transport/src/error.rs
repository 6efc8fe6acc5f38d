/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint descriptor could not be turned into a usable configuration.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Failed to open the serial port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// An I/O error occurred on the underlying device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport is not connected.
    #[error("transport not connected")]
    NotConnected,

    /// `connect` was called on a transport that is already connected.
    #[error("transport already connected")]
    AlreadyConnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
