use crate::error::Result;

/// Receives every inbound byte, one call per byte, in arrival order.
pub type ByteHandler = Box<dyn FnMut(u8) + Send + 'static>;

/// A byte-oriented link to a reader.
///
/// Implementations own their receive context. Once `connect` returns `Ok`,
/// the handler is invoked for every received byte with no gaps until
/// `disconnect` returns; after that it is never invoked again.
pub trait Transport: Send {
    /// Open the link described by `endpoint` and start delivering bytes.
    fn connect(&mut self, endpoint: &str, on_byte: ByteHandler) -> Result<()>;

    /// Stop delivering bytes and release the link.
    fn disconnect(&mut self) -> Result<()>;

    /// Write all of `bytes` to the link.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Whether the link is currently open.
    fn is_connected(&self) -> bool;
}
