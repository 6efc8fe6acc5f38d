//! Typed wrappers over [`Reader::execute`] for the commands the driver exposes.

use redrcp_frame::code::{GET_READER_INFORMATION, START_AUTO_READ2, STOP_AUTO_READ2};
use redrcp_transport::Transport;

use crate::error::Result;
use crate::notification::{Notification, SessionKind, TagUii};
use crate::reader::Reader;
use crate::registry::SessionHandler;

/// Information type argument of GetReaderInformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReaderInfoType {
    Model = 0x00,
    FirmwareVersion = 0x01,
    Manufacturer = 0x02,
    Detail = 0xB0,
}

impl<T: Transport> Reader<T> {
    /// Raw GetReaderInformation payload for `info`.
    pub fn reader_information(&self, info: ReaderInfoType) -> Result<bytes::Bytes> {
        self.execute(GET_READER_INFORMATION, &[info as u8])
    }

    /// Firmware version string, with NUL padding removed.
    pub fn firmware_version(&self) -> Result<String> {
        let raw = self.reader_information(ReaderInfoType::FirmwareVersion)?;
        Ok(String::from_utf8_lossy(&raw).replace('\0', ""))
    }

    /// Start continuous inventory. `on_tag` runs on the receive thread for
    /// every tag until [`stop_auto_read2`](Self::stop_auto_read2) succeeds.
    pub fn start_auto_read2(&self, mut on_tag: impl FnMut(TagUii) + Send + 'static) -> Result<()> {
        let handler = SessionHandler::new(move |_, notification| {
            if let Notification::Tag(uii) = notification {
                on_tag(uii);
            }
        });
        self.start_session(SessionKind::AutoRead2, START_AUTO_READ2, &[], handler)
    }

    pub fn stop_auto_read2(&self) -> Result<()> {
        self.stop_session(SessionKind::AutoRead2, STOP_AUTO_READ2)
    }
}
