//! Streaming notification kinds and their payload layouts.

use bytes::{Buf, Bytes};

use redrcp_frame::code;

/// Single-byte payload announcing the end of a streaming session.
pub const COMPLETION_SENTINEL: u8 = 0x1F;

/// Size of a DTC / leakage cancellation result.
pub const DTC_RESULT_LEN: usize = 7;

/// Number of [`SessionKind`] variants.
pub(crate) const KIND_COUNT: usize = 7;

const PC_LEN: usize = 2;
const RSSI_LEN: usize = 4;
const EX_HEADER_LEN: usize = 3;

/// Byte length of the EPC that follows a PC word.
///
/// The top five bits of PC hold the EPC length in 16-bit words.
pub fn epc_len_from_pc(pc: u16) -> usize {
    usize::from(pc >> 11) * 2
}

/// A notification-producing operation.
///
/// Each kind owns one session flag. Notifications for a kind are only
/// delivered while its flag is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Continuous inventory (StartAutoRead2 / StopAutoRead2).
    AutoRead2,
    /// Single inventory round; ends with the first tag.
    ReadTypeCUii,
    /// Inventory with TID read.
    ReadTypeCUiiTid,
    /// Continuous inventory with RSSI.
    AutoReadRssi,
    /// Extended continuous inventory.
    AutoRead2Ex,
    /// DTC / leakage cancellation scan.
    DtcScan,
    /// Optimum frequency hopping table build.
    OptimumFrequencyHopping,
}

impl SessionKind {
    pub const ALL: [SessionKind; KIND_COUNT] = [
        SessionKind::AutoRead2,
        SessionKind::ReadTypeCUii,
        SessionKind::ReadTypeCUiiTid,
        SessionKind::AutoReadRssi,
        SessionKind::AutoRead2Ex,
        SessionKind::DtcScan,
        SessionKind::OptimumFrequencyHopping,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Notification codes routed to this kind.
    pub fn notification_codes(self) -> &'static [u8] {
        match self {
            Self::AutoRead2 | Self::ReadTypeCUii => &[code::READ_TYPE_C_UII],
            Self::ReadTypeCUiiTid => &[code::READ_TYPE_C_UII_TID],
            Self::AutoReadRssi => &[code::READ_TYPE_C_UII_RSSI, code::START_AUTO_READ_RSSI],
            Self::AutoRead2Ex => &[code::READ_TYPE_C_UII_EX2, code::START_AUTO_READ2_EX],
            Self::DtcScan | Self::OptimumFrequencyHopping => &[code::GET_DTC_RESULT],
        }
    }

    pub fn handles(self, code: u8) -> bool {
        self.notification_codes().contains(&code)
    }

    /// Whether a `[0x1F]` payload ends the session.
    pub fn has_completion_sentinel(self) -> bool {
        matches!(
            self,
            Self::ReadTypeCUiiTid | Self::AutoReadRssi | Self::AutoRead2Ex
        )
    }

    /// Whether the first delivered notification ends the session.
    pub fn is_single_shot(self) -> bool {
        matches!(self, Self::ReadTypeCUii)
    }

    /// Parse a notification payload for this kind.
    ///
    /// Returns `None` when the payload does not fit the kind's layout.
    pub fn parse(self, payload: &Bytes) -> Option<Notification> {
        match self {
            Self::AutoRead2 | Self::ReadTypeCUii => parse_uii(payload).map(Notification::Tag),
            Self::ReadTypeCUiiTid => parse_uii_tid(payload).map(Notification::TagTid),
            Self::AutoReadRssi => parse_uii_rssi(payload).map(Notification::TagRssi),
            Self::AutoRead2Ex => parse_uii_ex(payload).map(Notification::TagEx),
            Self::DtcScan | Self::OptimumFrequencyHopping => {
                DtcResult::parse(payload).map(Notification::Dtc)
            }
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A tag identifier: PC word and EPC bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUii {
    pub pc: u16,
    pub epc: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUiiTid {
    pub uii: TagUii,
    /// TID memory bytes; empty when the reader sent none.
    pub tid: Bytes,
}

/// Raw receiver strength and gain, as reported by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RssiSample {
    pub rssi_i: u8,
    pub rssi_q: u8,
    pub gain_i: u8,
    pub gain_q: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUiiRssi {
    pub uii: TagUii,
    pub rssi: RssiSample,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUiiEx {
    pub mode: u8,
    pub antenna_port: u8,
    pub uii: TagUii,
    /// Present when the reader was asked to report tag RSSI.
    pub rssi: Option<RssiSample>,
}

/// DTC / leakage cancellation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtcResult {
    pub inductor_number: u8,
    pub dtc1: u8,
    pub dtc2: u8,
    pub leakage_rssi: u8,
    pub algorithm_state: u8,
    pub channel: u8,
    pub operation_time: u8,
}

impl DtcResult {
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let bytes: [u8; DTC_RESULT_LEN] = payload.try_into().ok()?;
        let [inductor_number, dtc1, dtc2, leakage_rssi, algorithm_state, channel, operation_time] =
            bytes;
        Some(Self {
            inductor_number,
            dtc1,
            dtc2,
            leakage_rssi,
            algorithm_state,
            channel,
            operation_time,
        })
    }
}

/// Parsed payload delivered to a session handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Tag(TagUii),
    TagTid(TagUiiTid),
    TagRssi(TagUiiRssi),
    TagEx(TagUiiEx),
    Dtc(DtcResult),
}

impl Notification {
    /// The tag identifier, for tag-carrying notifications.
    pub fn uii(&self) -> Option<&TagUii> {
        match self {
            Self::Tag(uii) => Some(uii),
            Self::TagTid(tag) => Some(&tag.uii),
            Self::TagRssi(tag) => Some(&tag.uii),
            Self::TagEx(tag) => Some(&tag.uii),
            Self::Dtc(_) => None,
        }
    }
}

/// Split PC + EPC off the front of `buf`, leaving the rest.
fn take_uii(buf: &mut Bytes) -> Option<TagUii> {
    if buf.len() < PC_LEN {
        return None;
    }
    let pc = u16::from_be_bytes([buf[0], buf[1]]);
    let epc_len = epc_len_from_pc(pc);
    if buf.len() < PC_LEN + epc_len {
        return None;
    }
    buf.advance(PC_LEN);
    let epc = buf.split_to(epc_len);
    Some(TagUii { pc, epc })
}

fn take_rssi(buf: &mut Bytes) -> Option<RssiSample> {
    if buf.len() != RSSI_LEN {
        return None;
    }
    let sample = RssiSample {
        rssi_i: buf.get_u8(),
        rssi_q: buf.get_u8(),
        gain_i: buf.get_u8(),
        gain_q: buf.get_u8(),
    };
    Some(sample)
}

fn parse_uii(payload: &Bytes) -> Option<TagUii> {
    let mut buf = payload.clone();
    take_uii(&mut buf)
}

fn parse_uii_tid(payload: &Bytes) -> Option<TagUiiTid> {
    let mut buf = payload.clone();
    let uii = take_uii(&mut buf)?;
    Some(TagUiiTid { uii, tid: buf })
}

fn parse_uii_rssi(payload: &Bytes) -> Option<TagUiiRssi> {
    let mut buf = payload.clone();
    let uii = take_uii(&mut buf)?;
    let rssi = take_rssi(&mut buf)?;
    Some(TagUiiRssi { uii, rssi })
}

fn parse_uii_ex(payload: &Bytes) -> Option<TagUiiEx> {
    if payload.len() < EX_HEADER_LEN + PC_LEN {
        return None;
    }
    let mut buf = payload.clone();
    let mode = buf.get_u8();
    let tag_rssi = buf.get_u8();
    let antenna_port = buf.get_u8();
    let uii = take_uii(&mut buf)?;
    let rssi = if tag_rssi != 0 {
        Some(take_rssi(&mut buf)?)
    } else {
        None
    };
    Some(TagUiiEx {
        mode,
        antenna_port,
        uii,
        rssi,
    })
}
