//! Message codes.
//!
//! Only the codes the engine itself routes on are named here. The rest of
//! the command catalog is opaque to the framing layer.

/// Reader information query (model, firmware version, manufacturer, detail).
pub const GET_READER_INFORMATION: u8 = 0x03;

/// Single Type C UII read; also the notification code of AutoRead2.
pub const READ_TYPE_C_UII: u8 = 0x22;

/// Type C UII + RSSI notification.
pub const READ_TYPE_C_UII_RSSI: u8 = 0x23;

/// Type C UII + TID read / notification.
pub const READ_TYPE_C_UII_TID: u8 = 0x25;

/// Extended Type C UII notification (AutoRead2Ex data).
pub const READ_TYPE_C_UII_EX2: u8 = 0x26;

/// Start continuous inventory.
pub const START_AUTO_READ2: u8 = 0x36;

/// Stop continuous inventory.
pub const STOP_AUTO_READ2: u8 = 0x37;

/// Start continuous inventory with RSSI.
pub const START_AUTO_READ_RSSI: u8 = 0x38;

/// Stop continuous inventory with RSSI.
pub const STOP_AUTO_READ_RSSI: u8 = 0x39;

/// Start extended continuous inventory.
pub const START_AUTO_READ2_EX: u8 = 0x3A;

/// Digital tunable capacitor / leakage cancellation result.
pub const GET_DTC_RESULT: u8 = 0xCA;

/// Build the optimum frequency hopping table (reports DTC results).
pub const SET_OPTIMUM_FREQUENCY_HOPPING_TABLE: u8 = 0xE4;

/// Reserved response code for command failures. Payload: `[original_code, error_code]`.
pub const COMMAND_FAILURE: u8 = 0xFF;

/// Success status byte returned by start/stop style commands.
pub const STATUS_SUCCESS: u8 = 0x00;

/// Returns a human-readable name for a message code.
pub fn code_name(code: u8) -> &'static str {
    match code {
        0x01 => "SetReaderPowerControl",
        GET_READER_INFORMATION => "GetReaderInformation",
        0x06 => "GetRegion",
        0x07 => "SetRegion",
        0x08 => "SetSystemReset",
        0x0D => "GetTypeCAIQueryParameters",
        0x0E => "SetTypeCAIQueryParameters",
        0x11 => "GetRfChannel",
        0x12 => "SetRfChannel",
        0x13 => "GetFhLbtParameters",
        0x14 => "SetFhLbtParameters",
        0x15 => "GetTxPower",
        0x16 => "SetTxPower",
        0x17 => "RfCwSignalControl",
        READ_TYPE_C_UII => "ReadTypeCUii",
        READ_TYPE_C_UII_RSSI => "ReadTypeCUiiRssi",
        READ_TYPE_C_UII_TID => "ReadTypeCUiiTid",
        READ_TYPE_C_UII_EX2 => "ReadTypeCUiiEx2",
        0x29 => "ReadTypeCTagData",
        0x2A => "ReadTypeCTagLongData",
        0x2E => "GetSession",
        0x2F => "SetSession",
        0x30 => "GetFrequencyHoppingTable",
        0x31 => "SetFrequencyHoppingTable",
        0x32 => "GetModulationMode",
        0x33 => "SetModulationMode",
        0x34 => "GetAntiCollisionMode",
        0x35 => "SetAntiCollisionMode",
        START_AUTO_READ2 => "StartAutoRead2",
        STOP_AUTO_READ2 => "StopAutoRead2",
        START_AUTO_READ_RSSI => "StartAutoReadRssi",
        STOP_AUTO_READ_RSSI => "StopAutoReadRssi",
        START_AUTO_READ2_EX => "StartAutoRead2Ex",
        0x44 => "GetFrequencyInformation",
        0x45 => "SetFrequencyInformation",
        0x46 => "WriteTypeCTagData",
        0x47 => "BlockWriteTypeCTagData",
        0x48 => "BlockEraseTypeCTagData",
        0x65 => "KillRecomTypeCTag",
        0x82 => "LockTypeCTag",
        0x83 => "BlockPermalockTypeCTag",
        0xAC => "AntennaCheck",
        0xB7 => "GetTemperature",
        0xC5 => "GetRssi",
        0xC6 => "ScanRssi",
        GET_DTC_RESULT => "GetDtcResult",
        0xD2 => "UpdateRegistry",
        0xD4 => "GetRegistryItem",
        SET_OPTIMUM_FREQUENCY_HOPPING_TABLE => "SetOptimumFrequencyHoppingTable",
        0xE5 => "GetFrequencyHoppingMode",
        0xE6 => "SetFrequencyHoppingMode",
        COMMAND_FAILURE => "CommandFailure",
        _ => "Unknown",
    }
}
