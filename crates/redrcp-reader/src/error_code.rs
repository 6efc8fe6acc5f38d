use std::fmt;

/// Error code reported by the reader in a command-failure frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    OtherError,
    NotSupported,
    InsufficientPrivileges,
    MemoryOverrun,
    MemoryLocked,
    CryptoSuiteError,
    CommandNotEncapsulated,
    ResponseBufferOverflow,
    SecurityTimeout,
    InsufficientPower,
    NonSpecificError,
    SensorSchedulingConfiguration,
    TagBusy,
    MeasurementTypeNotSupported,
    NoTagDetected,
    HandleAcquisitionFailure,
    AccessPasswordFailure,
    KillPasswordFailure,
    CrcError,
    RxTimeout,
    RegistryUpdateFailure,
    RegistryEraseFailure,
    RegistryWriteFailure,
    RegistryNotExist,
    UartFailure,
    SpiFailure,
    I2cFailure,
    GpioFailure,
    NotSupportedCommand,
    UndefinedCommand,
    InvalidParameter,
    TooHighParameter,
    TooLowParameter,
    FailureAutomaticReadOperation,
    NotAutomaticReadMode,
    FailureToGetLastResponse,
    FailureToControlTest,
    FailureToResetReader,
    RfidBlockControlFailure,
    AutomaticReadInOperation,
    UndefinedOtherError,
    FailureToVerifyWriteOperation,
    AbnormalAntenna,
    NoneError,
    /// A code outside the documented table.
    Unrecognized(u8),
}

impl ErrorCode {
    /// Wire value of this code.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::OtherError => 0x00,
            Self::NotSupported => 0x01,
            Self::InsufficientPrivileges => 0x02,
            Self::MemoryOverrun => 0x03,
            Self::MemoryLocked => 0x04,
            Self::CryptoSuiteError => 0x05,
            Self::CommandNotEncapsulated => 0x06,
            Self::ResponseBufferOverflow => 0x07,
            Self::SecurityTimeout => 0x08,
            Self::InsufficientPower => 0x0B,
            Self::NonSpecificError => 0x0F,
            Self::SensorSchedulingConfiguration => 0x11,
            Self::TagBusy => 0x12,
            Self::MeasurementTypeNotSupported => 0x13,
            Self::NoTagDetected => 0x80,
            Self::HandleAcquisitionFailure => 0x81,
            Self::AccessPasswordFailure => 0x82,
            Self::KillPasswordFailure => 0x83,
            Self::CrcError => 0x90,
            Self::RxTimeout => 0x91,
            Self::RegistryUpdateFailure => 0xA0,
            Self::RegistryEraseFailure => 0xA1,
            Self::RegistryWriteFailure => 0xA2,
            Self::RegistryNotExist => 0xA3,
            Self::UartFailure => 0xB0,
            Self::SpiFailure => 0xB1,
            Self::I2cFailure => 0xB2,
            Self::GpioFailure => 0xB3,
            Self::NotSupportedCommand => 0xE0,
            Self::UndefinedCommand => 0xE1,
            Self::InvalidParameter => 0xE2,
            Self::TooHighParameter => 0xE3,
            Self::TooLowParameter => 0xE4,
            Self::FailureAutomaticReadOperation => 0xE5,
            Self::NotAutomaticReadMode => 0xE6,
            Self::FailureToGetLastResponse => 0xE7,
            Self::FailureToControlTest => 0xE8,
            Self::FailureToResetReader => 0xE9,
            Self::RfidBlockControlFailure => 0xEA,
            Self::AutomaticReadInOperation => 0xEB,
            Self::UndefinedOtherError => 0xF0,
            Self::FailureToVerifyWriteOperation => 0xF1,
            Self::AbnormalAntenna => 0xFC,
            Self::NoneError => 0xFF,
            Self::Unrecognized(code) => code,
        }
    }
}

impl From<u8> for ErrorCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::OtherError,
            0x01 => Self::NotSupported,
            0x02 => Self::InsufficientPrivileges,
            0x03 => Self::MemoryOverrun,
            0x04 => Self::MemoryLocked,
            0x05 => Self::CryptoSuiteError,
            0x06 => Self::CommandNotEncapsulated,
            0x07 => Self::ResponseBufferOverflow,
            0x08 => Self::SecurityTimeout,
            0x0B => Self::InsufficientPower,
            0x0F => Self::NonSpecificError,
            0x11 => Self::SensorSchedulingConfiguration,
            0x12 => Self::TagBusy,
            0x13 => Self::MeasurementTypeNotSupported,
            0x80 => Self::NoTagDetected,
            0x81 => Self::HandleAcquisitionFailure,
            0x82 => Self::AccessPasswordFailure,
            0x83 => Self::KillPasswordFailure,
            0x90 => Self::CrcError,
            0x91 => Self::RxTimeout,
            0xA0 => Self::RegistryUpdateFailure,
            0xA1 => Self::RegistryEraseFailure,
            0xA2 => Self::RegistryWriteFailure,
            0xA3 => Self::RegistryNotExist,
            0xB0 => Self::UartFailure,
            0xB1 => Self::SpiFailure,
            0xB2 => Self::I2cFailure,
            0xB3 => Self::GpioFailure,
            0xE0 => Self::NotSupportedCommand,
            0xE1 => Self::UndefinedCommand,
            0xE2 => Self::InvalidParameter,
            0xE3 => Self::TooHighParameter,
            0xE4 => Self::TooLowParameter,
            0xE5 => Self::FailureAutomaticReadOperation,
            0xE6 => Self::NotAutomaticReadMode,
            0xE7 => Self::FailureToGetLastResponse,
            0xE8 => Self::FailureToControlTest,
            0xE9 => Self::FailureToResetReader,
            0xEA => Self::RfidBlockControlFailure,
            0xEB => Self::AutomaticReadInOperation,
            0xF0 => Self::UndefinedOtherError,
            0xF1 => Self::FailureToVerifyWriteOperation,
            0xFC => Self::AbnormalAntenna,
            0xFF => Self::NoneError,
            other => Self::Unrecognized(other),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.as_u8()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "unrecognized (0x{code:02X})"),
            other => write!(f, "{other:?} (0x{:02X})", other.as_u8()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_roundtrips() {
        for byte in 0..=u8::MAX {
            assert_eq!(ErrorCode::from(byte).as_u8(), byte);
        }
    }

    #[test]
    fn gaps_are_unrecognized() {
        assert_eq!(ErrorCode::from(0x09), ErrorCode::Unrecognized(0x09));
        assert_eq!(ErrorCode::from(0x80), ErrorCode::NoTagDetected);
    }

    #[test]
    fn display_includes_wire_value() {
        assert_eq!(
            ErrorCode::InsufficientPrivileges.to_string(),
            "InsufficientPrivileges (0x02)"
        );
        assert_eq!(ErrorCode::Unrecognized(0x7A).to_string(), "unrecognized (0x7A)");
    }
}
