use std::fmt;

/// The part of an address that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Callsign,
    Ssid,
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callsign => write!(f, "callsign"),
            Self::Ssid => write!(f, "SSID"),
        }
    }
}

/// Errors that can occur when decoding an address, path or frame from its
/// text or binary representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Callsign is empty or longer than 6 characters, or the SSID is not a number from 0 to 15.
    #[error("invalid address {field} '{value}'")]
    AddressInvalid { field: AddressField, value: String },

    #[error("address must be exactly 7 bytes but there are {0}")]
    AddressSizeMismatch(usize),

    #[error("frame is {0} bytes long but 16 is the minimum")]
    FrameTooShort(usize),

    #[error("frame ends before an address marked as last")]
    FrameNoTerminalAddress,

    #[error("frame is missing its control field or protocol ID")]
    FrameIncomplete,

    #[error("control field {0:#04x} is not a UI frame")]
    FrameBadControl(u8),

    #[error("protocol ID {0:#04x} is not 'no layer 3'")]
    FrameBadProtocolId(u8),

    #[error("text is not a frame of the form SRC>DST[,PATH]:TEXT")]
    FrameInvalid,
}

impl ParseError {
    pub(crate) fn callsign(value: &str) -> Self {
        ParseError::AddressInvalid {
            field: AddressField::Callsign,
            value: value.to_string(),
        }
    }

    pub(crate) fn ssid(value: &str) -> Self {
        ParseError::AddressInvalid {
            field: AddressField::Ssid,
            value: value.to_string(),
        }
    }
}
