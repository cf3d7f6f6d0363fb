use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use crate::error::ParseError;

/// Callsigns occupy the first 6 bytes of an encoded address.
pub const MAX_CALLSIGN_LEN: usize = 6;

pub const MAX_SSID: u8 = 15;

/// A station address: callsign, SSID and whether it has been digipeated.
///
/// Text form is `CALL[-SSID][*]`. Case is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub callsign: String,
    pub ssid: u8,
    /// Set on a path entry once that digipeater has relayed the frame.
    pub repeated: bool,
}

impl Address {
    /// Create a validated, not-yet-repeated address.
    pub fn new(callsign: &str, ssid: u8) -> Result<Address, ParseError> {
        if callsign.is_empty() || callsign.len() > MAX_CALLSIGN_LEN {
            return Err(ParseError::callsign(callsign));
        }
        if ssid > MAX_SSID {
            return Err(ParseError::ssid(&ssid.to_string()));
        }
        Ok(Address {
            callsign: callsign.to_string(),
            ssid,
            repeated: false,
        })
    }

    /// `CALL` or `CALL-SSID`, without the repeated marker.
    pub fn station_id(&self) -> String {
        match self.ssid {
            0 => self.callsign.clone(),
            ssid => format!("{}-{}", self.callsign, ssid),
        }
    }

    /// Encode into the 7-byte AX.25 address form. `terminal` marks the last
    /// address of the address field.
    pub fn to_bytes(&self, terminal: bool) -> [u8; 7] {
        // Shift by one bit as required for AX.25 address encoding, padded with spaces
        let mut encoded = [b' ' << 1; 7];
        for (slot, b) in encoded
            .iter_mut()
            .zip(self.callsign.bytes().take(MAX_CALLSIGN_LEN))
        {
            *slot = b << 1;
        }

        // Repeated | Reserved | Reserved | SSID (4 bits) | Last
        let high = if self.repeated { 0b1000_0000 } else { 0 };
        let low = if terminal { 0b0000_0001 } else { 0 };
        encoded[6] = ((self.ssid & 0x0f) << 1) | 0b0110_0000 | high | low;

        encoded
    }

    /// Decode a 7-byte AX.25 address. Whether it was marked as the last address
    /// is discarded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Address, ParseError> {
        decode_address(bytes).map(|(address, _)| address)
    }
}

/// Decode a 7-byte AX.25 address, also returning its "last address" marker.
pub(crate) fn decode_address(bytes: &[u8]) -> Result<(Address, bool), ParseError> {
    if bytes.len() != 7 {
        return Err(ParseError::AddressSizeMismatch(bytes.len()));
    }
    let mut callsign: Vec<u8> = bytes[0..6]
        .iter()
        .rev()
        .map(|&c| c >> 1)
        .skip_while(|&c| c == b' ')
        .collect();
    callsign.reverse();

    let address = Address {
        // Shifted bytes are always 7-bit ASCII
        callsign: callsign.into_iter().map(char::from).collect(),
        ssid: (bytes[6] >> 1) & 0x0f,
        repeated: bytes[6] & 0b1000_0000 > 0,
    };
    Ok((address, bytes[6] & 0b0000_0001 > 0))
}

impl Default for Address {
    fn default() -> Address {
        Address {
            callsign: "NOCALL".to_string(),
            ssid: 0,
            repeated: false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.station_id())?;
        if self.repeated {
            write!(f, "*")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (s, repeated) = match s.strip_suffix('*') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let (callsign, ssid) = match s.split_once('-') {
            Some((callsign, ssid_str)) => {
                let ssid = ssid_str
                    .parse::<u8>()
                    .map_err(|_| ParseError::ssid(ssid_str))?;
                (callsign, ssid)
            }
            None => (s, 0),
        };

        let mut address = Address::new(callsign, ssid)?;
        address.repeated = repeated;
        Ok(address)
    }
}

/// The digipeater path of a frame, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(pub Vec<Address>);

impl Path {
    pub fn new() -> Path {
        Path(Vec::new())
    }
}

impl Deref for Path {
    type Target = Vec<Address>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Path {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Address>> for Path {
    fn from(addresses: Vec<Address>) -> Self {
        Path(addresses)
    }
}

impl FromIterator<Address> for Path {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl FromStr for Path {
    type Err = ParseError;

    /// Parse comma separated addresses. An empty string is an empty path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::new());
        }
        s.split(',').map(str::parse).collect()
    }
}

impl fmt::Display for Path {
    /// Only the most recent digipeater in a run of repeated addresses keeps
    /// its `*`, which is how stations show who relayed the frame last.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, address) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let next_repeated = self.0.get(i + 1).is_some_and(|next| next.repeated);
            if next_repeated {
                write!(f, "{}", address.station_id())?;
            } else {
                write!(f, "{}", address)?;
            }
        }
        Ok(())
    }
}
