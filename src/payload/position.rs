use std::fmt;

use chrono::{DateTime, Utc};

use super::{latitude, longitude};

/// Longest info field a UI frame is expected to carry.
pub const MAX_INFO_LEN: usize = 255;

/// A position report (APRS 1.0.1 chapter 8).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    /// Only set for reports of old, not real-time, positions.
    pub timestamp: Option<DateTime<Utc>>,
    pub lat: f64,
    pub lon: f64,
    /// Symbol table identifier, usually `/` or `\`
    pub symbol_table: char,
    pub symbol_code: char,
    /// Fixed 7 byte data extension. Shorter values are not sent.
    pub extension: Option<String>,
    pub freq: Option<Freq>,
    /// Feet
    pub altitude: Option<i32>,
    pub comment: String,
    /// Whether the station can receive APRS messages.
    pub messaging: bool,
}

impl PositionReport {
    pub fn new(lat: f64, lon: f64, symbol_table: char, symbol_code: char) -> PositionReport {
        PositionReport {
            timestamp: None,
            lat,
            lon,
            symbol_table,
            symbol_code,
            extension: None,
            freq: None,
            altitude: None,
            comment: String::new(),
            messaging: false,
        }
    }

    /// Course in degrees and speed in knots, `CCC/SSS`.
    pub fn cs_extension(&mut self, course: u16, speed: u16) {
        self.extension = Some(format!("{:03}/{:03}", course, speed));
    }

    /// Wind direction in degrees and sustained speed in mph, `DDD/SSS`.
    pub fn ds_extension(&mut self, direction: u16, speed: u16) {
        self.extension = Some(format!("{:03}/{:03}", direction, speed));
    }

    /// Station power, antenna height, gain and directivity as `PHGphgd`.
    ///
    /// Each argument is a code rather than a measurement, e.g. power code 3 is
    /// 9 watts and directivity code 0 is omni. The height code may be any ASCII
    /// character from `0` upwards.
    pub fn phg_extension(&mut self, power: u8, height: char, gain: u8, directivity: u8) {
        self.extension = Some(format!(
            "PHG{}{}{}{}",
            power.min(9),
            height,
            gain.min(9),
            directivity.min(8)
        ));
    }

    /// Pre-calculated radio range in miles, `RNGrrrr`.
    pub fn rng_extension(&mut self, miles: u16) {
        self.extension = Some(format!("RNG{:04}", miles.min(9999)));
    }

    /// DF signal strength (S-points), antenna height, gain and directivity as
    /// `DFSshgd`. This also switches the symbol to the DF station symbol.
    pub fn dfs_extension(&mut self, strength: u8, height: char, gain: u8, directivity: u8) {
        self.symbol_table = '/';
        self.symbol_code = '\\';
        self.extension = Some(format!(
            "DFS{}{}{}{}",
            strength.min(9),
            height,
            gain.min(9),
            directivity.min(8)
        ));
    }

    fn data_type(&self) -> char {
        match (self.messaging, self.timestamp.is_some()) {
            (false, false) => '!',
            (false, true) => '/',
            (true, false) => '=',
            (true, true) => '@',
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        out.push(self.data_type());
        if let Some(timestamp) = self.timestamp {
            out.push_str(&timestamp.format("%d%H%Mz").to_string());
        }
        out.push_str(&latitude(self.lat));
        out.push(self.symbol_table);
        out.push_str(&longitude(self.lon));
        out.push(self.symbol_code);

        let extension = self.extension.as_deref().filter(|e| e.len() >= 7);
        if let Some(extension) = extension {
            out.push_str(extension);
        }
        if let Some(freq) = &self.freq {
            if extension.is_some() {
                out.push('/');
            }
            out.push_str(&freq.to_string());
        }
        if let Some(altitude) = self.altitude {
            out.push_str(&format!("/A={:06}", altitude));
        }
        out.push_str(&self.comment);

        if out.len() > MAX_INFO_LEN {
            let mut end = MAX_INFO_LEN;
            while !out.is_char_boundary(end) {
                end -= 1;
            }
            out.truncate(end);
        }
        out
    }
}

impl fmt::Display for PositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A voice frequency report in the freqspec format,
/// <http://www.aprs.org/info/freqspec.txt>
///
/// Tone, CTCSS and DCS are mutually exclusive in practice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Freq {
    pub mhz: f64,
    /// Hz
    pub tone: Option<u16>,
    pub ctcss: Option<u16>,
    pub dcs: Option<u16>,
    /// Repeater offset, e.g. -500 or +600
    pub offset: Option<i32>,
    /// Miles
    pub range: Option<u16>,
    /// Narrowband FM, which switches the tone letters to lowercase.
    pub narrow: bool,
}

impl Freq {
    pub fn new(mhz: f64) -> Freq {
        Freq {
            mhz,
            ..Default::default()
        }
    }

    fn tone_letter(&self, wide: char) -> char {
        if self.narrow {
            wide.to_ascii_lowercase()
        } else {
            wide
        }
    }
}

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:07.3}MHz ", self.mhz)?;
        if let Some(tone) = self.tone {
            write!(f, "{}{:03} ", self.tone_letter('T'), tone)?;
        }
        if let Some(ctcss) = self.ctcss {
            write!(f, "{}{:03} ", self.tone_letter('C'), ctcss)?;
        }
        if let Some(dcs) = self.dcs {
            write!(f, "{}{:03} ", self.tone_letter('D'), dcs)?;
        }
        if let Some(offset) = self.offset {
            write!(f, "{:+04} ", offset)?;
        }
        if let Some(range) = self.range {
            write!(f, "R{:03}m ", range)?;
        }
        Ok(())
    }
}
