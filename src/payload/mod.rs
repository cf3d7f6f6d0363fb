//! Rendering APRS information fields for common report types.
//!
//! Each type implements `Display`, producing the text that goes in a frame's info
//! field. Nothing in the codecs or transports depends on this module.
//!
//! ```
//! use aprs::payload::PositionReport;
//! use aprs::{Address, Frame, Path};
//!
//! let mut report = PositionReport::new(44.1083775, -107.9386725, '/', 'j');
//! report.comment = "Mobile".to_string();
//! let frame = Frame::new(
//!     "N0CALL-9".parse::<Address>()?,
//!     "APZ001".parse::<Address>()?,
//!     "WIDE1-1".parse::<Path>()?,
//!     report.to_string(),
//! );
//! assert_eq!(frame.to_string(), "N0CALL-9>APZ001,WIDE1-1:!4406.50N/10756.32WjMobile");
//! # Ok::<(), aprs::ParseError>(())
//! ```

mod position;
mod wx;

pub use position::{Freq, PositionReport};
pub use wx::Wx;

/// Split an absolute coordinate into whole degrees and minutes rounded to
/// hundredths. Minutes that round up to 60 carry into the degrees.
fn degrees_minutes(value: f64) -> (f64, f64) {
    let value = value.abs();
    let degrees = value.trunc();
    let minutes = ((value - degrees) * 6000.0).round() / 100.0;
    if minutes >= 60.0 {
        (degrees + 1.0, 0.0)
    } else {
        (degrees, minutes)
    }
}

/// `DDMM.mmN` or `DDMM.mmS`
pub(crate) fn latitude(lat: f64) -> String {
    let (degrees, minutes) = degrees_minutes(lat);
    let hemisphere = if lat < 0.0 { 'S' } else { 'N' };
    format!("{:02.0}{:05.2}{}", degrees, minutes, hemisphere)
}

/// `DDDMM.mmE` or `DDDMM.mmW`
pub(crate) fn longitude(lon: f64) -> String {
    let (degrees, minutes) = degrees_minutes(lon);
    let hemisphere = if lon < 0.0 { 'W' } else { 'E' };
    format!("{:03.0}{:05.2}{}", degrees, minutes, hemisphere)
}
