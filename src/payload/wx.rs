use std::fmt;

use chrono::{DateTime, Utc};

use super::{latitude, longitude};

/// Station type appended to a weather report unless overridden.
pub const DEFAULT_STATION_TYPE: &str = "RustAPRS";

/// A weather station observation, rendered as a positioned weather report with
/// timestamp (APRS 1.0.1 chapter 12).
///
/// Measurements left as `None` are sent as dots so that receivers know the
/// station does not report them. Luminosity is omitted entirely when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Wx {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
    /// Degrees
    pub wind_direction: Option<u16>,
    /// Sustained one-minute wind speed in mph
    pub wind_speed: Option<u16>,
    /// Peak wind speed in mph over the last five minutes
    pub wind_gust: Option<u16>,
    /// Degrees Fahrenheit, -99 to 999
    pub temperature: Option<i16>,
    /// Inches
    pub rain_last_hour: Option<f64>,
    /// Inches
    pub rain_last_24_hours: Option<f64>,
    /// Inches
    pub rain_since_midnight: Option<f64>,
    /// Percent
    pub humidity: Option<u8>,
    /// Millibars
    pub pressure: Option<f64>,
    /// Watts per square metre
    pub luminosity: Option<u16>,
    /// Identifies the station software or hardware
    pub station_type: String,
}

impl Wx {
    /// An observation at this location and time with nothing measured yet.
    pub fn new(lat: f64, lon: f64, timestamp: DateTime<Utc>) -> Wx {
        Wx {
            lat,
            lon,
            timestamp,
            wind_direction: None,
            wind_speed: None,
            wind_gust: None,
            temperature: None,
            rain_last_hour: None,
            rain_last_24_hours: None,
            rain_since_midnight: None,
            humidity: None,
            pressure: None,
            luminosity: None,
            station_type: DEFAULT_STATION_TYPE.to_string(),
        }
    }
}

/// Hundredths of an inch, three digits.
fn rain(f: &mut fmt::Formatter<'_>, tag: char, inches: Option<f64>) -> fmt::Result {
    match inches {
        Some(inches) => write!(f, "{}{:03.0}", tag, (inches * 100.0).round()),
        None => write!(f, "{}...", tag),
    }
}

fn three_digits(f: &mut fmt::Formatter<'_>, tag: char, value: Option<u16>) -> fmt::Result {
    match value {
        Some(value) => write!(f, "{}{:03}", tag, value),
        None => write!(f, "{}...", tag),
    }
}

impl fmt::Display for Wx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{}z{}/{}",
            self.timestamp.format("%d%H%M"),
            latitude(self.lat),
            longitude(self.lon)
        )?;

        three_digits(f, '_', self.wind_direction)?;
        three_digits(f, '/', self.wind_speed)?;
        three_digits(f, 'g', self.wind_gust)?;

        match self.temperature {
            Some(t) if (-99..=999).contains(&t) => write!(f, "t{:03}", t)?,
            _ => f.write_str("t...")?,
        }

        rain(f, 'r', self.rain_last_hour)?;
        rain(f, 'p', self.rain_last_24_hours)?;
        rain(f, 'P', self.rain_since_midnight)?;

        match self.humidity {
            // 100% is sent as 00
            Some(h) => write!(f, "h{:02}", h % 100)?,
            None => f.write_str("h..")?,
        }

        match self.pressure {
            Some(mbar) if mbar > 0.0 => write!(f, "b{:05.0}", (mbar * 10.0).round())?,
            _ => f.write_str("b.....")?,
        }

        match self.luminosity {
            Some(l) if l >= 1000 => write!(f, "l{:03}", l - 1000)?,
            Some(l) => write!(f, "L{:03}", l)?,
            None => {}
        }

        f.write_str(&self.station_type)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn wx() -> Wx {
        let mut wx = Wx::new(35.7, -78.7, Utc.with_ymd_and_hms(2016, 11, 5, 20, 35, 0).unwrap());
        wx.station_type = "Stn".to_string();
        wx
    }

    #[test]
    fn test_nothing_measured() {
        assert_eq!(
            wx().to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r...p...P...h..b.....Stn"
        );
        let mut wx = wx();
        wx.station_type = DEFAULT_STATION_TYPE.to_string();
        assert!(wx.to_string().ends_with("b.....RustAPRS"));
    }

    #[test]
    fn test_pressure() {
        let mut wx = wx();
        wx.pressure = Some(1011.5);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r...p...P...h..b10115Stn"
        );
        wx.pressure = Some(0.0);
        assert!(wx.to_string().ends_with("b.....Stn"));
    }

    #[test]
    fn test_humidity() {
        let mut wx = wx();
        wx.humidity = Some(61);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r...p...P...h61b.....Stn"
        );
        wx.humidity = Some(100);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r...p...P...h00b.....Stn"
        );
    }

    #[test]
    fn test_luminosity() {
        let mut wx = wx();
        wx.luminosity = Some(864);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r...p...P...h..b.....L864Stn"
        );
        wx.luminosity = Some(1864);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r...p...P...h..b.....l864Stn"
        );
    }

    #[test]
    fn test_rain() {
        let mut wx = wx();
        wx.rain_last_hour = Some(0.0);
        wx.rain_last_24_hours = Some(0.0);
        wx.rain_since_midnight = Some(0.0);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r000p000P000h..b.....Stn"
        );
        wx.rain_last_hour = Some(0.54);
        wx.rain_last_24_hours = Some(0.23);
        wx.rain_since_midnight = Some(0.21);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_.../...g...t...r054p023P021h..b.....Stn"
        );
    }

    #[test]
    fn test_temperature() {
        let mut wx = wx();
        for (t, rendered) in [(-20, "t-20"), (0, "t000"), (72, "t072"), (-100, "t..."), (1000, "t...")] {
            wx.temperature = Some(t);
            assert!(wx.to_string().contains(rendered), "{} should render as {}", t, rendered);
        }
    }

    #[test]
    fn test_wind() {
        let mut wx = wx();
        wx.wind_direction = Some(0);
        wx.wind_speed = Some(0);
        wx.wind_gust = Some(0);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_000/000g000t...r...p...P...h..b.....Stn"
        );
        wx.wind_direction = Some(180);
        wx.wind_speed = Some(8);
        wx.wind_gust = Some(16);
        assert_eq!(
            wx.to_string(),
            "@052035z3542.00N/07842.00W_180/008g016t...r...p...P...h..b.....Stn"
        );
    }
}
