use std::fmt;
use std::str::FromStr;

use crate::address::{decode_address, Address, Path};
use crate::error::ParseError;

/// Control field of an Unnumbered Information (UI) frame. APRS only uses UI frames.
pub const UI_CONTROL: u8 = 0x03;

/// Protocol identifier for "no layer 3 protocol".
pub const PID_NO_LAYER3: u8 = 0xf0;

/// Destination, source, control and protocol ID.
pub const MIN_FRAME_LEN: usize = 16;

/// A complete APRS frame.
///
/// The same frame has two wire representations:
/// * AX.25 bytes, for TNCs: see `to_bytes()` and `from_bytes()`
/// * TNC2 text such as `N0CALL>APZ001,WIDE1-1:Hello`, for APRS-IS: see
///   the `Display` and `FromStr` implementations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub destination: Address,
    pub source: Address,
    /// Digipeaters the frame has taken or will take, in order
    pub path: Path,
    /// The information field. APRS data is usually ASCII but this is not guaranteed.
    pub info: Vec<u8>,
}

impl Frame {
    pub fn new(source: Address, destination: Address, path: Path, info: impl Into<Vec<u8>>) -> Frame {
        Frame {
            destination,
            source,
            path,
            info: info.into(),
        }
    }

    /// Returns a UTF-8 string that is a "best effort" at displaying the information field.
    pub fn info_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.info).into_owned()
    }

    /// Encode as an AX.25 UI frame.
    ///
    /// `Destination (7) | Source (7) | Path (0-56) | Control (1) | PID (1) | Info`
    ///
    /// The last address in the path is marked as such, or the source address
    /// if there is no path.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(MIN_FRAME_LEN + self.path.len() * 7 + self.info.len());
        frame.extend(self.destination.to_bytes(false));
        frame.extend(self.source.to_bytes(self.path.is_empty()));
        for (i, repeater) in self.path.iter().enumerate() {
            frame.extend(repeater.to_bytes(i + 1 == self.path.len()));
        }
        frame.push(UI_CONTROL);
        frame.push(PID_NO_LAYER3);
        frame.extend(&self.info);
        frame
    }

    /// Decode an AX.25 UI frame. Any other kind of frame is an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Frame, ParseError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(ParseError::FrameTooShort(bytes.len()));
        }

        let (destination, _) = decode_address(&bytes[0..7])?;
        let (source, mut last) = decode_address(&bytes[7..14])?;
        let mut path = Path::new();
        let mut i = 14;
        while !last {
            let chunk = bytes
                .get(i..i + 7)
                .ok_or(ParseError::FrameNoTerminalAddress)?;
            let (repeater, terminal) = decode_address(chunk)?;
            path.push(repeater);
            last = terminal;
            i += 7;
        }

        let (control, pid) = match bytes.get(i..i + 2) {
            Some(&[control, pid]) => (control, pid),
            _ => return Err(ParseError::FrameIncomplete),
        };
        if control != UI_CONTROL {
            return Err(ParseError::FrameBadControl(control));
        }
        if pid != PID_NO_LAYER3 {
            return Err(ParseError::FrameBadProtocolId(pid));
        }

        Ok(Frame {
            destination,
            source,
            path,
            info: bytes[i + 2..].to_vec(),
        })
    }
}

impl fmt::Display for Frame {
    /// TNC2 format. The source and destination never show a repeated marker.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}>{}",
            self.source.station_id(),
            self.destination.station_id()
        )?;
        if !self.path.is_empty() {
            write!(f, ",{}", self.path)?;
        }
        write!(f, ":{}", self.info_string_lossy())
    }
}

impl FromStr for Frame {
    type Err = ParseError;

    /// Parse TNC2 format `SRC>DST[,PATH]:TEXT`.
    ///
    /// This is strict: callsigns must be 1-6 letters/numbers and SSIDs 0-15
    /// without leading zeroes. Only path entries may be marked repeated.
    /// Text stops at the first line feed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (header, text) = s.split_once(':').ok_or(ParseError::FrameInvalid)?;
        let (src, rest) = header.split_once('>').ok_or(ParseError::FrameInvalid)?;
        let (dst, path) = match rest.split_once(',') {
            Some((dst, path)) => (dst, Some(path)),
            None => (rest, None),
        };

        let valid = is_tnc2_address(src, false)
            && is_tnc2_address(dst, false)
            && path.map_or(true, |p| p.split(',').all(|a| is_tnc2_address(a, true)));
        if !valid {
            return Err(ParseError::FrameInvalid);
        }

        let text = text.split('\n').next().unwrap_or_default();
        Ok(Frame {
            source: src.parse()?,
            destination: dst.parse()?,
            path: path.unwrap_or_default().parse()?,
            info: text.as_bytes().to_vec(),
        })
    }
}

/// Whether `s` is `CALL[-SSID]`, optionally followed by `*`.
fn is_tnc2_address(s: &str, allow_repeated: bool) -> bool {
    let s = match s.strip_suffix('*') {
        Some(rest) if allow_repeated => rest,
        _ => s,
    };
    let (callsign, ssid) = match s.split_once('-') {
        Some((callsign, ssid)) => (callsign, Some(ssid)),
        None => (s, None),
    };
    let callsign_ok = (1..=6).contains(&callsign.len())
        && callsign.bytes().all(|b| b.is_ascii_alphanumeric());
    let ssid_ok = match ssid.map(str::as_bytes) {
        None => true,
        Some([d]) => d.is_ascii_digit(),
        Some([b'1', d]) => (b'0'..=b'5').contains(d),
        Some(_) => false,
    };
    callsign_ok && ssid_ok
}

#[cfg(test)]
mod test {
    use super::*;

    // KG4HIE>APK102,W4LBT-9,WIDE1,KD4PBS-3*,WIDE2:=3438.51N/07941.15W_120/001g004t073r   p   P000h  b     KU2k<0x0d>
    const WX_1: &[u8] = &[
        0x82, 0xa0, 0x96, 0x62, 0x60, 0x64, 0x60, 0x96, 0x8e, 0x68, 0x90, 0x92, 0x8a, 0xe0, 0xae,
        0x68, 0x98, 0x84, 0xa8, 0x40, 0xf2, 0xae, 0x92, 0x88, 0x8a, 0x62, 0x40, 0xe0, 0x96, 0x88,
        0x68, 0xa0, 0x84, 0xa6, 0xe6, 0xae, 0x92, 0x88, 0x8a, 0x64, 0x40, 0x61, 0x03, 0xf0, 0x3d,
        0x33, 0x34, 0x33, 0x38, 0x2e, 0x35, 0x31, 0x4e, 0x2f, 0x30, 0x37, 0x39, 0x34, 0x31, 0x2e,
        0x31, 0x35, 0x57, 0x5f, 0x31, 0x32, 0x30, 0x2f, 0x30, 0x30, 0x31, 0x67, 0x30, 0x30, 0x34,
        0x74, 0x30, 0x37, 0x33, 0x72, 0x20, 0x20, 0x20, 0x70, 0x20, 0x20, 0x20, 0x50, 0x30, 0x30,
        0x30, 0x68, 0x20, 0x20, 0x62, 0x20, 0x20, 0x20, 0x20, 0x20, 0x4b, 0x55, 0x32, 0x6b, 0x0d,
    ];

    // N4MTT-2>APX209,KD4PBS-3*,WIDE2-2:@270055z3548.41N/07846.35W_360/000g000t066r000P000p000h63b10183XU2k<0x0d>
    const WX_2: &[u8] = &[
        0x82, 0xa0, 0xb0, 0x64, 0x60, 0x72, 0xe0, 0x9c, 0x68, 0x9a, 0xa8, 0xa8, 0x40, 0x64, 0x96,
        0x88, 0x68, 0xa0, 0x84, 0xa6, 0xe6, 0xae, 0x92, 0x88, 0x8a, 0x64, 0x40, 0x65, 0x03, 0xf0,
        0x40, 0x32, 0x37, 0x30, 0x30, 0x35, 0x35, 0x7a, 0x33, 0x35, 0x34, 0x38, 0x2e, 0x34, 0x31,
        0x4e, 0x2f, 0x30, 0x37, 0x38, 0x34, 0x36, 0x2e, 0x33, 0x35, 0x57, 0x5f, 0x33, 0x36, 0x30,
        0x2f, 0x30, 0x30, 0x30, 0x67, 0x30, 0x30, 0x30, 0x74, 0x30, 0x36, 0x36, 0x72, 0x30, 0x30,
        0x30, 0x50, 0x30, 0x30, 0x30, 0x70, 0x30, 0x30, 0x30, 0x68, 0x36, 0x33, 0x62, 0x31, 0x30,
        0x31, 0x38, 0x33, 0x58, 0x55, 0x32, 0x6b, 0x0d,
    ];

    const WX_2_INFO: &str =
        "@270055z3548.41N/07846.35W_360/000g000t066r000P000p000h63b10183XU2k\r";

    const TNC2_BAD: &[&str] = &[
        "N0CALLL>APZ001:Hello world",
        "N0CALL-16>APZ001:Hello world",
        "N0CALL-XX>APZ001:Hello world",
        "N0CALL>APZ001,N0CALL-XX:Hello world",
        "N0CALL-05>APZ001:Hello world",
        "N0CALL*>APZ001:Hello world",
        "N0CALL>APZ001*:Hello world",
        "N0CALL>APZ001,:Hello world",
        "N0CALL>APZ001,WIDE1-1**:Hello world",
        ">APZ001:Hello world",
        "N0CALL>:Hello world",
        "N0CALL APZ001:Hello world",
        "N0CALL>APZ001 Hello world",
        "N0 CALL>APZ001:Hello world",
    ];

    const TNC2_GOOD: &[&str] = &[
        "N0CALL>APZ001:Hello world",
        "N0CALL-13>APZ001:Hello world",
        "N0CALL-13>APZ001,WIDE1-1,WIDE2-1:Hello world",
        "N0CALL-13>APZ001,TCPIP*,qAS,N0CALL:Hello world",
        "W4DEX-2>APU25N,TCPIP*,qAC,FIFTH:@270130z3515.35N/08022.82W_000/000g000t073r000p000P000h74b10177/WX",
        "K4CCC-9>APRS,NE4SC-12,WA4USN-3*,qAR,WA4USN-5:!!0000000402ED024E27CD0383--------00EE050700000000",
        "WR4AGC-5>APRX23,TCPIP*,qAC,SIXTH::WR4AGC-5 :PARM.Avg 10m,Avg 10m,RxPkts,IGateDropRx,TxPkts",
        "K4OGB-9>APN383,WIDE2-2,qAR,KM4FZA:!3521.61NS08017.87W#PHG7430/W3,NC3 Digi  Albemarle NC",
        "K4CCC-9>APRS,NE4SC-12,W4HRS-15,WIDE2*,qAR,WA4USN-5:CHESTERFIELD COUNTY AMATEUR RADIO SOCIETY",
        "K4JH-1>APRX28,TCPIP*,qAC,T2MCI:;443.100NC*013104h3529.51N/07850.14Wrhttp://www.carolina440.net 443.100 MHz PL 100.0 Hz",
        "KD4PBS-3>APN382,WIDE2-1,qAR,K4JH-1:!3540.59NN07832.12W#PHG7760/W2, NCn digi listening 147.39+88.5Hz",
        "W3AHL-2>APTPV1,KD4PBS-3*,WIDE2-1,qAR,K4RAX-10:@270130z3551.25N/07907.52W_000/000g000t072r000p001P001h81b08326.DsVP",
        "NC4LA-4>APN390,WIDE2-2,qAR,N4ILM-4:!3514.85NS07735.90W#PHG7650d/W2,NCn-N Kinston N.C.",
        "KG4AGD>APRS,TCPIP*,qAC,FOURTH:@270131z3521.18N/07833.48W_019/002g004t072r000p000P000h75b10206 VISR3760 400",
        "KC6URO-13>APTW14,KD4PBS-3*,WIDE2-1,qAR,K4JH-1:_04021046c110s000g000t068r000p000P000h..b.....tU2k",
        "KJ4GPT-1>APDW13,TCPIP*,qAC,T2PR:!3530.48NR08019.15W#Kahuna's RASPi DireWolf iGate Gold Hill,NC",
        "W4DEX-2>APU25N,TCPIP*,qAC,FIFTH:@270131z3515.35N/08022.82W_000/000g000t073r000p000P000h74b10177/WX",
        "N0CALL>APZ001:",
    ];

    fn addr(callsign: &str, ssid: u8, repeated: bool) -> Address {
        Address {
            callsign: callsign.to_string(),
            ssid,
            repeated,
        }
    }

    #[test]
    fn test_from_bytes() {
        let frame = Frame::from_bytes(WX_2).unwrap();
        assert_eq!(frame.destination, addr("APX209", 0, true));
        assert_eq!(frame.source, addr("N4MTT", 2, false));
        assert_eq!(
            frame.path,
            Path(vec![addr("KD4PBS", 3, true), addr("WIDE2", 2, false)])
        );
        assert_eq!(frame.info, WX_2_INFO.as_bytes());
    }

    #[test]
    fn test_to_bytes() {
        let frame = Frame {
            source: addr("N4MTT", 2, false),
            destination: addr("APX209", 0, true),
            path: Path(vec![addr("KD4PBS", 3, true), addr("WIDE2", 2, false)]),
            info: WX_2_INFO.as_bytes().to_vec(),
        };
        assert_eq!(frame.to_bytes(), WX_2);
    }

    #[test]
    fn test_binary_round_trip() {
        for bytes in [WX_1, WX_2] {
            let frame = Frame::from_bytes(bytes).unwrap();
            assert_eq!(frame.to_bytes(), bytes);
            assert_eq!(Frame::from_bytes(&frame.to_bytes()).unwrap(), frame);
        }

        // Without a path the source is the last address
        let frame = Frame::new(
            addr("N0CALL", 13, false),
            addr("APZ001", 0, false),
            Path::new(),
            "Hello world",
        );
        let bytes = frame.to_bytes();
        assert_eq!(bytes[13] & 0x01, 0x01);
        assert_eq!(Frame::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_truncated_frames() {
        for bytes in [WX_1, WX_2] {
            let frame = Frame::from_bytes(bytes).unwrap();
            let header_len = 14 + frame.path.len() * 7 + 2;
            for i in 0..bytes.len() {
                match Frame::from_bytes(&bytes[0..i]) {
                    Ok(partial) => {
                        assert!(i >= header_len);
                        assert_eq!(partial.info, &bytes[header_len..i]);
                    }
                    Err(_) => assert!(i < header_len),
                }
            }
        }
    }

    #[test]
    fn test_from_bytes_errors() {
        assert_eq!(Frame::from_bytes(&[]), Err(ParseError::FrameTooShort(0)));
        assert_eq!(
            Frame::from_bytes(&WX_2[0..15]),
            Err(ParseError::FrameTooShort(15))
        );
        assert_eq!(
            Frame::from_bytes(&WX_2[0..20]),
            Err(ParseError::FrameNoTerminalAddress)
        );
        assert_eq!(
            Frame::from_bytes(&WX_2[0..27]),
            Err(ParseError::FrameNoTerminalAddress)
        );
        assert_eq!(
            Frame::from_bytes(&WX_2[0..28]),
            Err(ParseError::FrameIncomplete)
        );
        assert_eq!(
            Frame::from_bytes(&WX_2[0..29]),
            Err(ParseError::FrameIncomplete)
        );

        let mut bad_control = WX_2.to_vec();
        bad_control[28] = 0x13;
        assert_eq!(
            Frame::from_bytes(&bad_control),
            Err(ParseError::FrameBadControl(0x13))
        );

        let mut bad_pid = WX_2.to_vec();
        bad_pid[29] = 0xcc;
        assert_eq!(
            Frame::from_bytes(&bad_pid),
            Err(ParseError::FrameBadProtocolId(0xcc))
        );
    }

    #[test]
    fn test_fromstr() {
        for s in TNC2_BAD {
            assert_eq!(s.parse::<Frame>(), Err(ParseError::FrameInvalid), "{}", s);
        }
        for s in TNC2_GOOD {
            assert!(s.parse::<Frame>().is_ok(), "{}", s);
        }

        let frame: Frame = "N0CALL>APZ001:Hello world".parse().unwrap();
        assert_eq!(frame.source.callsign, "N0CALL");
        assert_eq!(frame.destination.callsign, "APZ001");
        assert!(frame.path.is_empty());
        assert_eq!(frame.info, b"Hello world");

        let frame: Frame = "K4CCC-9>APRS,NE4SC-12,W4HRS-15,WIDE2*,qAR,WA4USN-5:TEXT"
            .parse()
            .unwrap();
        assert_eq!(frame.source, addr("K4CCC", 9, false));
        assert_eq!(frame.path.len(), 5);
        assert_eq!(frame.path[2], addr("WIDE2", 0, true));
        assert_eq!(frame.path[4], addr("WA4USN", 5, false));
    }

    #[test]
    fn test_fromstr_text_stops_at_line_feed() {
        let frame: Frame = "N0CALL>APZ001:one\ntwo".parse().unwrap();
        assert_eq!(frame.info, b"one");
        let frame: Frame = "N0CALL>APZ001:a:b\r".parse().unwrap();
        assert_eq!(frame.info, b"a:b\r");
    }

    #[test]
    fn test_display() {
        let frame = Frame::new(
            "N0CALL-13".parse().unwrap(),
            "APZ001".parse().unwrap(),
            "WIDE1-1,WIDE2-1".parse().unwrap(),
            "Hello world",
        );
        assert_eq!(
            frame.to_string(),
            "N0CALL-13>APZ001,WIDE1-1,WIDE2-1:Hello world"
        );

        assert_eq!(
            Frame::from_bytes(WX_1).unwrap().to_string(),
            "KG4HIE>APK102,W4LBT-9,WIDE1,KD4PBS-3*,WIDE2:=3438.51N/07941.15W_120/001g004t073r   p   P000h  b     KU2k\r"
        );
        // The destination is marked repeated in the binary but never shown
        assert_eq!(
            Frame::from_bytes(WX_2).unwrap().to_string(),
            "N4MTT-2>APX209,KD4PBS-3*,WIDE2-2:@270055z3548.41N/07846.35W_360/000g000t066r000P000p000h63b10183XU2k\r"
        );
    }

    #[test]
    fn test_text_round_trip() {
        for s in TNC2_GOOD {
            let frame: Frame = s.parse().unwrap();
            let reparsed: Frame = frame.to_string().parse().unwrap();
            assert_eq!(reparsed.source, frame.source);
            assert_eq!(reparsed.destination, frame.destination);
            assert_eq!(reparsed.info, frame.info);
        }
    }
}
