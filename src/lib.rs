//! APRS packets in Rust.
//!
//! This crate encodes and decodes Automatic Packet Reporting System frames and moves
//! them over the common transports.
//!
//! Main features:
//! * Convert frames between AX.25 bytes and TNC2 text (`SRC>DST,PATH:info`)
//! * KISS framing, and a `Tnc` client for KISS-over-TCP modems such as Dire Wolf
//! * Receive from and send to APRS-IS over TCP, or send over UDP and HTTP
//! * Generate APRS-IS passcodes
//! * Render position and weather reports for the info field
//!
//! A frame can be built by hand or parsed from text, then sent anywhere:
//!
//! ```no_run
//! use aprs::{aprs_is, passcode, Frame};
//!
//! let frame: Frame = "N0CALL-13>APRS,TCPIP*:>Testing".parse()?;
//! aprs_is::send("tcp://rotate.aprs.net:14580", &frame, passcode::generate("N0CALL").into())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! To use a radio, parse a TNC address such as `tnc:tcpkiss:192.168.0.1:8001`
//! into a `tnc::TncAddress` and open it with `tnc::Tnc::open()`.
//!
//! Sample programs are provided in the source code repository under `/demos`.

/// Station addresses and digipeater paths.
pub mod address;

/// Connect to APRS-IS servers.
pub mod aprs_is;

mod error;

/// Encoding and decoding APRS frames as AX.25 bytes or TNC2 text.
pub mod frame;

/// KISS framing used between a host and a TNC.
pub mod kiss;

pub mod passcode;

pub mod payload;

/// Connect to a TNC and use it to send and receive frames.
pub mod tnc;

pub use address::{Address, Path};
pub use error::{AddressField, ParseError};
pub use frame::Frame;
