use crate::frame::Frame;
use crate::kiss::{TcpKissInterface, CMD_DATA};
use std::fmt;
use std::io;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info};

/// Errors that can occur when interacting with a `Tnc`.
#[derive(Debug, thiserror::Error)]
pub enum TncError {
    #[error("Unable to connect to TNC: {source}")]
    OpenTnc { source: io::Error },
    #[error("Unable to send frame: {source}")]
    SendFrame { source: io::Error },
    #[error("Unable to receive frame: {source}")]
    ReceiveFrame { source: io::Error },
}

/// Errors that can occur when parsing a `TncAddress` from a string.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TncAddressError {
    #[error("TNC address '{string}' is invalid - it should begin with 'tnc:'")]
    NoTncPrefix { string: String },
    #[error("Unknown TNC type {tnc_type}")]
    UnknownType { tnc_type: String },
    #[error("TNC type '{tnc_type}' expects {expected} parameters to follow but there are {actual}")]
    WrongParameterCount {
        tnc_type: String,
        expected: usize,
        actual: usize,
    },
    #[error("Supplied port '{input}' should be a number from 0 to 65535")]
    InvalidPort {
        input: String,
        source: std::num::ParseIntError,
    },
}

/// Location of a KISS TNC listening on TCP, such as Dire Wolf or a soundmodem.
///
/// The string form is `tnc:tcpkiss:HOST:PORT`.
#[derive(PartialEq, Debug, Eq, Clone)]
pub struct TncAddress {
    /// Hostname or IP address of the computer with the TNC
    pub host: String,
    pub port: u16,
}

impl TncAddress {
    pub fn new_tcpkiss(host: &str, port: u16) -> Self {
        TncAddress {
            host: host.to_string(),
            port,
        }
    }
}

impl fmt::Display for TncAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tnc:tcpkiss:{}:{}", self.host, self.port)
    }
}

impl FromStr for TncAddress {
    type Err = TncAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("tnc:") {
            return Err(TncAddressError::NoTncPrefix {
                string: s.to_string(),
            });
        }
        let components: Vec<&str> = s.split(':').collect();
        let len = components.len();
        match components[1] {
            "tcpkiss" => {
                if len != 4 {
                    return Err(TncAddressError::WrongParameterCount {
                        tnc_type: components[1].to_string(),
                        expected: 2usize,
                        actual: len - 2,
                    });
                }
                Ok(TncAddress {
                    host: components[2].to_string(),
                    port: components[3]
                        .parse()
                        .map_err(|e| TncAddressError::InvalidPort {
                            input: components[3].to_string(),
                            source: e,
                        })?,
                })
            }
            unknown => Err(TncAddressError::UnknownType {
                tnc_type: unknown.to_string(),
            }),
        }
    }
}

/// Send a single frame to a KISS TNC on the given port, then disconnect.
pub fn send_kiss<A: ToSocketAddrs>(addr: A, frame: &Frame, port: u8) -> Result<(), TncError> {
    let iface = TcpKissInterface::new(addr).map_err(|e| TncError::OpenTnc { source: e })?;
    iface
        .send_frame(&frame.to_bytes(), port)
        .map_err(|e| TncError::SendFrame { source: e })
}

/// A TNC attached to a radio, which can send and receive APRS frames.
#[derive(Clone)]
pub struct Tnc(Arc<Mutex<TncInner>>);

impl Tnc {
    /// Attempt to obtain a `Tnc` connection using the provided address.
    pub fn open(address: &TncAddress) -> Result<Self, TncError> {
        let iface = TcpKissInterface::new((address.host.as_str(), address.port))
            .map_err(|e| TncError::OpenTnc { source: e })?;
        info!(%address, "connected to TNC");
        Ok(Tnc(Arc::new(Mutex::new(TncInner::new(Arc::new(iface))))))
    }

    /// Transmit a frame on the radio. Transmission is not guaranteed even if a
    /// `Ok` result is returned.
    pub fn send_frame(&self, frame: &Frame) -> Result<(), TncError> {
        self.0.lock().unwrap().send_frame(frame)
    }

    /// Create a new `Receiver<Result<Frame, TncError>>`
    /// This will receive a copy of all incoming frames.
    pub fn incoming(&self) -> Receiver<FrameResult> {
        self.0.lock().unwrap().incoming()
    }
}

pub type FrameResult = Result<Frame, Arc<TncError>>;

struct TncInner {
    iface: Arc<TcpKissInterface>,
    senders: Arc<Mutex<Vec<Sender<FrameResult>>>>,
}

impl TncInner {
    fn new(iface: Arc<TcpKissInterface>) -> Self {
        let senders: Arc<Mutex<Vec<Sender<FrameResult>>>> = Arc::new(Mutex::new(Vec::new()));

        {
            let iface = iface.clone();
            let senders = senders.clone();

            thread::spawn(move || {
                loop {
                    let x = receive_frame(&iface).map_err(Arc::new);

                    senders.lock().unwrap().retain(|s| {
                        // If there's an error, remove sender from vec
                        s.send(x.clone()).is_ok()
                    });
                    if let Err(e) = x {
                        debug!(error = %e, "TNC reader stopped");
                        break;
                    }
                }

                senders.lock().unwrap().clear();
            });
        }

        TncInner { iface, senders }
    }

    fn send_frame(&self, frame: &Frame) -> Result<(), TncError> {
        self.iface
            .send_frame(&frame.to_bytes(), 0)
            .map_err(|e| TncError::SendFrame { source: e })
    }

    fn incoming(&self) -> Receiver<FrameResult> {
        let (sender, receiver) = channel();
        self.senders.lock().unwrap().push(sender);
        receiver
    }
}

impl Drop for TncInner {
    fn drop(&mut self) {
        self.iface.shutdown();
    }
}

/// Block until the next data frame that decodes as APRS.
fn receive_frame(iface: &TcpKissInterface) -> Result<Frame, TncError> {
    loop {
        let kiss_frame = iface
            .receive_frame()
            .map_err(|e| TncError::ReceiveFrame { source: e })?;
        if kiss_frame.command != CMD_DATA {
            debug!(command = kiss_frame.command, "ignoring KISS command frame");
            continue;
        }
        match Frame::from_bytes(&kiss_frame.data) {
            Ok(frame) => return Ok(frame),
            Err(e) => debug!(port = kiss_frame.port, error = %e, "skipping undecodable frame"),
        }
    }
}
