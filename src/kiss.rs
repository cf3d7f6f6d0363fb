use std::io;
use std::io::prelude::*;
use std::net::Shutdown;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::sync::Mutex;

pub const FEND: u8 = 0xC0;
pub const FESC: u8 = 0xDB;
pub const TFEND: u8 = 0xDC;
pub const TFESC: u8 = 0xDD;

/// Command nybble for a data frame to be transmitted (or one that was received).
pub const CMD_DATA: u8 = 0x00;

/// A frame exchanged with a KISS TNC, after unescaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KissFrame {
    /// TNC port number, 0-15
    pub port: u8,
    /// Command nybble. `CMD_DATA` frames carry an AX.25 frame.
    pub command: u8,
    pub data: Vec<u8>,
}

/// Replace every `FEND` and `FESC` with its two-byte escape sequence.
pub fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            FEND => escaped.extend([FESC, TFEND]),
            FESC => escaped.extend([FESC, TFESC]),
            _ => escaped.push(b),
        }
    }
    escaped
}

/// Build a complete KISS data frame for the given TNC port.
pub fn wrap(frame: &[u8], port: u8) -> Vec<u8> {
    // The command byte is two nybbles: port, then command
    let mut wrapped = Vec::with_capacity(frame.len() + 4);
    wrapped.push(FEND);
    wrapped.push(CMD_DATA | ((port & 0x0f) << 4));
    wrapped.extend(escape(frame));
    wrapped.push(FEND);
    wrapped
}

/// Take the first complete frame out of a buffer of received bytes, if there is one.
///
/// Bytes before the first `FEND` are discarded along with the frame. The closing
/// `FEND` is left in place to act as the start marker for the next frame.
pub fn extract_frame(buffer: &mut Vec<u8>) -> Option<KissFrame> {
    let mut possible_frame = Vec::new();

    enum Scan {
        LookingForStartMarker,
        Data,
        Escaped,
    }
    let mut state = Scan::LookingForStartMarker;
    let mut final_idx = 0;

    // Check for possible frame read-only until we know we have a complete frame
    // If we take one out, clear out buffer up to the final index
    for (idx, &c) in buffer.iter().enumerate() {
        match state {
            Scan::LookingForStartMarker => {
                if c == FEND {
                    state = Scan::Data;
                }
            }
            Scan::Data => {
                if c == FEND {
                    if !possible_frame.is_empty() {
                        final_idx = idx;
                        break;
                    }
                } else if c == FESC {
                    state = Scan::Escaped;
                } else {
                    possible_frame.push(c);
                }
            }
            Scan::Escaped => {
                if c == TFEND {
                    possible_frame.push(FEND);
                } else if c == TFESC {
                    possible_frame.push(FESC);
                } else if c == FEND && !possible_frame.is_empty() {
                    final_idx = idx;
                    break;
                }
                state = Scan::Data;
            }
        }
    }

    if final_idx == 0 {
        return None;
    }
    buffer.drain(0..final_idx);

    // Non-empty, so there is always a command byte
    let command = possible_frame.remove(0);
    Some(KissFrame {
        port: command >> 4,
        command: command & 0x0f,
        data: possible_frame,
    })
}

/// A KISS TNC reachable over TCP, such as Dire Wolf.
pub struct TcpKissInterface {
    // Interior mutability is desirable so that we can clone the TNC and have
    // different threads sending and receiving concurrently.
    tx_stream: Mutex<TcpStream>,
    rx_stream: Mutex<TcpStream>,
    buffer: Mutex<Vec<u8>>,
}

impl TcpKissInterface {
    pub fn new<A: ToSocketAddrs>(addr: A) -> io::Result<TcpKissInterface> {
        let tx_stream = TcpStream::connect(addr)?;
        let rx_stream = tx_stream.try_clone()?;
        Ok(TcpKissInterface {
            tx_stream: Mutex::new(tx_stream),
            rx_stream: Mutex::new(rx_stream),
            buffer: Mutex::new(Vec::new()),
        })
    }

    /// Block until a complete frame arrives. A closed connection is reported
    /// as `UnexpectedEof`.
    pub fn receive_frame(&self) -> io::Result<KissFrame> {
        loop {
            {
                let mut buffer = self.buffer.lock().unwrap();
                if let Some(frame) = extract_frame(&mut buffer) {
                    return Ok(frame);
                }
            }
            let mut buf = vec![0u8; 1024];
            let n_bytes = {
                let mut rx_stream = self.rx_stream.lock().unwrap();
                rx_stream.read(&mut buf)?
            };
            if n_bytes == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            {
                let mut buffer = self.buffer.lock().unwrap();
                buffer.extend(buf.iter().take(n_bytes));
            }
        }
    }

    pub fn send_frame(&self, frame: &[u8], port: u8) -> io::Result<()> {
        let mut tx_stream = self.tx_stream.lock().unwrap();
        tx_stream.write_all(&wrap(frame, port))?;
        tx_stream.flush()
    }

    /// Close both directions, waking up any thread blocked in `receive_frame()`.
    pub fn shutdown(&self) {
        let tx_stream = self.tx_stream.lock().unwrap();
        let _ = tx_stream.shutdown(Shutdown::Both);
    }
}

impl Drop for TcpKissInterface {
    fn drop(&mut self) {
        self.shutdown();
    }
}
