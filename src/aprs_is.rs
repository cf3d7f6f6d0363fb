//! Sending and receiving frames through APRS-IS, the internet backbone of APRS.
//!
//! APRS-IS servers speak a line protocol over TCP: the server sends a `#` banner,
//! the client sends a login line, the server answers with a `#` login response
//! and from then on frames are exchanged as TNC2 text, one per line. Servers
//! send a `#` comment about every 20 seconds to keep the connection alive.
//!
//! Frames can also be uploaded over UDP or HTTP. Both require a verified passcode,
//! see the `passcode` module.
//!
//! ```no_run
//! use aprs::aprs_is::{self, CancelToken, Login};
//! use aprs::Address;
//!
//! let login = Login::new("N0CALL".parse::<Address>()?, -1).filter("r/35.7/-78.7/50");
//! let cancel = CancelToken::new();
//! for frame in aprs_is::receive("rotate.aprs.net:14580", login, cancel.clone()) {
//!     println!("{}", frame?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::address::Address;
use crate::frame::Frame;

/// Software name sent in the login line unless overridden.
pub const SOFTWARE_NAME: &str = env!("CARGO_PKG_NAME");

/// Software version sent in the login line unless overridden.
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that can occur when talking to an APRS-IS server.
#[derive(Debug, thiserror::Error)]
pub enum IsError {
    #[error("unable to connect to APRS-IS server: {source}")]
    Connect { source: io::Error },
    #[error("unable to read from APRS-IS server: {source}")]
    Read { source: io::Error },
    #[error("unable to write to APRS-IS server: {source}")]
    Write { source: io::Error },
    #[error("timed out waiting for APRS-IS server")]
    Timeout,
    #[error("APRS-IS server closed the connection")]
    Closed,
    #[error("callsign not verified: a passcode is required for this scheme")]
    NotVerified,
    #[error("unhandled APRS-IS scheme '{scheme}'")]
    UnhandledScheme { scheme: String },
    #[error("dial string '{dial}' should be of the form scheme://host:port")]
    InvalidDial { dial: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP request returned status {0}")]
    HttpStatus(u16),
}

/// How long to wait for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Applies to the banner and login response.
    pub banner: Duration,
    /// Applies to each line once logged in. This is also the longest it can
    /// take for a cancellation to be noticed.
    pub heartbeat: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            banner: Duration::from_secs(5),
            // Heartbeats arrive every 20 seconds
            heartbeat: Duration::from_secs(30),
        }
    }
}

/// The login line sent to an APRS-IS server.
///
/// `user CALL pass PASSCODE vers NAME VERSION [filter EXPR...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub callsign: Address,
    /// A negative passcode logs in unverified.
    pub passcode: i32,
    pub software_name: String,
    pub software_version: String,
    /// Server-side filter expressions, see <http://www.aprs-is.net/javAPRSFilter.aspx>
    pub filter: Vec<String>,
}

impl Login {
    pub fn new(callsign: Address, passcode: i32) -> Login {
        Login {
            callsign,
            passcode,
            software_name: SOFTWARE_NAME.to_string(),
            software_version: SOFTWARE_VERSION.to_string(),
            filter: Vec::new(),
        }
    }

    /// Identify as different software.
    pub fn software(mut self, name: &str, version: &str) -> Login {
        self.software_name = name.to_string();
        self.software_version = version.to_string();
        self
    }

    /// Add a filter expression such as `t/w` or `r/35.7/-78.7/50`.
    pub fn filter(mut self, expr: &str) -> Login {
        self.filter.push(expr.to_string());
        self
    }

    pub fn is_verified(&self) -> bool {
        self.passcode >= 0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user {} pass {} vers {} {}",
            self.callsign.station_id(),
            self.passcode,
            self.software_name,
            self.software_version
        )?;
        if !self.filter.is_empty() {
            write!(f, " filter {}", self.filter.join(" "))?;
        }
        Ok(())
    }
}

/// Where to upload a frame, parsed from `tcp://host:port`, `udp://host:port`
/// or `http://host:port[/path]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dial {
    Tcp(String),
    Udp(String),
    /// The complete URL to post to
    Http(String),
}

impl FromStr for Dial {
    type Err = IsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s.split_once("://").ok_or_else(|| IsError::InvalidDial {
            dial: s.to_string(),
        })?;
        match scheme.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Dial::Tcp(rest.to_string())),
            "udp" => Ok(Dial::Udp(rest.to_string())),
            "http" => Ok(Dial::Http(s.to_string())),
            _ => Err(IsError::UnhandledScheme {
                scheme: scheme.to_string(),
            }),
        }
    }
}

/// Shared flag for stopping a `receive()` from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A logged-in connection to an APRS-IS server. The connection closes when
/// the session is dropped.
pub struct Session {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    timeouts: Timeouts,
}

impl Session {
    /// Connect, read the banner, log in and read the login response.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        login: &Login,
        timeouts: Timeouts,
    ) -> Result<Session, IsError> {
        let writer = TcpStream::connect(addr).map_err(|e| IsError::Connect { source: e })?;
        let reader = BufReader::new(
            writer
                .try_clone()
                .map_err(|e| IsError::Connect { source: e })?,
        );
        let mut session = Session {
            reader,
            writer,
            timeouts,
        };

        let banner = session.read_line(timeouts.banner)?;
        debug!(%banner, "connected to APRS-IS");
        session.write_line(&login.to_string())?;
        // e.g. "# logresp N0CALL unverified, server T2TEST"
        let response = session.read_line(timeouts.banner)?;
        info!(callsign = %login.callsign, %response, "logged in to APRS-IS");

        Ok(session)
    }

    /// Send a frame as a TNC2 line.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), IsError> {
        self.write_line(&frame.to_string())
    }

    /// Wait for the next frame from the server, skipping comments and lines that
    /// do not parse.
    ///
    /// Returns `None` if the server closes the connection, or if `cancel` is
    /// found to be set before a read.
    pub fn next_frame(&mut self, cancel: &CancelToken) -> Result<Option<Frame>, IsError> {
        self.next_frame_until(|| cancel.is_cancelled())
    }

    fn next_frame_until(
        &mut self,
        stopped: impl Fn() -> bool,
    ) -> Result<Option<Frame>, IsError> {
        loop {
            if stopped() {
                debug!("APRS-IS receive cancelled");
                return Ok(None);
            }
            let line = match self.read_line(self.timeouts.heartbeat) {
                Ok(line) => line,
                Err(IsError::Closed) => return Ok(None),
                Err(e) => return Err(e),
            };
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                trace!(%line, "APRS-IS comment");
                continue;
            }
            match line.parse::<Frame>() {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => debug!(%line, error = %e, "skipping unparseable line"),
            }
        }
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, IsError> {
        self.reader
            .get_ref()
            .set_read_timeout(Some(timeout))
            .map_err(|e| IsError::Read { source: e })?;
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => Err(IsError::Closed),
            Ok(_) => Ok(String::from_utf8_lossy(&line).trim().to_string()),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Err(IsError::Timeout)
            }
            Err(e) => Err(IsError::Read { source: e }),
        }
    }

    fn write_line(&mut self, line: &str) -> Result<(), IsError> {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|e| IsError::Write { source: e })
    }
}

/// Frames received by `receive()`, in the order the server sent them.
///
/// A failure to connect, log in or read is delivered as a final `Err`. The
/// iterator ends without an error when the server closes the connection or the
/// receive is cancelled.
///
/// Dropping the iterator stops the worker before its next read, closing the
/// connection even if no further frames arrive.
pub struct Frames {
    receiver: Receiver<Result<Frame, IsError>>,
    dropped: CancelToken,
}

impl Drop for Frames {
    fn drop(&mut self) {
        self.dropped.cancel();
    }
}

impl Iterator for Frames {
    type Item = Result<Frame, IsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

/// Receive frames from an APRS-IS server such as `rotate.aprs.net:14580` on a
/// background thread, until cancelled.
pub fn receive(server: &str, login: Login, cancel: CancelToken) -> Frames {
    receive_with_timeouts(server, login, cancel, Timeouts::default())
}

pub fn receive_with_timeouts(
    server: &str,
    login: Login,
    cancel: CancelToken,
    timeouts: Timeouts,
) -> Frames {
    let (sender, receiver) = channel();
    let server = server.to_string();
    let dropped = CancelToken::new();
    let stop = {
        let dropped = dropped.clone();
        move || cancel.is_cancelled() || dropped.is_cancelled()
    };

    thread::spawn(move || {
        match run_receive(&server, &login, stop, timeouts, &sender) {
            Ok(()) => info!(%server, "APRS-IS receive finished"),
            Err(e) => {
                warn!(%server, error = %e, "APRS-IS receive failed");
                let _ = sender.send(Err(e));
            }
        }
    });

    Frames { receiver, dropped }
}

fn run_receive(
    server: &str,
    login: &Login,
    stopped: impl Fn() -> bool,
    timeouts: Timeouts,
    sender: &Sender<Result<Frame, IsError>>,
) -> Result<(), IsError> {
    let mut session = Session::connect(server, login, timeouts)?;
    while let Some(frame) = session.next_frame_until(&stopped)? {
        if sender.send(Ok(frame)).is_err() {
            debug!("APRS-IS frames dropped by consumer");
            break;
        }
    }
    Ok(())
}

/// Send a frame to APRS-IS using a dial string of the form `scheme://host:port`,
/// where scheme is `tcp`, `udp` or `http`. This is most commonly used for CWOP.
///
/// The frame's source is used as the login callsign.
pub fn send(dial: &str, frame: &Frame, passcode: i32) -> Result<(), IsError> {
    match dial.parse::<Dial>()? {
        Dial::Tcp(addr) => send_tcp(&addr, frame, passcode),
        Dial::Udp(addr) => send_udp(&addr, frame, passcode),
        Dial::Http(url) => send_http(&url, frame, passcode),
    }
}

/// The oldest and most compatible upload method, and the only one that
/// accepts unverified logins.
pub fn send_tcp(addr: &str, frame: &Frame, passcode: i32) -> Result<(), IsError> {
    let login = Login::new(frame.source.clone(), passcode);
    let mut session = Session::connect(addr, &login, Timeouts::default())?;
    session.send_frame(frame)?;
    debug!(%frame, "sent frame over APRS-IS TCP");
    Ok(())
}

/// The most efficient upload method, with no acknowledgement of receipt.
pub fn send_udp(addr: &str, frame: &Frame, passcode: i32) -> Result<(), IsError> {
    let login = Login::new(frame.source.clone(), passcode);
    if !login.is_verified() {
        return Err(IsError::NotVerified);
    }

    let target = addr
        .to_socket_addrs()
        .map_err(|e| IsError::Connect { source: e })?
        .next()
        .ok_or_else(|| IsError::Connect {
            source: io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", addr)),
        })?;
    let local: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).map_err(|e| IsError::Connect { source: e })?;
    socket
        .send_to(format!("{}\r\n{}", login, frame).as_bytes(), target)
        .map_err(|e| IsError::Write { source: e })?;
    debug!(%frame, "sent frame over APRS-IS UDP");
    Ok(())
}

/// The least efficient upload method, but it confirms receipt.
pub fn send_http(url: &str, frame: &Frame, passcode: i32) -> Result<(), IsError> {
    let login = Login::new(frame.source.clone(), passcode);
    if !login.is_verified() {
        return Err(IsError::NotVerified);
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(Timeouts::default().heartbeat)
        .build()?;
    let response = client
        .post(url)
        .header("Accept-Type", "text/plain")
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(format!("{}\r\n{}", login, frame))
        .send()?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(IsError::HttpStatus(response.status().as_u16()));
    }
    debug!(%frame, "sent frame over APRS-IS HTTP");
    Ok(())
}
