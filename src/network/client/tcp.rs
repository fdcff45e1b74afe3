//! TCP link over `std::net`.
//!
//! Reads use a short socket timeout so the protocol client can poll without
//! blocking the agent for long: a timed-out read is reported as "no data"
//! (`Ok(0)`), while an orderly shutdown by the peer is reported as
//! [`Error::ConnectionClosed`] and drops the link.

use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::TcpStream;
use std::time::Duration;

use log::debug;

use crate::config::MacAddress;
use crate::network::error::Error;
use crate::network::{Link, Read, Write};

/// Default read timeout used while polling.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// A [`Link`] backed by a TCP socket.
#[derive(Debug)]
pub struct TcpLink {
    stream: Option<TcpStream>,
    read_timeout: Duration,
    identity: MacAddress,
}

impl TcpLink {
    /// Create a closed link with the default read timeout.
    pub fn new() -> Self {
        Self::with_read_timeout(DEFAULT_READ_TIMEOUT)
    }

    /// Create a closed link with a custom read timeout.
    pub fn with_read_timeout(read_timeout: Duration) -> Self {
        Self {
            stream: None,
            read_timeout,
            identity: [0; 6],
        }
    }

    /// The identity passed to [`Link::init`].
    pub fn identity(&self) -> &MacAddress {
        &self.identity
    }
}

impl Default for TcpLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for TcpLink {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;
        match stream.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.stream = None;
                Err(Error::ConnectionClosed)
            }
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(_) => {
                self.stream = None;
                Err(Error::ReadError)
            }
        }
    }
}

impl Write for TcpLink {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;
        let result = stream.write(buf);
        result.map_err(|_| {
            self.stream = None;
            Error::WriteError
        })
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;
        let result = stream.flush();
        result.map_err(|_| {
            self.stream = None;
            Error::WriteError
        })
    }
}

impl Link for TcpLink {
    fn init(&mut self, identity: &MacAddress) -> Result<(), Error> {
        self.identity = *identity;
        Ok(())
    }

    fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        let stream = TcpStream::connect((host, port)).map_err(|e| match e.kind() {
            ErrorKind::ConnectionRefused => Error::ConnectionRefused(0),
            ErrorKind::TimedOut => Error::Timeout,
            _ => Error::InvalidAddress,
        })?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(|_| Error::NotOpen)?;
        stream.set_nodelay(true).map_err(|_| Error::NotOpen)?;
        debug!("TCP link up to {}:{}", host, port);
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
