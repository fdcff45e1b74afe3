//! Common error types for network and agent operations

use core::fmt;

/// A common error type for the agent and its collaborators.
///
/// This enum defines the errors that can occur while talking to the link,
/// the MQTT broker, or while decoding and encoding Cayenne messages. It is
/// designed to be simple and portable for `no_std` environments; every
/// variant maps to a stable integer code via [`Error::code`], which is what
/// status lines report.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a link that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// The broker refused the connection. Carries the CONNACK return code.
    ConnectionRefused(u8),
    /// A timeout occurred.
    Timeout,
    /// The connection was closed.
    ConnectionClosed,
    /// An invalid address was provided.
    InvalidAddress,
    /// A protocol-specific error occurred.
    ProtocolError,
    /// The session is not established.
    NotConnected,
    /// The broker rejected a subscription.
    SubscribeRejected,
    /// A fixed-capacity buffer was too small.
    BufferOverflow,
    /// A payload was not valid UTF-8.
    InvalidPayload,
    /// The configuration is incomplete or malformed.
    InvalidConfig,
}

impl Error {
    /// Integer code for this error. Never zero; zero means success.
    pub fn code(&self) -> i32 {
        match self {
            Error::NotOpen => -1,
            Error::WriteError => -2,
            Error::ReadError => -3,
            Error::ConnectionRefused(rc) => -100 - i32::from(*rc),
            Error::Timeout => -4,
            Error::ConnectionClosed => -5,
            Error::InvalidAddress => -6,
            Error::ProtocolError => -7,
            Error::NotConnected => -8,
            Error::SubscribeRejected => -9,
            Error::BufferOverflow => -10,
            Error::InvalidPayload => -11,
            Error::InvalidConfig => -12,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotOpen => f.write_str("link not open"),
            Error::WriteError => f.write_str("write failed"),
            Error::ReadError => f.write_str("read failed"),
            Error::ConnectionRefused(rc) => write!(f, "connection refused (return code {rc})"),
            Error::Timeout => f.write_str("timed out"),
            Error::ConnectionClosed => f.write_str("connection closed"),
            Error::InvalidAddress => f.write_str("invalid address"),
            Error::ProtocolError => f.write_str("protocol error"),
            Error::NotConnected => f.write_str("not connected"),
            Error::SubscribeRejected => f.write_str("subscription rejected"),
            Error::BufferOverflow => f.write_str("buffer overflow"),
            Error::InvalidPayload => f.write_str("invalid payload"),
            Error::InvalidConfig => f.write_str("invalid configuration"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused(rc) => defmt::write!(f, "ConnectionRefused({})", rc),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::NotConnected => defmt::write!(f, "NotConnected"),
            Error::SubscribeRejected => defmt::write!(f, "SubscribeRejected"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::InvalidPayload => defmt::write!(f, "InvalidPayload"),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
        }
    }
}
