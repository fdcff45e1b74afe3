//! A network abstraction layer for the agent
//!
//! This module splits the connection to the cloud into the two layers the
//! session manages separately:
//!
//! - a [`Link`], the physical/transport connection (TCP over Ethernet, Wi-Fi,
//!   a cellular modem...), which is also the byte stream the protocol runs on;
//! - a [`ProtocolClient`], the MQTT-level session running over a link.
//!
//! Both report liveness by polling (`is_connected`), never by callback.
//!

#![allow(missing_docs)]
#![deny(unsafe_code)]

use heapless::{String, Vec};

use crate::config::{Credentials, MacAddress};

/// Common error types for network operations
pub mod error;

/// Reference collaborator implementations
pub mod client;

/// Application protocols carried over MQTT
pub mod application;

use error::Error;

/// Maximum length of an MQTT topic handled by the agent.
pub const MAX_TOPIC_LEN: usize = 256;

/// Maximum size of an MQTT payload handled by the agent.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Link, ProtocolClient, Read, Write};
}

// Core synchronous traits
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection. `Ok(0)` means no data is available yet.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// The network/link driver.
///
/// Carries no application-level semantics: it opens and closes a byte stream
/// to a host and reports whether that stream is still up.
pub trait Link: Read + Write {
    /// Prepare the interface with the device's hardware identity.
    fn init(&mut self, identity: &MacAddress) -> Result<(), Error>;
    /// Open the byte stream to `host:port`.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), Error>;
    /// Close the byte stream. Safe to call when already closed.
    fn disconnect(&mut self);
    /// Whether the byte stream is currently up.
    fn is_connected(&self) -> bool;
}

/// An incoming MQTT publish message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublishPacket {
    /// The topic on which the message was published.
    pub topic: String<MAX_TOPIC_LEN>,
    /// The message payload data.
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl PublishPacket {
    /// Build a packet from borrowed topic and payload.
    pub fn new(topic: &str, payload: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            topic: String::try_from(topic).map_err(|_| Error::BufferOverflow)?,
            payload: Vec::from_slice(payload).map_err(|_| Error::BufferOverflow)?,
        })
    }
}

/// The MQTT-level client, operating over a link owned by the caller.
///
/// The link is passed into every call so that a single owner (the session)
/// holds both layers and can tear them down independently.
pub trait ProtocolClient<L: Link> {
    /// Perform the protocol handshake with the given credentials.
    ///
    /// `keep_alive_seconds` is announced to the broker; the caller is
    /// responsible for calling [`ping`](Self::ping) within that interval.
    fn connect(
        &mut self,
        link: &mut L,
        credentials: &Credentials,
        keep_alive_seconds: u16,
    ) -> Result<(), Error>;
    /// Leave the protocol session. Safe to call when already disconnected.
    fn disconnect(&mut self, link: &mut L);
    /// Whether the protocol session is currently up.
    fn is_connected(&self) -> bool;
    /// Publish `payload` on `topic`.
    fn publish(&mut self, link: &mut L, topic: &str, payload: &[u8]) -> Result<(), Error>;
    /// Subscribe to a topic filter.
    fn subscribe(&mut self, link: &mut L, topic: &str) -> Result<(), Error>;
    /// Return the next inbound publish if one is available, without blocking.
    fn poll(&mut self, link: &mut L) -> Result<Option<PublishPacket>, Error>;
    /// Send a keep-alive ping. Fails, and marks the session down, if the
    /// previous ping was never answered.
    fn ping(&mut self, link: &mut L) -> Result<(), Error>;
}
