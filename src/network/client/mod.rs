//! Reference collaborator implementations.
//!
//! - [`mqtt`]: an MQTT 3.1.1 [`ProtocolClient`](crate::network::ProtocolClient)
//!   that runs over any [`Link`](crate::network::Link).
//! - [`tcp`]: a `std::net` TCP [`Link`](crate::network::Link) (requires `std`).

/// MQTT 3.1.1 protocol client
pub mod mqtt;

/// TCP link over the standard library
#[cfg(feature = "std")]
pub mod tcp;

pub use mqtt::{MqttClient, Options};
#[cfg(feature = "std")]
pub use tcp::TcpLink;
