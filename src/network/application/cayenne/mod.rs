//! Cayenne MQTT API (v1) message model.
//!
//! Cayenne carries everything over plain MQTT topics of the form
//! `v1/{username}/things/{client_id}/{topic}[/{channel}]` with small text
//! payloads. This module maps those topics and payloads to typed values:
//!
//! - [`topic`]: the topic vocabulary, channels and topic paths
//! - [`message`]: decoding inbound messages
//! - [`payload`]: encoding outbound data and command responses
//! - [`types`]: well-known data type and unit tags
//!
//! ```rust
//! use iotagent::network::application::cayenne::{topic_path, types, Channel, DataPoint, Message, Topic};
//!
//! let inbound = Message::decode("v1/user/things/device/cmd/3", b"42,1").unwrap();
//! assert_eq!(inbound.topic, Topic::Command);
//!
//! let point = DataPoint::new(1, 1000).with_type(types::LUMINOSITY).with_unit(types::LUX);
//! let path = topic_path("user", "device", &Topic::Data, point.channel).unwrap();
//! assert_eq!(path.as_str(), "v1/user/things/device/data/1");
//! assert_eq!(point.payload().unwrap().as_str(), "lum,lux=1000");
//! # let _ = Channel::All;
//! ```

/// Inbound message decoding
pub mod message;
/// Outbound payload encoding
pub mod payload;
/// Topic vocabulary and topic paths
pub mod topic;
/// Data type and unit tags
pub mod types;


pub use message::{Message, ValueEntry};
pub use payload::{DataPoint, Parts, Payload, Value, encode_data, encode_response};
pub use topic::{Channel, Topic, TopicPath, topic_path};
