//! # Application Layer Protocols
//!
//! Application protocols carried over the MQTT session. Each one only deals
//! with topics and payloads; the session and the protocol client take care of
//! getting bytes on and off the wire.
//!
//! ## Available Protocols
//!
//! - **[`cayenne`]**: the Cayenne MQTT API (v1) topic and payload model

/// Cayenne MQTT API implementation.
///
/// Topic paths, inbound message decoding and outbound payload encoding for
/// the myDevices Cayenne IoT cloud.
pub mod cayenne;
