//! Cayenne topic vocabulary and topic paths.
//!
//! Every Cayenne topic lives under
//! `v1/{username}/things/{client_id}/{topic}[/{channel}]`.

use core::fmt::{self, Write as _};

use heapless::String;
use serde::{Serialize, Serializer};

use crate::network::MAX_TOPIC_LEN;
use crate::network::error::Error;

/// Cayenne MQTT API version prefix.
pub const API_VERSION: &str = "v1";

/// Wire form of [`Channel::All`].
pub const ALL_CHANNELS: &str = "+";

/// A logical Cayenne topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Sensor data sent by the device.
    Data,
    /// Actuator command sent by the cloud.
    Command,
    /// Configuration sent by the cloud.
    Config,
    /// Acknowledgement of a command, sent by the device.
    Response,
    /// Device firmware version.
    SysVersion,
    /// Device model.
    SysModel,
    /// CPU model.
    SysCpuModel,
    /// CPU speed in Hz.
    SysCpuSpeed,
    /// Digital channel state.
    Digital,
    /// Digital channel command.
    DigitalCommand,
    /// Digital channel configuration.
    DigitalConfig,
    /// Analog channel state.
    Analog,
    /// Analog channel command.
    AnalogCommand,
    /// Analog channel configuration.
    AnalogConfig,
    /// A topic outside the known vocabulary, kept verbatim.
    Other(String<MAX_TOPIC_LEN>),
}

impl Topic {
    /// The topic's path segment(s) on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Topic::Data => "data",
            Topic::Command => "cmd",
            Topic::Config => "conf",
            Topic::Response => "response",
            Topic::SysVersion => "sys/version",
            Topic::SysModel => "sys/model",
            Topic::SysCpuModel => "sys/cpu/model",
            Topic::SysCpuSpeed => "sys/cpu/speed",
            Topic::Digital => "digital",
            Topic::DigitalCommand => "digital-cmd",
            Topic::DigitalConfig => "digital-conf",
            Topic::Analog => "analog",
            Topic::AnalogCommand => "analog-cmd",
            Topic::AnalogConfig => "analog-conf",
            Topic::Other(name) => name.as_str(),
        }
    }

    /// Map a wire name to a topic. Unknown names become [`Topic::Other`].
    pub fn from_name(name: &str) -> Result<Self, Error> {
        Ok(match name {
            "data" => Topic::Data,
            "cmd" => Topic::Command,
            "conf" => Topic::Config,
            "response" => Topic::Response,
            "sys/version" => Topic::SysVersion,
            "sys/model" => Topic::SysModel,
            "sys/cpu/model" => Topic::SysCpuModel,
            "sys/cpu/speed" => Topic::SysCpuSpeed,
            "digital" => Topic::Digital,
            "digital-cmd" => Topic::DigitalCommand,
            "digital-conf" => Topic::DigitalConfig,
            "analog" => Topic::Analog,
            "analog-cmd" => Topic::AnalogCommand,
            "analog-conf" => Topic::AnalogConfig,
            other => Topic::Other(String::try_from(other).map_err(|_| Error::BufferOverflow)?),
        })
    }

    /// Whether payloads on this topic are `{id},{value}` requests from the cloud.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Topic::Command
                | Topic::Config
                | Topic::DigitalCommand
                | Topic::DigitalConfig
                | Topic::AnalogCommand
                | Topic::AnalogConfig
        )
    }

    /// Whether the topic describes the device as a whole rather than a channel.
    pub fn is_device_level(&self) -> bool {
        matches!(
            self,
            Topic::SysVersion | Topic::SysModel | Topic::SysCpuModel | Topic::SysCpuSpeed | Topic::Response
        )
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Channel addressing within a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// A specific sensor/actuator slot.
    Number(u32),
    /// Every channel of the topic (subscriptions only).
    All,
    /// No channel: device-level topics.
    None,
}

impl Channel {
    /// The channel number, if this is a numbered channel.
    pub fn number(&self) -> Option<u32> {
        match self {
            Channel::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Parse a trailing path segment. Returns `None` if the segment is not a
    /// channel, in which case it belongs to the topic name.
    fn from_segment(segment: &str) -> Option<Self> {
        if segment == ALL_CHANNELS {
            return Some(Channel::All);
        }
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok().map(Channel::Number)
    }
}

impl From<u32> for Channel {
    fn from(channel: u32) -> Self {
        Channel::Number(channel)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Number(n) => write!(f, "{n}"),
            Channel::All => f.write_str(ALL_CHANNELS),
            Channel::None => f.write_str("none"),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Channel::Number(n) => serializer.serialize_u32(*n),
            Channel::All => serializer.serialize_str(ALL_CHANNELS),
            Channel::None => serializer.serialize_none(),
        }
    }
}

/// The pieces of a parsed topic path, borrowing from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPath<'a> {
    /// The username segment, when the full form was used.
    pub username: Option<&'a str>,
    /// The client/device id segment, when the full form was used.
    pub client_id: Option<&'a str>,
    /// The topic name, without channel.
    pub name: &'a str,
    /// The channel segment.
    pub channel: Channel,
}

impl<'a> TopicPath<'a> {
    /// Split a topic string.
    ///
    /// Accepts the full form `v1/{user}/things/{client}/{topic}[/{channel}]`
    /// and the short form `{topic}[/{channel}]`. Never fails: anything that
    /// does not look like a Cayenne path is taken as a topic name.
    pub fn parse(path: &'a str) -> Self {
        let (username, client_id, rest) = split_prefix(path);
        let (name, channel) = match rest.rsplit_once('/') {
            Some((name, last)) => match Channel::from_segment(last) {
                Some(channel) => (name, channel),
                None => (rest, Channel::None),
            },
            None => (rest, Channel::None),
        };
        Self {
            username,
            client_id,
            name,
            channel,
        }
    }

    /// The topic this path refers to.
    pub fn topic(&self) -> Result<Topic, Error> {
        Topic::from_name(self.name)
    }
}

fn split_prefix(path: &str) -> (Option<&str>, Option<&str>, &str) {
    let mut parts = path.splitn(5, '/');
    match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(API_VERSION), Some(user), Some("things"), Some(client), Some(rest)) => {
            (Some(user), Some(client), rest)
        }
        _ => (None, None, path),
    }
}

/// Build a full topic path.
///
/// ```rust
/// use iotagent::network::application::cayenne::{topic_path, Channel, Topic};
///
/// let path = topic_path("user", "device", &Topic::Data, Channel::Number(0)).unwrap();
/// assert_eq!(path.as_str(), "v1/user/things/device/data/0");
///
/// let path = topic_path("user", "device", &Topic::SysModel, Channel::None).unwrap();
/// assert_eq!(path.as_str(), "v1/user/things/device/sys/model");
/// ```
pub fn topic_path(
    username: &str,
    client_id: &str,
    topic: &Topic,
    channel: Channel,
) -> Result<String<MAX_TOPIC_LEN>, Error> {
    let mut path = String::new();
    write!(path, "{API_VERSION}/{username}/things/{client_id}/{topic}")
        .map_err(|_| Error::BufferOverflow)?;
    match channel {
        Channel::None => {}
        channel => write!(path, "/{channel}").map_err(|_| Error::BufferOverflow)?,
    }
    Ok(path)
}
