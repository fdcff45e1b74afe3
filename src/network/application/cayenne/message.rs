//! Inbound Cayenne messages.

use core::fmt;

use heapless::{String, Vec};
use serde::Serialize;

use super::payload::Parts;
use super::topic::{Channel, Topic, TopicPath};
use crate::network::error::Error;

/// Maximum number of value entries in one message.
pub const MAX_VALUES: usize = 8;
/// Maximum length of one value.
pub const MAX_VALUE_LEN: usize = 64;
/// Maximum length of a unit.
pub const MAX_UNIT_LEN: usize = 16;
/// Maximum length of a data type tag.
pub const MAX_TYPE_LEN: usize = 32;
/// Maximum length of a request id.
pub const MAX_ID_LEN: usize = 64;
/// Maximum length of a client id.
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// One value of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueEntry {
    /// Sensor/actuator type tag.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String<MAX_TYPE_LEN>>,
    /// The value as received.
    pub value: String<MAX_VALUE_LEN>,
    /// Unit of this value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String<MAX_UNIT_LEN>>,
}

/// A decoded inbound message.
///
/// The number of value entries is fixed when the message is decoded. Reading
/// past the last entry yields `None`.
///
/// ```rust
/// use iotagent::network::application::cayenne::{Channel, Message, Topic};
///
/// let message = Message::decode("v1/user/things/device/cmd/3", b"42,1").unwrap();
/// assert_eq!(message.topic, Topic::Command);
/// assert_eq!(message.channel, Channel::Number(3));
/// assert_eq!(message.id(), Some("42"));
/// assert_eq!(message.value(0), Some("1"));
/// assert_eq!(message.value(1), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Logical topic.
    pub topic: Topic,
    /// Channel within the topic.
    #[serde(skip_serializing_if = "is_no_channel")]
    pub channel: Channel,
    /// Device the message is addressed to, when carried in the topic path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String<MAX_CLIENT_ID_LEN>>,
    /// Request id correlating a response to a command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String<MAX_ID_LEN>>,
    values: Vec<ValueEntry, MAX_VALUES>,
}

fn is_no_channel(channel: &Channel) -> bool {
    *channel == Channel::None
}

impl Message {
    /// Decode a message from its MQTT topic and payload.
    ///
    /// Missing pieces (client id, id, type, unit) are valid and simply absent.
    /// Fails only on a non-UTF-8 payload or when a field exceeds its capacity.
    pub fn decode(topic: &str, payload: &[u8]) -> Result<Self, Error> {
        let path = TopicPath::parse(topic);
        let payload = core::str::from_utf8(payload).map_err(|_| Error::InvalidPayload)?;

        let mut message = Self {
            topic: path.topic()?,
            channel: path.channel,
            client_id: optional(path.client_id)?,
            id: None,
            values: Vec::new(),
        };

        if message.topic.is_request() {
            let value = match payload.split_once(',') {
                Some((id, value)) => {
                    message.id = optional(Some(id))?;
                    value
                }
                None => payload,
            };
            message.push_values(None, &mut core::iter::empty::<&str>(), value)?;
        } else {
            match payload.split_once('=') {
                Some((head, value)) => {
                    let mut head = head.split(',');
                    let data_type = head.next().filter(|t| !t.is_empty());
                    message.push_values(data_type, &mut head, value)?;
                }
                None => message.push_values(None, &mut core::iter::empty::<&str>(), payload)?,
            }
        }

        Ok(message)
    }

    fn push_values<'a>(
        &mut self,
        data_type: Option<&str>,
        units: &mut dyn Iterator<Item = &'a str>,
        values: &str,
    ) -> Result<(), Error> {
        for value in Parts::new(values) {
            let unit = units.next().filter(|u| !u.is_empty());
            let entry = ValueEntry {
                data_type: optional(data_type)?,
                value: String::try_from(value).map_err(|_| Error::BufferOverflow)?,
                unit: optional(unit)?,
            };
            self.values.push(entry).map_err(|_| Error::BufferOverflow)?;
        }
        Ok(())
    }

    /// The request id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The client id, if any.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Number of value entries.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// The entry at `index`.
    pub fn entry(&self, index: usize) -> Option<&ValueEntry> {
        self.values.get(index)
    }

    /// All entries in order.
    pub fn entries(&self) -> &[ValueEntry] {
        &self.values
    }

    /// The value at `index`.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.entry(index).map(|e| e.value.as_str())
    }

    /// The unit at `index`.
    pub fn unit(&self, index: usize) -> Option<&str> {
        self.entry(index).and_then(|e| e.unit.as_deref())
    }

    /// The data type tag at `index`.
    pub fn data_type(&self, index: usize) -> Option<&str> {
        self.entry(index).and_then(|e| e.data_type.as_deref())
    }

    /// Serialize to JSON into `buf`, returning the number of bytes written.
    /// Absent fields are omitted.
    pub fn to_json(&self, buf: &mut [u8]) -> Result<usize, Error> {
        serde_json_core::to_slice(self, buf).map_err(|_| Error::BufferOverflow)
    }
}

/// One status line: `topic=Command channel=3 value=1 id=42`.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.topic {
            Topic::Command => f.write_str("topic=Command")?,
            Topic::Config => f.write_str("topic=Config")?,
            topic => write!(f, "topic={topic}")?,
        }
        if self.channel != Channel::None {
            write!(f, " channel={}", self.channel)?;
        }
        if let Some(client_id) = self.client_id() {
            write!(f, " clientID={client_id}")?;
        }
        if let Some(data_type) = self.data_type(0) {
            write!(f, " type={data_type}")?;
        }
        for entry in &self.values {
            write!(f, " value={}", entry.value)?;
            if let Some(unit) = &entry.unit {
                write!(f, " unit={unit}")?;
            }
        }
        if let Some(id) = self.id() {
            write!(f, " id={id}")?;
        }
        Ok(())
    }
}

fn optional<const N: usize>(s: Option<&str>) -> Result<Option<String<N>>, Error> {
    match s {
        Some(s) if !s.is_empty() => String::try_from(s)
            .map(Some)
            .map_err(|_| Error::BufferOverflow),
        _ => Ok(None),
    }
}
