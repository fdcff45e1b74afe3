//! Cayenne payload encoding.
//!
//! Data payloads have the form `type,unit=value`, `type=value` or a bare
//! `value`. Responses are `ok,{id}` or `error,{id}={message}`.

use core::fmt::{self, Write as _};

use heapless::String;

use super::topic::Channel;
use crate::network::error::Error;

/// Maximum size of an outbound payload.
pub const MAX_OUTBOUND_PAYLOAD_LEN: usize = 256;

/// An outbound payload.
pub type Payload = String<MAX_OUTBOUND_PAYLOAD_LEN>;

/// A value the device can publish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// An integer reading.
    Int(i64),
    /// A floating point reading.
    Float(f64),
    /// A reading already rendered as text.
    Str(&'a str),
    /// A GPS fix, encoded `[latitude,longitude,altitude]`.
    Gps {
        /// Decimal degrees, north positive.
        latitude: f64,
        /// Decimal degrees, east positive.
        longitude: f64,
        /// Meters.
        altitude: f64,
    },
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Gps {
                latitude,
                longitude,
                altitude,
            } => write!(f, "[{latitude},{longitude},{altitude}]"),
        }
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value<'_> {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Str(v)
    }
}

/// One reading addressed to a channel.
///
/// ```rust
/// use iotagent::network::application::cayenne::{types, DataPoint};
///
/// let point = DataPoint::new(0, 30.5)
///     .with_type(types::TEMPERATURE)
///     .with_unit(types::CELSIUS);
/// assert_eq!(point.payload().unwrap().as_str(), "temp,c=30.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint<'a> {
    /// Target channel.
    pub channel: Channel,
    /// Optional data type tag, e.g. `temp`.
    pub data_type: Option<&'a str>,
    /// Optional unit, e.g. `c`. Only written when a type is present.
    pub unit: Option<&'a str>,
    /// The reading.
    pub value: Value<'a>,
}

impl<'a> DataPoint<'a> {
    /// A bare reading on a numbered channel.
    pub fn new(channel: u32, value: impl Into<Value<'a>>) -> Self {
        Self::on(Channel::Number(channel), value)
    }

    /// A bare reading addressed with any [`Channel`], including
    /// [`Channel::None`] for device-level topics.
    pub fn on(channel: Channel, value: impl Into<Value<'a>>) -> Self {
        Self {
            channel,
            data_type: None,
            unit: None,
            value: value.into(),
        }
    }

    /// Set the data type tag.
    pub fn with_type(mut self, data_type: &'a str) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: &'a str) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Encode this point's payload.
    pub fn payload(&self) -> Result<Payload, Error> {
        encode_data(self.data_type, self.unit, &self.value)
    }
}

/// Encode a data payload.
pub fn encode_data(
    data_type: Option<&str>,
    unit: Option<&str>,
    value: &Value<'_>,
) -> Result<Payload, Error> {
    let mut payload = Payload::new();
    let result = match (data_type, unit) {
        (Some(data_type), Some(unit)) => write!(payload, "{data_type},{unit}={value}"),
        (Some(data_type), None) => write!(payload, "{data_type}={value}"),
        (None, _) => write!(payload, "{value}"),
    };
    result.map_err(|_| Error::BufferOverflow)?;
    Ok(payload)
}

/// Encode a command response payload.
///
/// `error` is `None` for success, otherwise the message reported to the cloud.
pub fn encode_response(id: Option<&str>, error: Option<&str>) -> Result<Payload, Error> {
    let mut payload = Payload::new();
    let id = id.unwrap_or_default();
    let result = match error {
        None => write!(payload, "ok,{id}"),
        Some(message) => write!(payload, "error,{id}={message}"),
    };
    result.map_err(|_| Error::BufferOverflow)?;
    Ok(payload)
}

/// Iterator over the comma-separated parts of a value string, keeping
/// bracketed groups such as `[1,2,3]` in one part.
#[derive(Debug, Clone)]
pub struct Parts<'a> {
    rest: Option<&'a str>,
}

impl<'a> Parts<'a> {
    /// Split `value`. An empty string yields no parts.
    pub fn new(value: &'a str) -> Self {
        Self {
            rest: if value.is_empty() { None } else { Some(value) },
        }
    }
}

impl<'a> Iterator for Parts<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        let mut depth = 0usize;
        for (i, b) in rest.bytes().enumerate() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    self.rest = Some(&rest[i + 1..]);
                    return Some(&rest[..i]);
                }
                _ => {}
            }
        }
        self.rest = None;
        Some(rest)
    }
}
