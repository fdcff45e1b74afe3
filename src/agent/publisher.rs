//! Outbound publishing as seen by message handlers.

use crate::network::application::cayenne::{Channel, DataPoint, Topic, encode_response};
use crate::network::error::Error;

/// Something that can publish Cayenne messages.
///
/// The session implements this and lends itself to handlers for the duration
/// of one dispatch. Only [`publish_raw`](Publisher::publish_raw) is required.
pub trait Publisher {
    /// Publish an already encoded `payload`.
    ///
    /// `client_id` overrides the session's own client id in the topic path,
    /// which is how a gateway answers for the device a message was sent to.
    fn publish_raw(
        &mut self,
        client_id: Option<&str>,
        topic: &Topic,
        channel: Channel,
        payload: &str,
    ) -> Result<(), Error>;

    /// Publish one data point on `topic`.
    fn publish_data(&mut self, topic: &Topic, point: &DataPoint<'_>) -> Result<(), Error> {
        self.publish_data_for(None, topic, point)
    }

    /// Publish one data point on `topic` on behalf of `client_id`.
    fn publish_data_for(
        &mut self,
        client_id: Option<&str>,
        topic: &Topic,
        point: &DataPoint<'_>,
    ) -> Result<(), Error> {
        let payload = point.payload()?;
        self.publish_raw(client_id, topic, point.channel, &payload)
    }

    /// Acknowledge the request `id`, with an error message if it failed.
    fn publish_response(
        &mut self,
        id: Option<&str>,
        error: Option<&str>,
        client_id: Option<&str>,
    ) -> Result<(), Error> {
        let payload = encode_response(id, error)?;
        self.publish_raw(client_id, &Topic::Response, Channel::None, &payload)
    }
}
