//! The Command-topic protocol.
//!
//! Every command from the cloud is answered with exactly one response
//! carrying its request id. When the device accepted the command it also
//! reports the new state on the same channel so the dashboard reflects it.

use core::fmt;

use heapless::String;
use log::warn;

use super::dispatch::MessageHandler;
use super::publisher::Publisher;
use crate::network::application::cayenne::{DataPoint, Message, Topic};
use crate::network::error::Error;

/// Maximum length of a command error message.
pub const MAX_ERROR_LEN: usize = 64;

/// Why the device could not apply a command. The message is shown in the
/// dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String<MAX_ERROR_LEN>,
}

impl CommandError {
    /// An error with `message`, truncated to [`MAX_ERROR_LEN`] bytes.
    pub fn new(message: &str) -> Self {
        let mut end = message.len().min(MAX_ERROR_LEN);
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        let mut truncated = String::new();
        // Cannot fail: `end` is within capacity.
        let _ = truncated.push_str(&message[..end]);
        Self { message: truncated }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Device-specific command logic.
pub trait CommandCallback {
    /// Apply `message` to the device.
    fn on_command(&mut self, message: &Message) -> Result<(), CommandError>;
}

impl<F> CommandCallback for F
where
    F: FnMut(&Message) -> Result<(), CommandError>,
{
    fn on_command(&mut self, message: &Message) -> Result<(), CommandError> {
        self(message)
    }
}

/// Handler implementing the command/response/state-echo protocol around a
/// user callback.
///
/// ```rust
/// use iotagent::agent::{CommandError, CommandHandler, MessageHandler, Publisher};
/// use iotagent::network::application::cayenne::{Channel, Message, Topic};
/// use iotagent::Error;
///
/// #[derive(Default)]
/// struct Outbox(Vec<String>);
/// impl Publisher for Outbox {
///     fn publish_raw(&mut self, _: Option<&str>, topic: &Topic, channel: Channel, payload: &str) -> Result<(), Error> {
///         self.0.push(format!("{topic}/{channel} {payload}"));
///         Ok(())
///     }
/// }
///
/// let mut handler = CommandHandler::new(|_: &Message| -> Result<(), CommandError> { Ok(()) });
/// let mut outbox = Outbox::default();
/// let message = Message::decode("cmd/3", b"42,1").unwrap();
/// handler.handle(&message, &mut outbox).unwrap();
/// assert_eq!(outbox.0, ["response/none ok,42", "data/3 1"]);
/// ```
#[derive(Debug)]
pub struct CommandHandler<C> {
    callback: C,
}

impl<C: CommandCallback> CommandHandler<C> {
    /// Wrap `callback`.
    pub fn new(callback: C) -> Self {
        Self { callback }
    }

    /// The wrapped callback.
    pub fn callback(&self) -> &C {
        &self.callback
    }

    /// The wrapped callback, mutably.
    pub fn callback_mut(&mut self) -> &mut C {
        &mut self.callback
    }
}

impl<C: CommandCallback> MessageHandler for CommandHandler<C> {
    fn handle(&mut self, message: &Message, publisher: &mut dyn Publisher) -> Result<(), Error> {
        let outcome = self.callback.on_command(message);
        let error = outcome.as_ref().err().map(CommandError::message);
        if let Some(reason) = error {
            warn!(
                "Command {} on channel {} rejected: {}",
                message.id().unwrap_or_default(),
                message.channel,
                reason
            );
        }

        let response = publisher.publish_response(message.id(), error, message.client_id());
        if let Err(e) = response {
            warn!("Response failure, error: {}", e.code());
        }

        let echo = match (outcome.is_ok(), message.value(0)) {
            (true, Some(value)) => {
                let state = DataPoint::on(message.channel, value);
                publisher.publish_data_for(message.client_id(), &Topic::Data, &state)
            }
            _ => Ok(()),
        };
        if let Err(e) = echo {
            warn!("Publish state failure, error: {}", e.code());
        }

        response.and(echo)
    }
}
