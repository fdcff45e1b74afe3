//! Routing of inbound messages to handlers.

use heapless::Vec;
use log::debug;

use super::publisher::Publisher;
use crate::network::application::cayenne::{Message, Topic};
use crate::network::error::Error;

/// Default capacity of a [`Dispatcher`].
pub const MAX_HANDLERS: usize = 8;

/// A handler for inbound messages.
///
/// Closures taking `(&Message, &mut dyn Publisher)` implement this.
pub trait MessageHandler {
    /// Handle one message. Anything published goes through `publisher`.
    fn handle(&mut self, message: &Message, publisher: &mut dyn Publisher) -> Result<(), Error>;
}

impl<F> MessageHandler for F
where
    F: FnMut(&Message, &mut dyn Publisher) -> Result<(), Error>,
{
    fn handle(&mut self, message: &Message, publisher: &mut dyn Publisher) -> Result<(), Error> {
        self(message, publisher)
    }
}

/// Which handler a message went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The handler registered for the message's topic.
    Topic,
    /// The default handler.
    Default,
    /// No handler was interested.
    Dropped,
}

/// A table of handlers keyed by topic, plus an optional default.
///
/// Handlers are registered up front. Once the table is handed to the
/// [`Agent`](super::scheduler::Agent) it can no longer be changed.
///
/// ```rust
/// use iotagent::agent::{Dispatched, Dispatcher, Publisher};
/// use iotagent::network::application::cayenne::{Channel, Message, Topic};
/// use iotagent::Error;
///
/// struct Sink;
/// impl Publisher for Sink {
///     fn publish_raw(&mut self, _: Option<&str>, _: &Topic, _: Channel, _: &str) -> Result<(), Error> {
///         Ok(())
///     }
/// }
///
/// let mut seen = 0;
/// let mut on_config = |_: &Message, _: &mut dyn Publisher| -> Result<(), Error> {
///     seen += 1;
///     Ok(())
/// };
///
/// let mut dispatcher: Dispatcher = Dispatcher::new();
/// dispatcher.register_handler(Topic::Config, &mut on_config).unwrap();
///
/// let message = Message::decode("conf/2", b"7,on").unwrap();
/// assert_eq!(dispatcher.dispatch(&message, &mut Sink), Ok(Dispatched::Topic));
///
/// let message = Message::decode("data/2", b"1").unwrap();
/// assert_eq!(dispatcher.dispatch(&message, &mut Sink), Ok(Dispatched::Dropped));
/// drop(dispatcher);
/// assert_eq!(seen, 1);
/// ```
pub struct Dispatcher<'h, const N: usize = MAX_HANDLERS> {
    handlers: Vec<(Topic, &'h mut dyn MessageHandler), N>,
    default: Option<&'h mut dyn MessageHandler>,
}

impl<'h, const N: usize> Dispatcher<'h, N> {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            default: None,
        }
    }

    /// Register `handler` for `topic`, replacing any earlier registration.
    pub fn register_handler(
        &mut self,
        topic: Topic,
        handler: &'h mut dyn MessageHandler,
    ) -> Result<(), Error> {
        if let Some(slot) = self.handlers.iter_mut().find(|(t, _)| *t == topic) {
            slot.1 = handler;
            return Ok(());
        }
        self.handlers
            .push((topic, handler))
            .map_err(|_| Error::BufferOverflow)
    }

    /// Register the handler for messages no topic handler claims.
    pub fn register_default_handler(&mut self, handler: &'h mut dyn MessageHandler) {
        self.default = Some(handler);
    }

    /// Whether a handler is registered for `topic`.
    pub fn has_handler(&self, topic: &Topic) -> bool {
        self.handlers.iter().any(|(t, _)| t == topic)
    }

    /// Number of topic handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether neither topic handlers nor a default are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.default.is_none()
    }

    /// Run exactly one handler for `message`, or none if nobody is interested.
    ///
    /// The handler's error, if any, is returned as is.
    pub fn dispatch(
        &mut self,
        message: &Message,
        publisher: &mut dyn Publisher,
    ) -> Result<Dispatched, Error> {
        if let Some((_, handler)) = self.handlers.iter_mut().find(|(t, _)| *t == message.topic) {
            handler.handle(message, publisher)?;
            return Ok(Dispatched::Topic);
        }
        match self.default.as_mut() {
            Some(handler) => {
                handler.handle(message, publisher)?;
                Ok(Dispatched::Default)
            }
            None => {
                debug!("No handler for topic {}", message.topic);
                Ok(Dispatched::Dropped)
            }
        }
    }
}

impl<const N: usize> core::fmt::Debug for Dispatcher<'_, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        for (topic, _) in &self.handlers {
            list.entry(topic);
        }
        if self.default.is_some() {
            list.entry(&"*");
        }
        list.finish()
    }
}

impl<const N: usize> Default for Dispatcher<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
