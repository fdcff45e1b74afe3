//! The connection state machine.
//!
//! A [`Session`] owns the link, the protocol client and the clock. It brings
//! both layers up (retrying the link indefinitely), subscribes to the
//! command topics, keeps the broker session alive, and tears everything down
//! again when either layer drops.

use log::{debug, info, warn};

use super::dispatch::{Dispatched, Dispatcher};
use super::publisher::Publisher;
use crate::config::AgentConfig;
use crate::network::application::cayenne::{Channel, Message, Topic, topic_path};
use crate::network::error::Error;
use crate::network::{Link, ProtocolClient, PublishPacket};
use crate::system::time::Clock;

/// Longest sleep between two polls while waiting for inbound messages.
pub const POLL_SLICE_MS: u32 = 10;

/// Where the session is in bringing its two layers up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is connected.
    Disconnected,
    /// Opening the link.
    TransportConnecting,
    /// The link is up, the protocol is not.
    TransportConnected,
    /// Performing the protocol handshake.
    ProtocolConnecting,
    /// Both layers are up; publishing is allowed.
    Established,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SessionState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SessionState::Disconnected => defmt::write!(f, "Disconnected"),
            SessionState::TransportConnecting => defmt::write!(f, "TransportConnecting"),
            SessionState::TransportConnected => defmt::write!(f, "TransportConnected"),
            SessionState::ProtocolConnecting => defmt::write!(f, "ProtocolConnecting"),
            SessionState::Established => defmt::write!(f, "Established"),
        }
    }
}

/// One logical session with the Cayenne broker.
pub struct Session<L, P, K> {
    link: L,
    client: P,
    clock: K,
    config: AgentConfig,
    state: SessionState,
    last_activity_ms: u64,
}

impl<L, P, K> Session<L, P, K>
where
    L: Link,
    P: ProtocolClient<L>,
    K: Clock,
{
    /// Create a disconnected session.
    pub fn new(link: L, client: P, clock: K, config: AgentConfig) -> Self {
        Self {
            link,
            client,
            clock,
            config,
            state: SessionState::Disconnected,
            last_activity_ms: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The link driver.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The protocol client.
    pub fn client(&self) -> &P {
        &self.client
    }

    /// The clock.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Both layers report connected.
    pub fn is_alive(&self) -> bool {
        self.link.is_connected() && self.client.is_connected()
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Hand the device identity to the link driver. Call once, before the
    /// first [`connect`](Self::connect).
    pub fn initialize(&mut self) -> Result<(), Error> {
        info!("Initializing interface");
        self.link.init(&self.config.identity)
    }

    /// Bring the session up.
    ///
    /// Opening the link is retried until it succeeds. A failed protocol
    /// handshake closes the link again and is returned. Once established the
    /// session subscribes to commands and configuration for all channels and
    /// publishes the device descriptors; failures there are only logged.
    pub fn connect(&mut self) -> Result<(), Error> {
        info!(
            "Connecting to {}:{}",
            self.config.server.host, self.config.server.port
        );
        self.transition(SessionState::TransportConnecting);
        let mut attempt = 0;
        while let Err(e) = self
            .link
            .connect(&self.config.server.host, self.config.server.port)
        {
            warn!("TCP connect failed, error: {}", e.code());
            self.clock.delay_ms(self.config.backoff.delay_for(attempt));
            attempt = attempt.saturating_add(1);
        }
        self.transition(SessionState::TransportConnected);

        self.transition(SessionState::ProtocolConnecting);
        let connected = self.client.connect(
            &mut self.link,
            &self.config.credentials,
            self.config.keep_alive_seconds,
        );
        if let Err(e) = connected {
            warn!("MQTT connect failed, error: {}", e.code());
            self.link.disconnect();
            self.transition(SessionState::Disconnected);
            return Err(e);
        }
        self.last_activity_ms = self.clock.now_ms();
        info!("Connected");

        if let Err(e) = self.subscribe_all(&Topic::Command) {
            warn!("Subscription to Command topic failed, error: {}", e.code());
        }
        if let Err(e) = self.subscribe_all(&Topic::Config) {
            warn!("Subscription to Config topic failed, error: {}", e.code());
        }
        self.transition(SessionState::Established);

        self.publish_device_info();
        Ok(())
    }

    fn subscribe_all(&mut self, topic: &Topic) -> Result<(), Error> {
        let credentials = &self.config.credentials;
        let path = topic_path(
            &credentials.username,
            &credentials.client_id,
            topic,
            Channel::All,
        )?;
        self.client.subscribe(&mut self.link, &path)
    }

    fn publish_device_info(&mut self) {
        let device = self.config.device.clone();
        let descriptors = [
            (Topic::SysVersion, Some(device.version.as_str())),
            (Topic::SysModel, Some(device.model.as_str())),
            (Topic::SysCpuModel, device.cpu_model.as_deref()),
            (Topic::SysCpuSpeed, device.cpu_speed.as_deref()),
        ];
        for (topic, value) in descriptors {
            let Some(value) = value else { continue };
            if let Err(e) = self.publish_raw(None, &topic, Channel::None, value) {
                warn!("Publish {} failed, error: {}", topic, e.code());
            }
        }
    }

    /// Tear both layers down and connect again, waiting the backoff delay
    /// between failed attempts. Returns only once the session is established.
    pub fn reconnect(&mut self) {
        self.teardown();
        info!("Reconnecting");
        let mut attempt = 0;
        while self.connect().is_err() {
            self.clock.delay_ms(self.config.backoff.delay_for(attempt));
            attempt = attempt.saturating_add(1);
            info!("Reconnect failed, retrying");
        }
    }

    fn teardown(&mut self) {
        self.client.disconnect(&mut self.link);
        self.link.disconnect();
        self.transition(SessionState::Disconnected);
    }

    /// Orderly teardown: protocol first, then the link.
    pub fn shutdown(&mut self) {
        info!("Shutting down");
        if self.client.is_connected() {
            self.client.disconnect(&mut self.link);
        }
        if self.link.is_connected() {
            self.link.disconnect();
        }
        self.transition(SessionState::Disconnected);
    }

    /// Process inbound messages for up to `budget_ms`.
    ///
    /// Each message is decoded and dispatched before the next one is read,
    /// with the session itself as the handlers' [`Publisher`]. Returns the
    /// number of messages received. Errors that leave both layers up are
    /// logged and skipped; returns early with the error if either layer drops.
    pub fn yield_for<const N: usize>(
        &mut self,
        budget_ms: u32,
        dispatcher: &mut Dispatcher<'_, N>,
    ) -> Result<usize, Error> {
        if self.state != SessionState::Established || !self.is_alive() {
            return Err(Error::NotConnected);
        }

        let deadline = self.clock.now_ms().saturating_add(u64::from(budget_ms));
        let mut received = 0;
        loop {
            if let Err(e) = self.keep_alive() {
                warn!("Keep-alive failed, error: {}", e.code());
                if !self.is_alive() {
                    return Err(e);
                }
            }
            let packet = match self.client.poll(&mut self.link) {
                Ok(packet) => packet,
                Err(e) if self.is_alive() => {
                    warn!("Skipping inbound packet, error: {}", e.code());
                    None
                }
                Err(e) => return Err(e),
            };
            let idle = packet.is_none();
            if let Some(packet) = packet {
                self.deliver(&packet, dispatcher);
                received += 1;
            }

            let now = self.clock.now_ms();
            if now >= deadline || !self.is_alive() {
                break;
            }
            if idle {
                let slice = (deadline - now).min(u64::from(POLL_SLICE_MS));
                self.clock.delay_ms(slice as u32);
            }
        }
        Ok(received)
    }

    fn keep_alive(&mut self) -> Result<(), Error> {
        let interval_ms = u64::from(self.config.keep_alive_seconds) * 1000;
        if interval_ms == 0 {
            return Ok(());
        }
        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_activity_ms) >= interval_ms {
            debug!("Sending keep-alive");
            self.client.ping(&mut self.link)?;
            self.last_activity_ms = now;
        }
        Ok(())
    }

    fn deliver<const N: usize>(&mut self, packet: &PublishPacket, dispatcher: &mut Dispatcher<'_, N>) {
        let message = match Message::decode(&packet.topic, &packet.payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping message on {}, error: {}", packet.topic, e.code());
                return;
            }
        };
        info!("{}", message);

        match dispatcher.dispatch(&message, self) {
            Ok(Dispatched::Dropped) => debug!("Message on {} dropped", message.topic),
            Ok(_) => {}
            Err(e) => warn!("Handler for {} failed, error: {}", message.topic, e.code()),
        }
    }
}

impl<L, P, K> core::fmt::Debug for Session<L, P, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("server", &self.config.server)
            .field("last_activity_ms", &self.last_activity_ms)
            .finish_non_exhaustive()
    }
}

impl<L, P, K> Publisher for Session<L, P, K>
where
    L: Link,
    P: ProtocolClient<L>,
    K: Clock,
{
    /// Refused with [`Error::NotConnected`] unless the session is established.
    ///
    /// Refused with [`Error::InvalidAddress`] for [`Channel::All`], which is a
    /// subscription wildcard, and for [`Channel::None`] on a topic that is not
    /// device-level.
    fn publish_raw(
        &mut self,
        client_id: Option<&str>,
        topic: &Topic,
        channel: Channel,
        payload: &str,
    ) -> Result<(), Error> {
        if self.state != SessionState::Established {
            return Err(Error::NotConnected);
        }
        match channel {
            Channel::All => return Err(Error::InvalidAddress),
            Channel::None if !topic.is_device_level() => return Err(Error::InvalidAddress),
            _ => {}
        }
        let credentials = &self.config.credentials;
        let client_id = client_id.unwrap_or(credentials.client_id.as_str());
        let path = topic_path(&credentials.username, client_id, topic, channel)?;
        self.client
            .publish(&mut self.link, &path, payload.as_bytes())?;
        self.last_activity_ms = self.clock.now_ms();
        Ok(())
    }
}
