//! Shared mocks for the agent integration tests.
//!
//! The link, the protocol client and the clock all record into one
//! [`World`] so tests can assert on the exact order of what happened across
//! the three collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use iotagent::Error;
use iotagent::agent::Session;
use iotagent::agent::session::POLL_SLICE_MS;
use iotagent::config::{AgentConfig, Credentials, MacAddress};
use iotagent::network::{Link, ProtocolClient, PublishPacket, Read, Write};
use iotagent::system::time::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    LinkInit(MacAddress),
    LinkConnect(String, u16),
    LinkConnectFailed,
    LinkDisconnect,
    ClientConnect(String),
    ClientConnectFailed(Error),
    ClientDisconnect,
    Subscribe(String),
    Publish(String, String),
    Ping,
    Delay(u32),
}

#[derive(Debug, Default)]
pub struct World {
    pub events: Vec<Event>,
    pub now_ms: u64,
    pub link_up: bool,
    /// Link connect attempts that fail before one succeeds.
    pub link_failures: u32,
    pub client_up: bool,
    /// Protocol connect outcomes consumed before connects succeed.
    pub client_failures: VecDeque<Error>,
    pub subscribe_error: Option<Error>,
    pub publish_error: Option<Error>,
    /// Keep-alive announced by the last protocol connect.
    pub keep_alive_seconds: Option<u16>,
    /// Returned once by the next poll; the client stays up.
    pub poll_error: Option<Error>,
    /// Unanswered ping: the next ping fails and drops the client.
    pub ping_lost: bool,
    pub inbound: VecDeque<(String, Vec<u8>)>,
}

pub type Shared = Rc<RefCell<World>>;

pub fn world() -> Shared {
    Rc::new(RefCell::new(World::default()))
}

pub struct MockLink(pub Shared);

impl Read for MockLink {
    type Error = Error;

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

impl Write for MockLink {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Link for MockLink {
    fn init(&mut self, identity: &MacAddress) -> Result<(), Error> {
        self.0.borrow_mut().events.push(Event::LinkInit(*identity));
        Ok(())
    }

    fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        let mut world = self.0.borrow_mut();
        if world.link_failures > 0 {
            world.link_failures -= 1;
            world.events.push(Event::LinkConnectFailed);
            return Err(Error::Timeout);
        }
        world.link_up = true;
        world.events.push(Event::LinkConnect(host.to_string(), port));
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut world = self.0.borrow_mut();
        world.link_up = false;
        world.events.push(Event::LinkDisconnect);
    }

    fn is_connected(&self) -> bool {
        self.0.borrow().link_up
    }
}

pub struct MockClient(pub Shared);

impl ProtocolClient<MockLink> for MockClient {
    fn connect(
        &mut self,
        _link: &mut MockLink,
        credentials: &Credentials,
        keep_alive_seconds: u16,
    ) -> Result<(), Error> {
        let mut world = self.0.borrow_mut();
        world.keep_alive_seconds = Some(keep_alive_seconds);
        if let Some(e) = world.client_failures.pop_front() {
            world.events.push(Event::ClientConnectFailed(e));
            return Err(e);
        }
        world.client_up = true;
        world
            .events
            .push(Event::ClientConnect(credentials.username.to_string()));
        Ok(())
    }

    fn disconnect(&mut self, _link: &mut MockLink) {
        let mut world = self.0.borrow_mut();
        world.client_up = false;
        world.events.push(Event::ClientDisconnect);
    }

    fn is_connected(&self) -> bool {
        self.0.borrow().client_up
    }

    fn publish(&mut self, _link: &mut MockLink, topic: &str, payload: &[u8]) -> Result<(), Error> {
        let mut world = self.0.borrow_mut();
        if !world.client_up {
            return Err(Error::NotConnected);
        }
        if let Some(e) = world.publish_error {
            return Err(e);
        }
        let payload = String::from_utf8_lossy(payload).into_owned();
        world.events.push(Event::Publish(topic.to_string(), payload));
        Ok(())
    }

    fn subscribe(&mut self, _link: &mut MockLink, topic: &str) -> Result<(), Error> {
        let mut world = self.0.borrow_mut();
        world.events.push(Event::Subscribe(topic.to_string()));
        match world.subscribe_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn poll(&mut self, _link: &mut MockLink) -> Result<Option<PublishPacket>, Error> {
        let mut world = self.0.borrow_mut();
        if let Some(e) = world.poll_error.take() {
            return Err(e);
        }
        match world.inbound.pop_front() {
            Some((topic, payload)) => PublishPacket::new(&topic, &payload).map(Some),
            None => Ok(None),
        }
    }

    fn ping(&mut self, _link: &mut MockLink) -> Result<(), Error> {
        let mut world = self.0.borrow_mut();
        if world.ping_lost {
            world.client_up = false;
            return Err(Error::Timeout);
        }
        world.events.push(Event::Ping);
        Ok(())
    }
}

pub struct MockClock(pub Shared);

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.0.borrow().now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut world = self.0.borrow_mut();
        world.now_ms += u64::from(ms);
        world.events.push(Event::Delay(ms));
    }
}

pub type MockSession = Session<MockLink, MockClient, MockClock>;

pub fn config() -> AgentConfig {
    let credentials = Credentials::new("user", "pass", "device").unwrap();
    AgentConfig::new(credentials)
}

pub fn session(world: &Shared) -> MockSession {
    session_with(world, config())
}

pub fn session_with(world: &Shared, config: AgentConfig) -> MockSession {
    Session::new(
        MockLink(world.clone()),
        MockClient(world.clone()),
        MockClock(world.clone()),
        config,
    )
}

/// Recorded events minus the short sleeps of the inbound poll loop.
pub fn events(world: &Shared) -> Vec<Event> {
    world
        .borrow()
        .events
        .iter()
        .filter(|e| !matches!(e, Event::Delay(ms) if *ms <= POLL_SLICE_MS))
        .cloned()
        .collect()
}

/// `(topic, payload)` of every publish so far.
pub fn publishes(world: &Shared) -> Vec<(String, String)> {
    world
        .borrow()
        .events
        .iter()
        .filter_map(|e| match e {
            Event::Publish(topic, payload) => Some((topic.clone(), payload.clone())),
            _ => None,
        })
        .collect()
}

pub fn clear(world: &Shared) {
    world.borrow_mut().events.clear();
}

pub fn push_inbound(world: &Shared, topic: &str, payload: &str) {
    world
        .borrow_mut()
        .inbound
        .push_back((topic.to_string(), payload.as_bytes().to_vec()));
}

pub fn publish(topic: &str, payload: &str) -> Event {
    Event::Publish(topic.to_string(), payload.to_string())
}

pub fn subscribe(topic: &str) -> Event {
    Event::Subscribe(topic.to_string())
}
