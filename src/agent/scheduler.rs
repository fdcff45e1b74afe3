//! The agent's control loop.

use heapless::Vec;
use log::{debug, info, warn};

use super::dispatch::{Dispatcher, MAX_HANDLERS};
use super::publisher::Publisher;
use super::session::Session;
use crate::network::application::cayenne::{DataPoint, Topic};
use crate::network::error::Error;
use crate::network::{Link, ProtocolClient};
use crate::system::time::{Clock, Timer};

/// Maximum number of points published per telemetry period.
pub const MAX_TELEMETRY_POINTS: usize = 8;

/// One telemetry sample.
pub type Telemetry<'a> = Vec<DataPoint<'a>, MAX_TELEMETRY_POINTS>;

/// Source of the readings published every period.
pub trait TelemetrySource {
    /// Read the current values.
    fn sample(&mut self) -> Telemetry<'_>;
}

/// A telemetry source that always reports the same points.
#[derive(Debug, Clone)]
pub struct FixedTelemetry<'a> {
    points: Telemetry<'a>,
}

impl<'a> FixedTelemetry<'a> {
    /// Report `points` every period.
    pub fn new(points: &[DataPoint<'a>]) -> Result<Self, Error> {
        Ok(Self {
            points: Vec::from_slice(points).map_err(|_| Error::BufferOverflow)?,
        })
    }
}

impl TelemetrySource for FixedTelemetry<'_> {
    fn sample(&mut self) -> Telemetry<'_> {
        self.points.clone()
    }
}

/// What one loop cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Inbound messages processed.
    pub dispatched: usize,
    /// Whether the session had to be re-established.
    pub reconnected: bool,
    /// Telemetry points successfully published.
    pub published: usize,
}

/// The device agent: a session, the handler table and the telemetry source,
/// driven by one cooperative loop.
///
/// Each cycle processes inbound messages for the configured budget, then
/// re-establishes the session if either layer dropped, then publishes
/// telemetry if the period elapsed.
pub struct Agent<'h, L, P, K, T, const N: usize = MAX_HANDLERS> {
    session: Session<L, P, K>,
    dispatcher: Dispatcher<'h, N>,
    telemetry: T,
    timer: Timer,
}

impl<'h, L, P, K, T, const N: usize> Agent<'h, L, P, K, T, N>
where
    L: Link,
    P: ProtocolClient<L>,
    K: Clock,
    T: TelemetrySource,
{
    /// Assemble an agent. The handler table is fixed from here on.
    pub fn new(session: Session<L, P, K>, dispatcher: Dispatcher<'h, N>, telemetry: T) -> Self {
        let timer = Timer::new(
            session.config().publish_interval_ms,
            session.clock().now_ms(),
        );
        Self {
            session,
            dispatcher,
            telemetry,
            timer,
        }
    }

    /// Initialize the link and connect for the first time.
    ///
    /// A protocol-level failure here is returned and the loop should not be
    /// started.
    pub fn start(&mut self) -> Result<(), Error> {
        self.session.initialize()?;
        self.session.connect()?;
        self.timer.rearm(self.session.clock().now_ms());
        Ok(())
    }

    /// Run one cycle of the loop.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let budget = self.session.config().yield_budget_ms;
        match self.session.yield_for(budget, &mut self.dispatcher) {
            Ok(count) => report.dispatched = count,
            Err(e) => debug!("Yield ended, error: {}", e.code()),
        }

        if !self.session.is_alive() {
            self.session.reconnect();
            report.reconnected = true;
        }

        if self.timer.fire(self.session.clock().now_ms()) {
            report.published = self.publish_telemetry();
        }
        report
    }

    fn publish_telemetry(&mut self) -> usize {
        let mut published = 0;
        for point in self.telemetry.sample() {
            match self.session.publish_data(&Topic::Data, &point) {
                Ok(()) => published += 1,
                Err(e) => warn!(
                    "Publish {} failed, error: {}",
                    point.data_type.unwrap_or("data"),
                    e.code()
                ),
            }
        }
        published
    }

    /// Run the loop forever.
    pub fn run(&mut self) -> ! {
        info!("Running");
        loop {
            self.run_cycle();
        }
    }

    /// Tear the session down.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    /// The session.
    pub fn session(&self) -> &Session<L, P, K> {
        &self.session
    }

    /// The telemetry timer.
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// The telemetry source.
    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

impl<L, P, K, T, const N: usize> core::fmt::Debug for Agent<'_, L, P, K, T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Agent")
            .field("session", &self.session)
            .field("dispatcher", &self.dispatcher)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}
