//! The device agent.
//!
//! Built bottom-up from:
//!
//! - [`publisher`]: the outbound API handlers publish through
//! - [`dispatch`]: the topic-keyed handler table
//! - [`command`]: the command/response/state-echo protocol
//! - [`session`]: the connection state machine
//! - [`scheduler`]: the [`Agent`] loop tying it together
//!
//! The [`Session`] owns the link and the protocol client; nothing else talks
//! to the broker. Handlers are registered on a [`Dispatcher`] before the
//! [`Agent`] takes ownership of it.

/// Command-topic protocol
pub mod command;
/// Topic-keyed message dispatch
pub mod dispatch;
/// Outbound publishing
pub mod publisher;
/// Control loop
pub mod scheduler;
/// Connection state machine
pub mod session;

pub use command::{CommandCallback, CommandError, CommandHandler};
pub use dispatch::{Dispatched, Dispatcher, MAX_HANDLERS, MessageHandler};
pub use publisher::Publisher;
pub use scheduler::{Agent, CycleReport, FixedTelemetry, Telemetry, TelemetrySource};
pub use session::{Session, SessionState};
