//! # iotagent - Cayenne MQTT device agent
//!
//! A device-side telemetry agent for the myDevices Cayenne IoT cloud. It keeps
//! one MQTT session with the broker alive across network failures, reports
//! sensor data on a schedule, and answers commands sent from the dashboard.
//! The library is designed for embedded systems and supports `no_std`
//! environments.
//!
//! ## Features
//!
//! ### Agent
//! - **Session**: connection state machine over a link and an MQTT client,
//!   with indefinite link retries, keep-alive and full teardown on failure
//! - **Dispatcher**: topic-keyed handler table with a default handler
//! - **Command handler**: every command is acknowledged exactly once and the
//!   accepted state is echoed back to the dashboard
//! - **Scheduler**: one cooperative loop for inbound processing, liveness and
//!   periodic telemetry
//!
//! ### Network
//! - **Cayenne model**: topic paths, inbound message decoding, outbound
//!   payload encoding
//! - **MQTT client**: a small MQTT 3.1.1 client over any link
//! - **TCP link**: `std::net` link for hosted targets
//!
//! ### System Utilities
//! - Millisecond clock abstraction and countdown timer
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! iotagent = "0.1.0"
//! ```
//!
//! ### Wiring an agent
//!
//! ```rust,no_run
//! use iotagent::agent::{Agent, CommandError, CommandHandler, Dispatcher, FixedTelemetry, Session};
//! use iotagent::config::{AgentConfig, Credentials};
//! use iotagent::network::application::cayenne::{types, DataPoint, Message, Topic};
//! use iotagent::network::client::{MqttClient, Options};
//! # use iotagent::system::time::Clock;
//! # struct Board;
//! # impl Clock for Board {
//! #     fn now_ms(&self) -> u64 { 0 }
//! #     fn delay_ms(&mut self, _ms: u32) {}
//! # }
//! # struct Eth;
//! # impl iotagent::network::Read for Eth {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl iotagent::network::Write for Eth {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl iotagent::network::Link for Eth {
//! #     fn init(&mut self, _: &[u8; 6]) -> Result<(), iotagent::Error> { Ok(()) }
//! #     fn connect(&mut self, _: &str, _: u16) -> Result<(), iotagent::Error> { Ok(()) }
//! #     fn disconnect(&mut self) {}
//! #     fn is_connected(&self) -> bool { true }
//! # }
//!
//! let credentials = Credentials::new("MQTT_USERNAME", "MQTT_PASSWORD", "CLIENT_ID")?;
//! let config = AgentConfig::new(credentials);
//! let session = Session::new(Eth, MqttClient::new(Options::default()), Board, config);
//!
//! let mut commands = CommandHandler::new(|_message: &Message| -> Result<(), CommandError> {
//!     // Drive the actuator on `_message.channel` to `_message.value(0)`.
//!     Ok(())
//! });
//! let mut dispatcher: Dispatcher = Dispatcher::new();
//! dispatcher.register_handler(Topic::Command, &mut commands)?;
//!
//! let telemetry = FixedTelemetry::new(&[
//!     DataPoint::new(0, 30.5).with_type(types::TEMPERATURE).with_unit(types::CELSIUS),
//! ])?;
//!
//! let mut agent = Agent::new(session, dispatcher, telemetry);
//! agent.start()?;
//! agent.run();
//! # Ok::<(), iotagent::Error>(())
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Feature Flags
//!
//! - `std`: Enable standard library support: TCP link, system clock and
//!   environment configuration (default: disabled)
//! - `defmt`: Enable defmt formatting support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Network abstraction layer: link and protocol client traits, the reference
/// MQTT client and the Cayenne message model.
pub mod network;

/// System utilities for embedded devices.
///
/// Contains the clock abstraction and the countdown timer driving the
/// telemetry schedule.
pub mod system;

/// Agent configuration: credentials, broker address, device descriptors and
/// timing.
pub mod config;

/// The agent: session, dispatcher, command protocol and control loop.
pub mod agent;

pub use network::error::Error;
