//! System utilities for embedded devices.
//!
//! This module provides the time primitives the agent is driven by. It
//! focuses on lightweight, `no_std` compatible building blocks that the
//! firmware wires to its own hardware.
//!
//! # Available Utilities
//!
//! - **[`time`]**: the [`Clock`](time::Clock) abstraction and the countdown
//!   [`Timer`](time::Timer) used to schedule telemetry
//!
//! # Usage
//!
//! ```rust
//! use iotagent::system::time::{Clock, Timer};
//!
//! struct TickCounter(u64);
//!
//! impl Clock for TickCounter {
//!     fn now_ms(&self) -> u64 { self.0 }
//!     fn delay_ms(&mut self, ms: u32) { self.0 += u64::from(ms); }
//! }
//!
//! let mut clock = TickCounter(0);
//! let mut timer = Timer::new(5000, clock.now_ms());
//! clock.delay_ms(5000);
//! assert!(timer.fire(clock.now_ms()));
//! ```

/// Clock abstraction and countdown timer.
pub mod time;
