//! Millisecond clock and countdown timer.
//!
//! The agent never reads time directly. Everything that waits or measures
//! goes through a [`Clock`], so the same code runs against a hardware timer,
//! `std::time`, or a simulated clock in tests.

/// A monotonic millisecond clock that can also block the caller.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;
    /// Block the single thread of control for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// A [`Clock`] backed by `std::time::Instant` and `std::thread::sleep`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// A countdown timer: armed with a duration, polled for expiry, rearmed
/// after firing.
///
/// Rearming counts from the moment the expiry was observed, so a late poll
/// shifts later deadlines (phase drift) but the gap between two firings is
/// never shorter than the duration.
///
/// ```rust
/// use iotagent::system::time::Timer;
///
/// let mut timer = Timer::new(5000, 0);
/// assert!(!timer.fire(4999));
/// assert!(timer.fire(5000));
/// assert!(!timer.fire(5000));
/// assert_eq!(timer.deadline_ms(), 10000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    duration_ms: u32,
    deadline_ms: u64,
}

impl Timer {
    /// Arm a timer for `duration_ms` starting at `now_ms`.
    pub fn new(duration_ms: u32, now_ms: u64) -> Self {
        Self {
            duration_ms,
            deadline_ms: now_ms.saturating_add(u64::from(duration_ms)),
        }
    }

    /// Whether the deadline has been reached.
    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// Rearm with the same duration, starting at `now_ms`.
    pub fn rearm(&mut self, now_ms: u64) {
        self.deadline_ms = now_ms.saturating_add(u64::from(self.duration_ms));
    }

    /// Check for expiry and rearm if expired. Returns `true` exactly once per
    /// elapsed period.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if self.expired(now_ms) {
            self.rearm(now_ms);
            true
        } else {
            false
        }
    }

    /// Milliseconds until expiry, zero once expired.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.deadline_ms.saturating_sub(now_ms)
    }

    /// The configured duration.
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// The current deadline.
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }
}
