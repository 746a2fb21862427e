//! World clock and tick counting.
//!
//! The tick number is the single source of truth for time. Every timeout in
//! the simulation (cooldowns, growth, respawns, trade windows) is expressed
//! as a tick count compared against [`WorldClock::tick`].

use serde::{Deserialize, Serialize};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldClock {
    /// Current tick number. Zero before the first tick runs.
    tick: u64,
}

impl WorldClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// A clock resumed at `tick` (used when restoring a snapshot).
    pub const fn from_tick(tick: u64) -> Self {
        Self { tick }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Ticks elapsed since `earlier`, zero if `earlier` is in the future.
    pub const fn ticks_since(&self, earlier: u64) -> u64 {
        self.tick.saturating_sub(earlier)
    }

    /// Whether the current tick falls on a multiple of `interval`.
    ///
    /// An interval of zero never fires.
    pub const fn is_interval(&self, interval: u64) -> bool {
        match self.tick.checked_rem(interval) {
            Some(r) => r == 0,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_increments() {
        let mut clock = WorldClock::new();
        assert_eq!(clock.advance().ok(), Some(1));
        assert_eq!(clock.advance().ok(), Some(2));
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn advance_overflow() {
        let mut clock = WorldClock::from_tick(u64::MAX);
        assert!(clock.advance().is_err());
        assert_eq!(clock.tick(), u64::MAX);
    }

    #[test]
    fn interval_fires_on_multiples_only() {
        assert!(WorldClock::from_tick(40).is_interval(20));
        assert!(!WorldClock::from_tick(41).is_interval(20));
        assert!(!WorldClock::from_tick(40).is_interval(0));
    }

    #[test]
    fn ticks_since_saturates() {
        let clock = WorldClock::from_tick(10);
        assert_eq!(clock.ticks_since(4), 6);
        assert_eq!(clock.ticks_since(12), 0);
    }
}
