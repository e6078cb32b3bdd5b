//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  One tick is one
//! update cycle of the host simulation; its length in simulated time is
//! held by `SimClock`:
//!
//!   elapsed_secs = tick * tick_duration_ms / 1000
//!
//! Incident dwell times and caps are configured in seconds and compared
//! through the clock, so the same configuration works at any frame rate.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Maps ticks to simulated seconds.
///
/// `SimClock` is cheap to copy and holds no heap data.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated milliseconds one tick represents.
    pub tick_duration_ms: u32,
    /// The current tick, advanced by [`SimClock::advance`] each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_duration_ms: u32) -> Self {
        Self { tick_duration_ms, current_tick: Tick::ZERO }
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.current_tick
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Simulated seconds between two ticks (zero if `later < earlier`).
    #[inline]
    pub fn secs_between(&self, earlier: Tick, later: Tick) -> f32 {
        (later.since(earlier) as f64 * self.tick_duration_ms as f64 / 1000.0) as f32
    }

    /// Simulated seconds since `earlier`, measured at the current tick.
    #[inline]
    pub fn secs_since(&self, earlier: Tick) -> f32 {
        self.secs_between(earlier, self.current_tick)
    }

    /// Seconds represented by a single tick.
    #[inline]
    pub fn tick_secs(&self) -> f32 {
        self.tick_duration_ms as f32 / 1000.0
    }

    /// How many ticks span `secs` seconds? (rounds up, at least one)
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        if self.tick_duration_ms == 0 {
            return 1;
        }
        let ms = (secs.max(0.0) as f64 * 1000.0).ceil() as u64;
        ms.div_ceil(self.tick_duration_ms as u64).max(1)
    }

    /// Elapsed simulated seconds since tick 0.
    pub fn elapsed_secs(&self) -> f32 {
        self.secs_between(Tick::ZERO, self.current_tick)
    }
}

impl Default for SimClock {
    /// 100 ms per tick (10 Hz), a typical script update rate.
    fn default() -> Self {
        SimClock::new(100)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed_secs() as u64;
        write!(f, "{} ({:02}:{:02})", self.current_tick, secs / 60, secs % 60)
    }
}
