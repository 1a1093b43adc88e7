//! # Sync points
//!
//! Device progress is tracked by a single frame counter. Every frame boundary moves the counter forward by exactly one.
//! Tasks declare a [SyncPoint] at which their GPU side effects are guaranteed to be visible. The scheduler compares both values
//! to decide whether a task can be finalized.
//!
//! The counter starts at [DEFAULT_INITIAL_SYNC_POINT] instead of zero. A default constructed [SyncPoint] is zero, so comparing an
//! uninitialized sync point against the counter can never spuriously claim that work has not yet been reached.

use std::fmt::Display;

///Value the frame counter starts at.
pub const DEFAULT_INITIAL_SYNC_POINT: SyncPoint = SyncPoint(10);

///Monotonically increasing frame marker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncPoint(pub u64);

impl SyncPoint {
    ///Uninitialized sync point. Always reached.
    pub const ZERO: SyncPoint = SyncPoint(0);

    pub const fn value(&self) -> u64 {
        self.0
    }

    ///Returns the sync point `frames` after `self`.
    pub const fn after(&self, frames: u64) -> SyncPoint {
        SyncPoint(self.0.saturating_add(frames))
    }
}

impl From<u64> for SyncPoint {
    fn from(value: u64) -> Self {
        SyncPoint(value)
    }
}

impl Display for SyncPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SyncPoint({})", self.0)
    }
}

///The frame counter. Only ever moves forward, one step per frame.
#[derive(Debug)]
pub struct SyncCounter {
    current: SyncPoint,
}

impl SyncCounter {
    pub fn new(initial: SyncPoint) -> Self {
        SyncCounter { current: initial }
    }

    pub fn current(&self) -> SyncPoint {
        self.current
    }

    ///Moves forward one frame and returns the new value.
    pub fn advance(&mut self) -> SyncPoint {
        self.current = SyncPoint(
            self.current
                .0
                .checked_add(1)
                .expect("Sync counter overflowed"),
        );
        self.current
    }

    ///Returns true if the counter reached `point`.
    pub fn is_reached(&self, point: SyncPoint) -> bool {
        point <= self.current
    }
}

impl Default for SyncCounter {
    fn default() -> Self {
        SyncCounter::new(DEFAULT_INITIAL_SYNC_POINT)
    }
}
