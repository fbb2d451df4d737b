//! Reading aggregator: merges three per-axis notifications into one reading.
//!
//! ```text
//!  notify X ──▶ ┌──────────────────────────┐
//!  notify Y ──▶ │  Mutex<Slots>            │ ──take_complete──▶ AggregatedReading
//!  notify Z ──▶ │  values[3] · fresh[3]    │     (only when X,Y,Z all fresh)
//!               └──────────────────────────┘
//! ```
//!
//! Notification callbacks run on the BLE stack's task while the main loop
//! polls [`ReadingAggregator::take_complete`].  One lock guards both the
//! values and the fresh flags, so the completeness check, the snapshot and
//! the flag reset happen as a unit.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::protocol::{Axis, WireValue};

/// A complete X/Y/Z set as last received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatedReading {
    values: [WireValue; Axis::COUNT],
}

impl AggregatedReading {
    pub fn new(x: WireValue, y: WireValue, z: WireValue) -> Self {
        Self { values: [x, y, z] }
    }

    pub fn axis(&self, axis: Axis) -> &WireValue {
        &self.values[axis.index()]
    }

    pub fn x(&self) -> &WireValue {
        self.axis(Axis::X)
    }

    pub fn y(&self) -> &WireValue {
        self.axis(Axis::Y)
    }

    pub fn z(&self) -> &WireValue {
        self.axis(Axis::Z)
    }
}

#[derive(Debug)]
struct Slots {
    values: [WireValue; Axis::COUNT],
    fresh: [bool; Axis::COUNT],
}

/// Lock-guarded per-axis slots shared between callbacks and the main loop.
#[derive(Debug)]
pub struct ReadingAggregator {
    slots: Mutex<Slots>,
}

impl ReadingAggregator {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                values: [WireValue::EMPTY; Axis::COUNT],
                fresh: [false; Axis::COUNT],
            }),
        }
    }

    /// Notification handler body: store the payload and mark the axis fresh.
    ///
    /// A second update before the set completes overwrites the first.
    pub fn on_notify(&self, axis: Axis, payload: &[u8]) {
        let mut slots = self.lock();
        slots.values[axis.index()] = WireValue::from_payload(payload);
        slots.fresh[axis.index()] = true;
    }

    /// If every axis is fresh, snapshot the values and clear all flags.
    ///
    /// Partial sets are left untouched.
    pub fn take_complete(&self) -> Option<AggregatedReading> {
        let mut slots = self.lock();
        if !slots.fresh.iter().all(|f| *f) {
            return None;
        }
        slots.fresh = [false; Axis::COUNT];
        Some(AggregatedReading {
            values: slots.values,
        })
    }

    /// Drop everything, e.g. when a new session starts.
    pub fn clear(&self) {
        let mut slots = self.lock();
        slots.values = [WireValue::EMPTY; Axis::COUNT];
        slots.fresh = [false; Axis::COUNT];
    }

    /// Fresh flags, indexed by [`Axis::index`].
    pub fn pending(&self) -> [bool; Axis::COUNT] {
        self.lock().fresh
    }

    // A panicking callback must not wedge the display loop; the slots are
    // plain data and stay consistent across a poisoned guard.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReadingAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Central role: GATTC notification callbacks write here.
pub static AGGREGATOR: ReadingAggregator = ReadingAggregator::new();
