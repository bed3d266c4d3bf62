//! Normalized progress reporting across fixed-weight stages
//!
//! The run is divided into a fixed number of stage lengths; workers add
//! fractional lengths from any thread and the subscriber sees a value in
//! [0, 1]. Accumulation is fixed-point on an atomic, so concurrent additive
//! increments never lose updates.

use std::sync::atomic::{AtomicU64, Ordering};

/// Total stage lengths across a full run. Adding a reporting stage means
/// increasing this.
pub const TOTAL_STAGE_LENGTHS: f64 = 9.0;

/// Fixed-point scale: one stage length = this many units
const UNIT_SCALE: f64 = 1_000_000.0;

type ProgressFn = dyn Fn(f32) + Send + Sync;

/// Thread-safe accumulator feeding a normalized [0, 1] progress stream
pub struct ProgressReporter {
    units: AtomicU64,
    callback: Option<Box<ProgressFn>>,
}

impl ProgressReporter {
    /// Create a reporter delivering normalized values to `callback`
    pub fn new(callback: Box<ProgressFn>) -> Self {
        ProgressReporter {
            units: AtomicU64::new(0),
            callback: Some(callback),
        }
    }

    /// Reporter that tracks progress without delivering it anywhere
    pub fn disabled() -> Self {
        ProgressReporter {
            units: AtomicU64::new(0),
            callback: None,
        }
    }

    /// Add a fractional number of stage lengths
    pub fn add(&self, lengths: f64) {
        if lengths <= 0.0 {
            return;
        }
        self.units
            .fetch_add((lengths * UNIT_SCALE) as u64, Ordering::Relaxed);
        self.report();
    }

    /// Snap to 100%
    pub fn finish(&self) {
        self.units.store(
            (TOTAL_STAGE_LENGTHS * UNIT_SCALE) as u64,
            Ordering::Relaxed,
        );
        self.report();
    }

    /// Current normalized progress in [0, 1]
    pub fn fraction(&self) -> f32 {
        let units = self.units.load(Ordering::Relaxed) as f64;
        (units / (TOTAL_STAGE_LENGTHS * UNIT_SCALE)).min(1.0) as f32
    }

    fn report(&self) {
        if let Some(callback) = &self.callback {
            callback(self.fraction());
        }
    }
}
