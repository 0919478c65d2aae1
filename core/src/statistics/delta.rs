//! Instantaneous rate tracking.
//!
//! A tracker remembers the `(time, total)` seen on the previous sampling tick
//! and turns the difference into a per-second rate. Stopping the tracker keeps
//! the last rate visible (the burst value shown while combat pauses).

use std::sync::Mutex;

use crate::sync::lock;

use super::AtomicF64;

/// Smallest time step used as a divisor
pub const DELTA_EPSILON_SECS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Snapshot {
    secs: f64,
    total: i64,
}

#[derive(Debug, Default)]
struct TrackerState {
    previous: Option<Snapshot>,
    stopped: bool,
}

/// Tracking state of a [`DeltaRateTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaTracking {
    /// No previous snapshot; the next update reports 0
    Unarmed,
    Tracking,
    /// Frozen on the last computed rate
    Stopped,
}

#[derive(Debug, Default)]
pub struct DeltaRateTracker {
    state: Mutex<TrackerState>,
}

impl DeltaRateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the tracker to `now_secs` with the metric's current `total`.
    ///
    /// The resulting rate is published to `rate`. Returns the rate when a
    /// sample should be appended to the metric's series: never on the first
    /// call after arming, never while stopped, and never when time did not move.
    pub fn update(&self, now_secs: f64, total: i64, rate: &AtomicF64) -> Option<f64> {
        let mut state = lock(&self.state);
        if state.stopped {
            return None;
        }

        let Some(previous) = state.previous else {
            state.previous = Some(Snapshot {
                secs: now_secs,
                total,
            });
            rate.store(0.0);
            return None;
        };

        let elapsed = now_secs - previous.secs;
        if elapsed <= 0.0 {
            return None;
        }

        let delta = (total - previous.total) as f64 / elapsed.max(DELTA_EPSILON_SECS);
        state.previous = Some(Snapshot {
            secs: now_secs,
            total,
        });
        rate.store(delta);
        Some(delta)
    }

    /// Freeze the published rate and ignore updates
    pub fn stop(&self) {
        lock(&self.state).stopped = true;
    }

    /// Accept updates again; the frozen rate stays until the next update
    pub fn resume(&self) {
        lock(&self.state).stopped = false;
    }

    /// Zero the rate and forget the previous snapshot
    pub fn reset(&self, rate: &AtomicF64) {
        let mut state = lock(&self.state);
        *state = TrackerState::default();
        rate.store(0.0);
    }

    pub fn tracking(&self) -> DeltaTracking {
        let state = lock(&self.state);
        match (state.stopped, state.previous) {
            (true, _) => DeltaTracking::Stopped,
            (false, None) => DeltaTracking::Unarmed,
            (false, Some(_)) => DeltaTracking::Tracking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_reports_zero() {
        let tracker = DeltaRateTracker::new();
        let rate = AtomicF64::new(99.0);
        assert_eq!(tracker.update(10.0, 5000, &rate), None);
        assert_eq!(rate.load(), 0.0);
        assert_eq!(tracker.tracking(), DeltaTracking::Tracking);
    }

    #[test]
    fn second_update_divides_by_elapsed() {
        let tracker = DeltaRateTracker::new();
        let rate = AtomicF64::default();
        tracker.update(1.0, 100, &rate);

        let delta = tracker.update(3.5, 600, &rate).expect("sample expected");
        assert!((delta - 200.0).abs() < 1e-9);
        assert!((rate.load() - 200.0).abs() < 1e-9);

        // Next window is measured from the new snapshot
        let delta = tracker.update(4.5, 650, &rate).expect("sample expected");
        assert!((delta - 50.0).abs() < 1e-9);
    }

    #[test]
    fn no_time_advance_leaves_state_untouched() {
        let tracker = DeltaRateTracker::new();
        let rate = AtomicF64::default();
        tracker.update(1.0, 0, &rate);
        tracker.update(2.0, 100, &rate);

        assert_eq!(tracker.update(2.0, 900, &rate), None);
        assert_eq!(tracker.update(1.5, 900, &rate), None);
        assert_eq!(rate.load(), 100.0);

        // Previous snapshot is still (2.0, 100)
        let delta = tracker.update(3.0, 300, &rate).unwrap();
        assert_eq!(delta, 200.0);
    }

    #[test]
    fn stop_freezes_until_resume() {
        let tracker = DeltaRateTracker::new();
        let rate = AtomicF64::default();
        tracker.update(0.0, 0, &rate);
        tracker.update(1.0, 400, &rate);
        tracker.stop();

        assert_eq!(tracker.update(2.0, 10_000, &rate), None);
        assert_eq!(tracker.update(3.0, 20_000, &rate), None);
        assert_eq!(rate.load(), 400.0);
        assert_eq!(tracker.tracking(), DeltaTracking::Stopped);

        tracker.resume();
        assert_eq!(rate.load(), 400.0);
        let delta = tracker.update(4.0, 1000, &rate).unwrap();
        // Measured against the snapshot taken before stopping
        assert_eq!(delta, 200.0);
    }

    #[test]
    fn reset_behaves_like_first_call() {
        let tracker = DeltaRateTracker::new();
        let rate = AtomicF64::default();
        tracker.update(0.0, 0, &rate);
        tracker.update(1.0, 400, &rate);
        tracker.stop();

        tracker.reset(&rate);
        assert_eq!(rate.load(), 0.0);
        assert_eq!(tracker.tracking(), DeltaTracking::Unarmed);

        assert_eq!(tracker.update(5.0, 5000, &rate), None);
        assert_eq!(rate.load(), 0.0);
        assert_eq!(tracker.update(6.0, 5100, &rate), Some(100.0));
    }
}
