//! Section state machine for engagement segmentation.
//!
//! The section state machine tracks the lifecycle of a section:
//! - Idle: no battle log recorded yet
//! - Active: a log was recorded recently, the monitor is watching for a gap
//! - TimedOut: the monitor saw no log within the timeout and closed the section
//!
//! This module only decides *when* a section ends; the engine performs the
//! clear and emits BeforeSectionCleared/NewSectionCreated.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::battle_log::secs_to_ticks;
use crate::sync::lock;

use super::SectionEndReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    #[default]
    Idle,
    Active,
    TimedOut,
}

#[derive(Debug, Default)]
struct Tracker {
    state: SectionState,
    section_id: u64,
    last_event_ticks: Option<i64>,
    last_event_at: Option<Instant>,
}

/// A section boundary reported by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRollover {
    /// Section being closed
    pub closing_id: u64,
    /// Section that begins after the clear
    pub next_id: u64,
    pub reason: SectionEndReason,
    pub last_event_ticks: Option<i64>,
}

#[derive(Debug)]
pub struct SectionLifecycleManager {
    timeout: Duration,
    timeout_ticks: i64,
    force_new_section: AtomicBool,
    tracker: Mutex<Tracker>,
}

impl SectionLifecycleManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            timeout_ticks: secs_to_ticks(timeout.as_secs_f64()),
            force_new_section: AtomicBool::new(false),
            tracker: Mutex::new(Tracker::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> SectionState {
        lock(&self.tracker).state
    }

    pub fn section_id(&self) -> u64 {
        lock(&self.tracker).section_id
    }

    /// Close the current section on the next recorded event
    pub fn force_new_section(&self) {
        self.force_new_section.store(true, Ordering::SeqCst);
    }

    pub fn is_new_section_forced(&self) -> bool {
        self.force_new_section.load(Ordering::SeqCst)
    }

    /// Advance the state machine for an event at `time_ticks`, observed at
    /// wall-clock `now`. Returns a rollover when the event starts a new section.
    ///
    /// A gap after the monitor already timed the section out does not roll
    /// again: that section was closed and the new one is still empty.
    pub fn on_event(&self, time_ticks: i64, now: Instant) -> Option<SectionRollover> {
        let forced = self.force_new_section.swap(false, Ordering::SeqCst);
        let mut tracker = lock(&self.tracker);

        let gap_exceeded = tracker
            .last_event_ticks
            .is_some_and(|prev| time_ticks.saturating_sub(prev) > self.timeout_ticks);

        let reason = if forced {
            Some(SectionEndReason::Forced)
        } else if gap_exceeded && tracker.state != SectionState::TimedOut {
            Some(SectionEndReason::EventGap)
        } else {
            None
        };

        let rollover = reason.map(|reason| roll(&mut tracker, reason));

        tracker.state = SectionState::Active;
        tracker.last_event_ticks = Some(time_ticks);
        tracker.last_event_at = Some(now);
        rollover
    }

    /// Monitor tick. Returns a rollover once per idle period when no event
    /// arrived within the timeout.
    pub fn check_timeout(&self, now: Instant) -> Option<SectionRollover> {
        let mut tracker = lock(&self.tracker);
        if tracker.state != SectionState::Active {
            return None;
        }
        let idle = tracker
            .last_event_at
            .map(|at| now.saturating_duration_since(at))?;
        if idle <= self.timeout {
            return None;
        }

        let rollover = roll(&mut tracker, SectionEndReason::IdleTimeout);
        tracker.state = SectionState::TimedOut;
        Some(rollover)
    }

    /// Close the current section on request, independent of timing
    pub fn manual_rollover(&self) -> SectionRollover {
        roll(&mut lock(&self.tracker), SectionEndReason::Manual)
    }

    /// Back to Idle: forget the previous event (used by clear-all)
    pub fn reset(&self) {
        let mut tracker = lock(&self.tracker);
        let section_id = tracker.section_id;
        *tracker = Tracker {
            section_id,
            ..Tracker::default()
        };
        self.force_new_section.store(false, Ordering::SeqCst);
    }
}

fn roll(tracker: &mut Tracker, reason: SectionEndReason) -> SectionRollover {
    let closing_id = tracker.section_id;
    tracker.section_id += 1;
    SectionRollover {
        closing_id,
        next_id: tracker.section_id,
        reason,
        last_event_ticks: tracker.last_event_ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle_log::TICKS_PER_SECOND;

    const TIMEOUT_SECS: i64 = 5;

    fn manager() -> SectionLifecycleManager {
        SectionLifecycleManager::new(Duration::from_secs(TIMEOUT_SECS as u64))
    }

    fn ticks(secs: i64) -> i64 {
        secs * TICKS_PER_SECOND
    }

    #[test]
    fn first_event_activates_without_rollover() {
        let manager = manager();
        assert_eq!(manager.state(), SectionState::Idle);
        assert_eq!(manager.on_event(ticks(0), Instant::now()), None);
        assert_eq!(manager.state(), SectionState::Active);
    }

    #[test]
    fn gap_beyond_timeout_rolls_over() {
        let manager = manager();
        let now = Instant::now();
        manager.on_event(ticks(0), now);
        // Exactly the timeout is still the same section
        assert_eq!(manager.on_event(ticks(TIMEOUT_SECS), now), None);

        let rollover = manager
            .on_event(ticks(2 * TIMEOUT_SECS + 1), now)
            .expect("gap should roll over");
        assert_eq!(rollover.reason, SectionEndReason::EventGap);
        assert_eq!(rollover.closing_id, 0);
        assert_eq!(rollover.next_id, 1);
        assert_eq!(rollover.last_event_ticks, Some(ticks(TIMEOUT_SECS)));
        assert_eq!(manager.section_id(), 1);
    }

    #[test]
    fn forced_flag_rolls_once() {
        let manager = manager();
        let now = Instant::now();
        manager.on_event(ticks(0), now);
        manager.force_new_section();
        assert!(manager.is_new_section_forced());

        let rollover = manager.on_event(ticks(1), now).unwrap();
        assert_eq!(rollover.reason, SectionEndReason::Forced);
        assert!(!manager.is_new_section_forced());
        assert_eq!(manager.on_event(ticks(2), now), None);
    }

    #[test]
    fn idle_timeout_fires_once_per_idle_period() {
        let manager = manager();
        let start = Instant::now();
        // Nothing to time out before the first event
        assert_eq!(manager.check_timeout(start + Duration::from_secs(60)), None);

        manager.on_event(ticks(0), start);
        assert_eq!(manager.check_timeout(start + Duration::from_secs(3)), None);

        let later = start + Duration::from_secs(TIMEOUT_SECS as u64 + 1);
        let rollover = manager.check_timeout(later).unwrap();
        assert_eq!(rollover.reason, SectionEndReason::IdleTimeout);
        assert_eq!(manager.state(), SectionState::TimedOut);

        // Latched until the next event
        assert_eq!(manager.check_timeout(later + Duration::from_secs(30)), None);

        // The late event starts the already-fresh section without a second clear
        assert_eq!(manager.on_event(ticks(100), later + Duration::from_secs(31)), None);
        assert_eq!(manager.state(), SectionState::Active);
        assert_eq!(manager.section_id(), 1);
    }

    #[test]
    fn extreme_tick_gap_saturates() {
        let manager = manager();
        let now = Instant::now();
        manager.on_event(i64::MIN, now);
        let rollover = manager.on_event(i64::MAX, now).unwrap();
        assert_eq!(rollover.reason, SectionEndReason::EventGap);

        // Backwards in time is never a gap
        assert_eq!(manager.on_event(i64::MIN, now), None);
    }

    #[test]
    fn reset_returns_to_idle() {
        let manager = manager();
        let now = Instant::now();
        manager.on_event(ticks(0), now);
        manager.reset();
        assert_eq!(manager.state(), SectionState::Idle);
        // No previous event, so a large jump is not a gap
        assert_eq!(manager.on_event(ticks(1000), now), None);
    }
}
