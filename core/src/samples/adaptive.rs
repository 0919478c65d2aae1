use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::sync::lock;

use super::{DpsDataPoint, SampleManager};

/// Every sample, kept for 5 minutes
const HIGH_RES_WINDOW_SECS: f64 = 5.0 * 60.0;
/// Every 5th sample, kept for 30 minutes
const MEDIUM_RES_STRIDE: u64 = 5;
const MEDIUM_RES_WINDOW_SECS: f64 = 30.0 * 60.0;
/// Every 30th sample, capped by count (~3 hours at one sample per second)
const LOW_RES_STRIDE: u64 = 30;
const LOW_RES_CAPACITY: usize = 3 * 60 * 60 / LOW_RES_STRIDE as usize;

#[derive(Debug, Default)]
struct Tiers {
    high: VecDeque<DpsDataPoint>,
    medium: VecDeque<DpsDataPoint>,
    low: VecDeque<DpsDataPoint>,
    inserted: u64,
    cache: Option<(u64, Arc<[DpsDataPoint]>)>,
}

impl Tiers {
    fn evict(&mut self, latest: f64) {
        while self
            .high
            .front()
            .is_some_and(|p| latest - p.time_offset > HIGH_RES_WINDOW_SECS)
        {
            self.high.pop_front();
        }
        while self
            .medium
            .front()
            .is_some_and(|p| latest - p.time_offset > MEDIUM_RES_WINDOW_SECS)
        {
            self.medium.pop_front();
        }
        while self.low.len() > LOW_RES_CAPACITY {
            self.low.pop_front();
        }
    }

    /// Low then medium then high. A coarser tier only contributes points
    /// older than the first point of the next finer tier, so a sample that
    /// lives in several tiers is emitted once.
    fn merged(&self) -> Vec<DpsDataPoint> {
        let high_start = self.high.front().map(|p| p.time_offset);
        let medium_start = self.medium.front().map(|p| p.time_offset).or(high_start);

        let mut out = Vec::with_capacity(self.low.len() + self.medium.len() + self.high.len());
        out.extend(
            self.low
                .iter()
                .filter(|p| medium_start.is_none_or(|start| p.time_offset < start)),
        );
        out.extend(
            self.medium
                .iter()
                .filter(|p| high_start.is_none_or(|start| p.time_offset < start)),
        );
        out.extend(self.high.iter());
        out
    }
}

/// Multi-resolution rate series for unbounded-duration sessions.
///
/// Recent samples are kept at full resolution while older history is thinned
/// out, so memory stays bounded without losing the shape of a long fight.
/// Ages are measured against the newest inserted sample, not the wall clock.
#[derive(Debug, Default)]
pub struct AdaptiveSampleManager {
    tiers: Mutex<Tiers>,
    version: AtomicU64,
}

impl AdaptiveSampleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point counts per tier as (high, medium, low)
    pub fn tier_lengths(&self) -> (usize, usize, usize) {
        let tiers = lock(&self.tiers);
        (tiers.high.len(), tiers.medium.len(), tiers.low.len())
    }
}

impl SampleManager for AdaptiveSampleManager {
    fn add_sample(&self, point: DpsDataPoint) {
        let mut tiers = lock(&self.tiers);
        tiers.inserted += 1;
        let n = tiers.inserted;

        tiers.high.push_back(point);
        if n % MEDIUM_RES_STRIDE == 0 {
            tiers.medium.push_back(point);
        }
        if n % LOW_RES_STRIDE == 0 {
            tiers.low.push_back(point);
        }
        tiers.evict(point.time_offset);
        tiers.cache = None;
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    fn samples(&self) -> Arc<[DpsDataPoint]> {
        let mut tiers = lock(&self.tiers);
        let version = self.version.load(Ordering::Acquire);
        if let Some((cached_version, samples)) = &tiers.cache
            && *cached_version == version
        {
            return Arc::clone(samples);
        }
        let samples: Arc<[DpsDataPoint]> = tiers.merged().into();
        tiers.cache = Some((version, Arc::clone(&samples)));
        samples
    }

    fn len(&self) -> usize {
        lock(&self.tiers).merged().len()
    }

    fn clear(&self) {
        let mut tiers = lock(&self.tiers);
        *tiers = Tiers::default();
        self.version.store(0, Ordering::Release);
    }
}
