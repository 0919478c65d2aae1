use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use meter_types::StatisticSummary;

use crate::battle_log::HitKind;

use super::AtomicF64;

/// Elapsed time below this is treated as one second when deriving the
/// cumulative rate, so a single opening hit does not read as a huge spike.
const MIN_RATE_WINDOW_SECS: f64 = 1.0;

/// Cumulative counters of one metric for one entity.
///
/// Only the engine's writer path mutates these. Every field is an atomic so
/// readers on other threads can poll them while events stream in.
#[derive(Debug, Default)]
pub struct StatisticValues {
    total: AtomicI64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    crit_count: AtomicU64,
    lucky_count: AtomicU64,
    crit_and_lucky_count: AtomicU64,
    normal_value: AtomicI64,
    crit_value: AtomicI64,
    lucky_value: AtomicI64,
    crit_and_lucky_value: AtomicI64,
    max_value: AtomicI64,
    value_per_second: AtomicF64,
    delta_value_per_second: AtomicF64,
}

impl StatisticValues {
    /// Add one landed hit to its category bucket and to `total`
    pub fn record_hit(&self, value: i64, kind: HitKind) {
        let (bucket, count) = match kind {
            HitKind::Normal => (&self.normal_value, None),
            HitKind::Critical => (&self.crit_value, Some(&self.crit_count)),
            HitKind::Lucky => (&self.lucky_value, Some(&self.lucky_count)),
            HitKind::CriticalLucky => (
                &self.crit_and_lucky_value,
                Some(&self.crit_and_lucky_count),
            ),
        };
        bucket.fetch_add(value, Ordering::Relaxed);
        if let Some(count) = count {
            count.fetch_add(1, Ordering::Relaxed);
        }
        self.total.fetch_add(value, Ordering::Relaxed);
        self.hit_count.fetch_add(1, Ordering::Relaxed);
        self.max_value.fetch_max(value, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.miss_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Recompute `value_per_second` as total over the entity's active time
    pub fn refresh_value_per_second(&self, active_secs: f64) {
        let window = active_secs.max(MIN_RATE_WINDOW_SECS);
        self.value_per_second.store(self.total() as f64 / window);
    }

    pub fn total(&self) -> i64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.miss_count.load(Ordering::Relaxed)
    }

    pub fn crit_count(&self) -> u64 {
        self.crit_count.load(Ordering::Relaxed)
    }

    pub fn lucky_count(&self) -> u64 {
        self.lucky_count.load(Ordering::Relaxed)
    }

    pub fn crit_and_lucky_count(&self) -> u64 {
        self.crit_and_lucky_count.load(Ordering::Relaxed)
    }

    pub fn normal_value(&self) -> i64 {
        self.normal_value.load(Ordering::Relaxed)
    }

    pub fn crit_value(&self) -> i64 {
        self.crit_value.load(Ordering::Relaxed)
    }

    pub fn lucky_value(&self) -> i64 {
        self.lucky_value.load(Ordering::Relaxed)
    }

    pub fn crit_and_lucky_value(&self) -> i64 {
        self.crit_and_lucky_value.load(Ordering::Relaxed)
    }

    pub fn max_value(&self) -> i64 {
        self.max_value.load(Ordering::Relaxed)
    }

    pub fn value_per_second(&self) -> f64 {
        self.value_per_second.load()
    }

    /// Instantaneous rate from the most recent delta-sampling tick
    pub fn delta_value_per_second(&self) -> f64 {
        self.delta_value_per_second.load()
    }

    pub(crate) fn delta_slot(&self) -> &AtomicF64 {
        &self.delta_value_per_second
    }

    pub fn summary(&self) -> StatisticSummary {
        StatisticSummary {
            total: self.total(),
            hit_count: self.hit_count(),
            miss_count: self.miss_count(),
            crit_count: self.crit_count(),
            lucky_count: self.lucky_count(),
            crit_and_lucky_count: self.crit_and_lucky_count(),
            normal_value: self.normal_value(),
            crit_value: self.crit_value(),
            lucky_value: self.lucky_value(),
            crit_and_lucky_value: self.crit_and_lucky_value(),
            max_value: self.max_value(),
            value_per_second: self.value_per_second(),
            delta_value_per_second: self.delta_value_per_second(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_sum_to_total() {
        let values = StatisticValues::default();
        values.record_hit(100, HitKind::Normal);
        values.record_hit(250, HitKind::Critical);
        values.record_hit(120, HitKind::Lucky);
        values.record_hit(400, HitKind::CriticalLucky);

        let s = values.summary();
        assert_eq!(s.total, 870);
        assert_eq!(
            s.total,
            s.normal_value + s.crit_value + s.lucky_value + s.crit_and_lucky_value
        );
        assert_eq!(s.hit_count, 4);
        // Buckets are exclusive: a crit-and-lucky hit is not also a plain crit
        assert_eq!(s.crit_count, 1);
        assert_eq!(s.lucky_count, 1);
        assert_eq!(s.crit_and_lucky_count, 1);
        assert_eq!(s.max_value, 400);
    }

    #[test]
    fn value_per_second_uses_minimum_window() {
        let values = StatisticValues::default();
        values.record_hit(500, HitKind::Normal);
        values.refresh_value_per_second(0.0);
        assert_eq!(values.value_per_second(), 500.0);

        values.refresh_value_per_second(4.0);
        assert_eq!(values.value_per_second(), 125.0);
    }

}
