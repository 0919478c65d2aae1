use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use hashbrown::HashMap;
use meter_types::{MetricKind, PlayerSummary};

use crate::battle_log::{BattleLogEvent, EntityId, ticks_to_secs};
use crate::samples::{DpsDataPoint, SampleManager, SamplePolicy};
use crate::sync::lock;

use super::{DeltaRateTracker, DeltaTracking, SkillStatistics, StatisticValues};

/// Everything kept for one metric of one entity.
#[derive(Debug)]
struct MetricState {
    values: StatisticValues,
    skills: Mutex<HashMap<i64, SkillStatistics>>,
    tracker: DeltaRateTracker,
    series: Box<dyn SampleManager>,
}

impl MetricState {
    fn new(policy: &SamplePolicy) -> Self {
        Self {
            values: StatisticValues::default(),
            skills: Mutex::new(HashMap::new()),
            tracker: DeltaRateTracker::new(),
            series: policy.create(),
        }
    }
}

/// Statistics of one entity within one scope (full session or section).
///
/// Shared by reference between the owning context and readers, so every
/// field tolerates concurrent reads while the writer updates it.
#[derive(Debug)]
pub struct PlayerStatistics {
    entity_id: EntityId,
    is_npc: AtomicBool,
    seen: AtomicBool,
    start_tick: AtomicI64,
    last_tick: AtomicI64,
    death_count: AtomicU64,
    metrics: [MetricState; 3],
}

impl PlayerStatistics {
    pub fn new(entity_id: EntityId, policy: &SamplePolicy) -> Self {
        Self {
            entity_id,
            is_npc: AtomicBool::new(false),
            seen: AtomicBool::new(false),
            start_tick: AtomicI64::new(0),
            last_tick: AtomicI64::new(0),
            death_count: AtomicU64::new(0),
            metrics: MetricKind::ALL.map(|_| MetricState::new(policy)),
        }
    }

    fn metric(&self, kind: MetricKind) -> &MetricState {
        &self.metrics[kind.index()]
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn is_npc(&self) -> bool {
        self.is_npc.load(Ordering::Relaxed)
    }

    /// Tick of the first event seen for this entity
    pub fn start_tick(&self) -> i64 {
        self.start_tick.load(Ordering::Relaxed)
    }

    /// Tick of the most recent event seen for this entity
    pub fn last_tick(&self) -> i64 {
        self.last_tick.load(Ordering::Relaxed)
    }

    pub fn active_secs(&self) -> f64 {
        ticks_to_secs(self.last_tick().saturating_sub(self.start_tick()))
    }

    pub fn death_count(&self) -> u64 {
        self.death_count.load(Ordering::Relaxed)
    }

    pub fn values(&self, kind: MetricKind) -> &StatisticValues {
        &self.metric(kind).values
    }

    pub fn attack_damage(&self) -> &StatisticValues {
        self.values(MetricKind::AttackDamage)
    }

    pub fn taken_damage(&self) -> &StatisticValues {
        self.values(MetricKind::TakenDamage)
    }

    pub fn healing(&self) -> &StatisticValues {
        self.values(MetricKind::Healing)
    }

    pub fn skill(&self, kind: MetricKind, skill_id: i64) -> Option<SkillStatistics> {
        lock(&self.metric(kind).skills).get(&skill_id).cloned()
    }

    /// Skill rows sorted by skill id
    pub fn skills(&self, kind: MetricKind) -> Vec<SkillStatistics> {
        let mut skills: Vec<_> = lock(&self.metric(kind).skills).values().cloned().collect();
        skills.sort_by_key(|s| s.skill_id);
        skills
    }

    /// Rate series of one metric
    pub fn samples(&self, kind: MetricKind) -> Arc<[DpsDataPoint]> {
        self.metric(kind).series.samples()
    }

    pub fn delta_tracking(&self, kind: MetricKind) -> DeltaTracking {
        self.metric(kind).tracker.tracking()
    }

    // ─── Accumulation (writer path) ─────────────────────────────────────────

    /// Note activity at `time_ticks`
    pub fn touch(&self, time_ticks: i64, is_npc: bool) {
        if !self.seen.swap(true, Ordering::Relaxed) {
            self.start_tick.store(time_ticks, Ordering::Relaxed);
        }
        self.last_tick.fetch_max(time_ticks, Ordering::Relaxed);
        self.is_npc.store(is_npc, Ordering::Relaxed);
    }

    /// Count a landed hit of `event` under `kind`
    pub fn record_hit(&self, kind: MetricKind, event: &BattleLogEvent) {
        let metric = self.metric(kind);
        let hit_kind = event.hit_kind();

        metric.values.record_hit(event.value, hit_kind);
        lock(&metric.skills)
            .entry(event.skill_id)
            .or_insert_with(|| SkillStatistics::new(event.skill_id))
            .record(event.value, hit_kind);
        metric.values.refresh_value_per_second(self.active_secs());
    }

    pub fn record_miss(&self, kind: MetricKind) {
        self.metric(kind).values.record_miss();
    }

    pub fn record_death(&self) {
        self.death_count.fetch_add(1, Ordering::Relaxed);
    }

    // ─── Delta tracking (sampling path) ─────────────────────────────────────

    /// Sample instantaneous rates of every metric at `elapsed` since the host
    /// started sampling. Returns the number of samples appended.
    pub fn update_delta_values(&self, elapsed: Duration) -> usize {
        let now_secs = elapsed.as_secs_f64();
        let mut appended = 0;
        for metric in &self.metrics {
            let total = metric.values.total();
            if let Some(delta) = metric.tracker.update(now_secs, total, metric.values.delta_slot()) {
                metric.series.add_sample(DpsDataPoint::new(now_secs, delta));
                appended += 1;
            }
        }
        appended
    }

    pub fn stop_delta_tracking(&self) {
        self.metrics.iter().for_each(|m| m.tracker.stop());
    }

    pub fn resume_delta_tracking(&self) {
        self.metrics.iter().for_each(|m| m.tracker.resume());
    }

    pub fn reset_delta_tracking(&self) {
        for metric in &self.metrics {
            metric.tracker.reset(metric.values.delta_slot());
        }
    }

    pub fn snapshot(&self) -> PlayerSummary {
        PlayerSummary {
            entity_id: self.entity_id,
            is_npc: self.is_npc(),
            start_tick: self.start_tick(),
            last_tick: self.last_tick(),
            death_count: self.death_count(),
            attack_damage: self.attack_damage().summary(),
            taken_damage: self.taken_damage().summary(),
            healing: self.healing().summary(),
            skills: MetricKind::ALL
                .into_iter()
                .map(|kind| {
                    let rows = self.skills(kind).iter().map(SkillStatistics::summary).collect();
                    (kind, rows)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle_log::TICKS_PER_SECOND;

    fn hit(skill_id: i64, value: i64, secs: i64) -> BattleLogEvent {
        BattleLogEvent {
            skill_id,
            value,
            time_ticks: secs * TICKS_PER_SECOND,
            attacker_id: 1,
            target_id: 2,
            ..Default::default()
        }
    }

    fn player() -> PlayerStatistics {
        PlayerStatistics::new(1, &SamplePolicy::bounded(Some(10)).unwrap())
    }

    #[test]
    fn active_span_saturates_on_extreme_ticks() {
        let stats = player();
        stats.touch(i64::MIN, false);
        stats.touch(i64::MAX, false);
        assert_eq!(stats.active_secs(), ticks_to_secs(i64::MAX));

        stats.record_hit(MetricKind::AttackDamage, &hit(7, 40, 0));
        assert_eq!(stats.attack_damage().total(), 40);
    }

    #[test]
    fn record_hit_updates_totals_and_skill() {
        let stats = player();
        for event in [hit(7, 100, 0), hit(7, 50, 2), hit(9, 30, 4)] {
            stats.touch(event.time_ticks, false);
            stats.record_hit(MetricKind::AttackDamage, &event);
        }

        assert_eq!(stats.attack_damage().total(), 180);
        assert_eq!(stats.attack_damage().hit_count(), 3);
        assert_eq!(stats.attack_damage().value_per_second(), 45.0);
        assert_eq!(stats.start_tick(), 0);
        assert_eq!(stats.last_tick(), 4 * TICKS_PER_SECOND);

        let skill = stats.skill(MetricKind::AttackDamage, 7).unwrap();
        assert_eq!(skill.total_value, 150);
        assert_eq!(skill.use_times, 2);
        assert_eq!(skill.average(), 75.0);
        assert!(stats.skill(MetricKind::Healing, 7).is_none());
    }

    #[test]
    fn update_delta_values_samples_every_metric() {
        let stats = player();
        assert_eq!(stats.update_delta_values(Duration::from_secs(1)), 0);

        stats.record_hit(MetricKind::AttackDamage, &hit(1, 300, 1));
        stats.record_hit(MetricKind::Healing, &hit(2, 60, 1));
        assert_eq!(stats.update_delta_values(Duration::from_secs(3)), 3);

        assert_eq!(stats.attack_damage().delta_value_per_second(), 150.0);
        assert_eq!(stats.healing().delta_value_per_second(), 30.0);
        assert_eq!(stats.taken_damage().delta_value_per_second(), 0.0);

        let series = stats.samples(MetricKind::AttackDamage);
        assert_eq!(series.as_ref(), &[DpsDataPoint::new(3.0, 150.0)]);
    }

    #[test]
    fn snapshot_contains_skill_rows() {
        let stats = player();
        stats.record_hit(MetricKind::AttackDamage, &hit(2, 10, 0));
        stats.record_hit(MetricKind::AttackDamage, &hit(1, 20, 0));

        let summary = stats.snapshot();
        let rows = &summary.skills[&MetricKind::AttackDamage];
        assert_eq!(rows.iter().map(|r| r.skill_id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(summary.attack_damage.total, 30);
        assert!(summary.skills[&MetricKind::Healing].is_empty());
    }
}
