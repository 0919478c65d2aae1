//! Dual-scope statistics storage.
//!
//! Every event lands in two scopes at once: the full session and the current
//! section. The section scope is emptied whenever a new section begins; the
//! full scope only by an explicit clear-all.

use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use crate::battle_log::{BattleLogEvent, EntityId};
use crate::samples::SamplePolicy;
use crate::statistics::PlayerStatistics;
use crate::sync::lock;

/// Which of the two scopes to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Whole session
    Full,
    /// Current uninterrupted engagement
    Section,
}

impl Scope {
    pub fn from_full(full: bool) -> Self {
        if full { Scope::Full } else { Scope::Section }
    }
}

/// Snapshot of an entity map: a fresh map sharing the entity entries.
pub type StatisticsMap = HashMap<EntityId, Arc<PlayerStatistics>>;

/// The same entity in both scopes.
#[derive(Debug, Clone)]
pub struct ScopedPlayer {
    pub full: Arc<PlayerStatistics>,
    pub section: Arc<PlayerStatistics>,
}

impl ScopedPlayer {
    pub fn both(&self) -> [&PlayerStatistics; 2] {
        [&self.full, &self.section]
    }
}

#[derive(Debug, Default)]
struct ScopedStats {
    full: StatisticsMap,
    section: StatisticsMap,
}

#[derive(Debug, Default)]
struct ScopedLogs {
    full: Vec<Arc<BattleLogEvent>>,
    section: Vec<Arc<BattleLogEvent>>,
}

/// Owns per-entity statistics and battle logs for both scopes.
///
/// One lock guards the entity maps and another the log lists, so a reader
/// copying logs never waits on an entity insert. Snapshots are taken under
/// the lock and iterated without it.
#[derive(Debug, Default)]
pub struct StatisticsContext {
    policy: SamplePolicy,
    stats: Mutex<ScopedStats>,
    logs: Mutex<ScopedLogs>,
}

impl StatisticsContext {
    pub fn new(policy: SamplePolicy) -> Self {
        Self {
            policy,
            stats: Mutex::default(),
            logs: Mutex::default(),
        }
    }

    // ─── Writer path ────────────────────────────────────────────────────────

    /// Append an event to both log lists
    pub fn record_log(&self, event: BattleLogEvent) -> Arc<BattleLogEvent> {
        let event = Arc::new(event);
        let mut logs = lock(&self.logs);
        logs.full.push(Arc::clone(&event));
        logs.section.push(Arc::clone(&event));
        event
    }

    /// Fetch or create the entity in both scopes
    pub fn player(&self, entity_id: EntityId) -> ScopedPlayer {
        let mut stats = lock(&self.stats);
        let policy = self.policy;
        let full = Arc::clone(
            stats
                .full
                .entry(entity_id)
                .or_insert_with(|| Arc::new(PlayerStatistics::new(entity_id, &policy))),
        );
        let section = Arc::clone(
            stats
                .section
                .entry(entity_id)
                .or_insert_with(|| Arc::new(PlayerStatistics::new(entity_id, &policy))),
        );
        ScopedPlayer { full, section }
    }

    /// Fetch or create the entity in the full scope only
    pub fn full_player(&self, entity_id: EntityId) -> Arc<PlayerStatistics> {
        let mut stats = lock(&self.stats);
        let policy = self.policy;
        Arc::clone(
            stats
                .full
                .entry(entity_id)
                .or_insert_with(|| Arc::new(PlayerStatistics::new(entity_id, &policy))),
        )
    }

    /// Fetch or create the entity in the section scope only
    pub fn section_player(&self, entity_id: EntityId) -> Arc<PlayerStatistics> {
        let mut stats = lock(&self.stats);
        let policy = self.policy;
        Arc::clone(
            stats
                .section
                .entry(entity_id)
                .or_insert_with(|| Arc::new(PlayerStatistics::new(entity_id, &policy))),
        )
    }

    /// Drop section entities and section logs. Handles already given out keep
    /// their final values.
    pub fn reset_section(&self) {
        lock(&self.stats).section.clear();
        lock(&self.logs).section.clear();
    }

    pub fn clear_all(&self) {
        {
            let mut stats = lock(&self.stats);
            stats.full.clear();
            stats.section.clear();
        }
        let mut logs = lock(&self.logs);
        logs.full.clear();
        logs.section.clear();
    }

    // ─── Reader path ────────────────────────────────────────────────────────

    pub fn get(&self, scope: Scope, entity_id: EntityId) -> Option<Arc<PlayerStatistics>> {
        let stats = lock(&self.stats);
        let map = match scope {
            Scope::Full => &stats.full,
            Scope::Section => &stats.section,
        };
        map.get(&entity_id).cloned()
    }

    pub fn statistics(&self, scope: Scope) -> StatisticsMap {
        let stats = lock(&self.stats);
        match scope {
            Scope::Full => stats.full.clone(),
            Scope::Section => stats.section.clone(),
        }
    }

    pub fn full_statistics(&self) -> StatisticsMap {
        self.statistics(Scope::Full)
    }

    pub fn section_statistics(&self) -> StatisticsMap {
        self.statistics(Scope::Section)
    }

    pub fn statistics_count(&self, scope: Scope) -> usize {
        let stats = lock(&self.stats);
        match scope {
            Scope::Full => stats.full.len(),
            Scope::Section => stats.section.len(),
        }
    }

    pub fn battle_logs(&self, scope: Scope) -> Vec<Arc<BattleLogEvent>> {
        let logs = lock(&self.logs);
        match scope {
            Scope::Full => logs.full.clone(),
            Scope::Section => logs.section.clone(),
        }
    }

    pub fn full_battle_logs(&self) -> Vec<Arc<BattleLogEvent>> {
        self.battle_logs(Scope::Full)
    }

    pub fn section_battle_logs(&self) -> Vec<Arc<BattleLogEvent>> {
        self.battle_logs(Scope::Section)
    }

    /// Logs where the entity is attacker or target
    pub fn battle_logs_for(&self, entity_id: EntityId, scope: Scope) -> Vec<Arc<BattleLogEvent>> {
        let logs = lock(&self.logs);
        let list = match scope {
            Scope::Full => &logs.full,
            Scope::Section => &logs.section,
        };
        list.iter()
            .filter(|event| event.involves(entity_id))
            .cloned()
            .collect()
    }

    pub fn battle_log_count(&self, scope: Scope) -> usize {
        let logs = lock(&self.logs);
        match scope {
            Scope::Full => logs.full.len(),
            Scope::Section => logs.section.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_types::MetricKind;

    fn event(attacker_id: EntityId, target_id: EntityId, value: i64) -> BattleLogEvent {
        BattleLogEvent {
            attacker_id,
            target_id,
            value,
            ..Default::default()
        }
    }

    #[test]
    fn player_is_created_once_per_scope() {
        let context = StatisticsContext::default();
        let first = context.player(1);
        let second = context.player(1);
        assert!(Arc::ptr_eq(&first.full, &second.full));
        assert!(Arc::ptr_eq(&first.section, &second.section));
        assert!(!Arc::ptr_eq(&first.full, &first.section));
        assert_eq!(context.statistics_count(Scope::Full), 1);
        assert_eq!(context.statistics_count(Scope::Section), 1);
    }

    #[test]
    fn reset_section_keeps_full_scope() {
        let context = StatisticsContext::default();
        context.record_log(event(1, 2, 10));
        let player = context.player(1);
        player.full.record_hit(MetricKind::AttackDamage, &event(1, 2, 10));

        context.reset_section();

        assert!(context.section_statistics().is_empty());
        assert!(context.section_battle_logs().is_empty());
        assert_eq!(context.full_statistics().len(), 1);
        assert_eq!(context.full_battle_logs().len(), 1);
        assert_eq!(context.get(Scope::Full, 1).unwrap().attack_damage().total(), 10);
    }

    #[test]
    fn clear_all_empties_both_scopes() {
        let context = StatisticsContext::default();
        context.record_log(event(1, 2, 10));
        context.player(1);
        context.clear_all();
        assert_eq!(context.statistics_count(Scope::Full), 0);
        assert_eq!(context.battle_log_count(Scope::Full), 0);
        assert_eq!(context.battle_log_count(Scope::Section), 0);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_inserts() {
        let context = StatisticsContext::default();
        context.player(1);
        let snapshot = context.full_statistics();
        context.player(2);
        context.player(3);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(context.full_statistics().len(), 3);
    }

    #[test]
    fn filtered_logs_match_either_side() {
        let context = StatisticsContext::default();
        context.record_log(event(1, 2, 10));
        context.record_log(event(3, 1, 5));
        context.record_log(event(3, 4, 7));

        assert_eq!(context.battle_logs_for(1, Scope::Full).len(), 2);
        assert_eq!(context.battle_logs_for(4, Scope::Section).len(), 1);
        assert!(context.battle_logs_for(9, Scope::Full).is_empty());
    }
}
