//! Pluggable per-metric aggregation.
//!
//! Each calculator decides whether an event counts for its metric and, if so,
//! which entity it is attributed to. Adding a metric means registering another
//! [`StatisticCalculator`] with the engine.

mod attack;
mod healing;
mod taken;


use meter_types::MetricKind;

use crate::battle_log::{BattleLogEvent, EntityId};
use crate::context::StatisticsContext;

pub use attack::AttackDamageCalculator;
pub use healing::HealingCalculator;
pub use taken::TakenDamageCalculator;

pub trait StatisticCalculator: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Fold one event into the context if it belongs to this metric
    fn calculate(&self, event: &BattleLogEvent, context: &StatisticsContext);

    /// Called when the section scope is reset. The context clears its own
    /// section data; only calculators with private state need this.
    fn reset_section(&self, _context: &StatisticsContext) {}
}

/// The calculators every engine starts with
pub fn default_calculators() -> Vec<Box<dyn StatisticCalculator>> {
    vec![
        Box::new(AttackDamageCalculator),
        Box::new(TakenDamageCalculator),
        Box::new(HealingCalculator),
    ]
}

/// Zero or negative values carry nothing to count (misses are counted anyway)
fn is_countable(event: &BattleLogEvent) -> bool {
    event.is_miss || event.value > 0
}

/// Attribute `event` to `entity_id` under `kind` in both scopes
fn accumulate(
    context: &StatisticsContext,
    entity_id: EntityId,
    is_npc: bool,
    kind: MetricKind,
    event: &BattleLogEvent,
) {
    let player = context.player(entity_id);
    for stats in player.both() {
        stats.touch(event.time_ticks, is_npc);
        if event.is_miss {
            stats.record_miss(kind);
        } else {
            stats.record_hit(kind, event);
        }
    }
}
