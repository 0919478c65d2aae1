use meter_types::MetricKind;

use crate::battle_log::BattleLogEvent;
use crate::context::StatisticsContext;

use super::{StatisticCalculator, accumulate, is_countable};

/// Damage received, attributed to the target. Also counts target deaths.
#[derive(Debug, Clone, Copy, Default)]
pub struct TakenDamageCalculator;

impl StatisticCalculator for TakenDamageCalculator {
    fn name(&self) -> &'static str {
        "taken_damage"
    }

    fn calculate(&self, event: &BattleLogEvent, context: &StatisticsContext) {
        if event.is_heal {
            return;
        }
        let is_npc = !event.is_target_entity_a;

        if is_countable(event) {
            accumulate(context, event.target_id, is_npc, MetricKind::TakenDamage, event);
        }

        if event.is_dead {
            let player = context.player(event.target_id);
            for stats in player.both() {
                stats.touch(event.time_ticks, is_npc);
                stats.record_death();
            }
        }
    }
}
