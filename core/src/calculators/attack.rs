use meter_types::MetricKind;

use crate::battle_log::BattleLogEvent;
use crate::context::StatisticsContext;

use super::{StatisticCalculator, accumulate, is_countable};

/// Damage dealt, attributed to the attacker.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackDamageCalculator;

impl StatisticCalculator for AttackDamageCalculator {
    fn name(&self) -> &'static str {
        "attack_damage"
    }

    fn calculate(&self, event: &BattleLogEvent, context: &StatisticsContext) {
        if event.is_heal || !is_countable(event) {
            return;
        }
        accumulate(
            context,
            event.attacker_id,
            !event.is_attacker_entity_a,
            MetricKind::AttackDamage,
            event,
        );
    }
}
