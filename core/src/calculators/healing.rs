use meter_types::MetricKind;

use crate::battle_log::BattleLogEvent;
use crate::context::StatisticsContext;

use super::{StatisticCalculator, accumulate, is_countable};

/// Healing done, attributed to the healer (the event's attacker side).
#[derive(Debug, Clone, Copy, Default)]
pub struct HealingCalculator;

impl StatisticCalculator for HealingCalculator {
    fn name(&self) -> &'static str {
        "healing"
    }

    fn calculate(&self, event: &BattleLogEvent, context: &StatisticsContext) {
        if !event.is_heal || !is_countable(event) {
            return;
        }
        accumulate(
            context,
            event.attacker_id,
            !event.is_attacker_entity_a,
            MetricKind::Healing,
            event,
        );
    }
}
