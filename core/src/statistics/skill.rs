use meter_types::SkillSummary;

use crate::battle_log::HitKind;

/// Per-skill accumulator. Lives inside a locked map on `PlayerStatistics`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillStatistics {
    pub skill_id: i64,
    pub total_value: i64,
    pub use_times: u64,
    pub crit_times: u64,
    pub crit_value: i64,
    pub lucky_times: u64,
    pub luck_value: i64,
    pub crit_and_lucky_times: u64,
    pub crit_and_lucky_value: i64,
}

impl SkillStatistics {
    pub fn new(skill_id: i64) -> Self {
        Self {
            skill_id,
            ..Default::default()
        }
    }

    pub fn record(&mut self, value: i64, kind: HitKind) {
        self.total_value += value;
        self.use_times += 1;
        match kind {
            HitKind::Normal => {}
            HitKind::Critical => {
                self.crit_times += 1;
                self.crit_value += value;
            }
            HitKind::Lucky => {
                self.lucky_times += 1;
                self.luck_value += value;
            }
            HitKind::CriticalLucky => {
                self.crit_and_lucky_times += 1;
                self.crit_and_lucky_value += value;
            }
        }
    }

    pub fn average(&self) -> f64 {
        if self.use_times == 0 {
            0.0
        } else {
            self.total_value as f64 / self.use_times as f64
        }
    }

    pub fn summary(&self) -> SkillSummary {
        SkillSummary {
            skill_id: self.skill_id,
            total_value: self.total_value,
            use_times: self.use_times,
            crit_times: self.crit_times,
            crit_value: self.crit_value,
            lucky_times: self.lucky_times,
            luck_value: self.luck_value,
            crit_and_lucky_times: self.crit_and_lucky_times,
            crit_and_lucky_value: self.crit_and_lucky_value,
        }
    }
}
