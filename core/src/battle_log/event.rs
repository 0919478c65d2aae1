use serde::{Deserialize, Serialize};

/// Entity identifier as reported by the decoder
pub type EntityId = i64;

/// Event timestamps are 100 ns ticks.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

pub fn ticks_to_secs(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

pub fn secs_to_ticks(secs: f64) -> i64 {
    (secs * TICKS_PER_SECOND as f64).round() as i64
}

/// Outcome bucket of a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitKind {
    #[default]
    Normal,
    Critical,
    Lucky,
    /// Both flags set. Takes precedence over either one alone.
    CriticalLucky,
}

/// One decoded battle log entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleLogEvent {
    pub sequence_id: u64,
    pub time_ticks: i64,
    pub skill_id: i64,
    pub attacker_id: EntityId,
    pub target_id: EntityId,
    pub value: i64,
    pub element_type: i32,
    pub source_type: i32,
    /// Attacker is an "A" entity (a player character)
    pub is_attacker_entity_a: bool,
    /// Target is an "A" entity (a player character)
    pub is_target_entity_a: bool,
    pub is_lucky: bool,
    pub is_critical: bool,
    pub is_heal: bool,
    pub is_miss: bool,
    pub is_dead: bool,
}

impl BattleLogEvent {
    pub fn hit_kind(&self) -> HitKind {
        match (self.is_critical, self.is_lucky) {
            (true, true) => HitKind::CriticalLucky,
            (true, false) => HitKind::Critical,
            (false, true) => HitKind::Lucky,
            (false, false) => HitKind::Normal,
        }
    }

    /// True if the entity is either side of the event
    pub fn involves(&self, entity: EntityId) -> bool {
        self.attacker_id == entity || self.target_id == entity
    }

    pub fn time_secs(&self) -> f64 {
        ticks_to_secs(self.time_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crit_and_lucky_takes_precedence() {
        let event = BattleLogEvent {
            is_critical: true,
            is_lucky: true,
            ..Default::default()
        };
        assert_eq!(event.hit_kind(), HitKind::CriticalLucky);

        let crit = BattleLogEvent {
            is_critical: true,
            ..Default::default()
        };
        assert_eq!(crit.hit_kind(), HitKind::Critical);
        assert_eq!(BattleLogEvent::default().hit_kind(), HitKind::Normal);
    }

    #[test]
    fn tick_conversion() {
        assert_eq!(secs_to_ticks(1.5), 15_000_000);
        assert_eq!(ticks_to_secs(TICKS_PER_SECOND * 3), 3.0);
    }

    #[test]
    fn deserializes_partial_json_line() {
        let line = r#"{"attacker_id": 1, "target_id": 2, "value": 100, "is_critical": true}"#;
        let event: BattleLogEvent = serde_json::from_str(line).expect("valid event line");
        assert_eq!(event.attacker_id, 1);
        assert_eq!(event.value, 100);
        assert!(!event.is_heal);
        assert!(event.involves(2));
        assert!(!event.involves(3));
    }
}
