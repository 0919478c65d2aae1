//! Shared types for the combat meter
//!
//! This crate contains serializable configuration and summary types that are
//! shared between the statistics engine (meter-core) and its hosts (meter-cli,
//! UI front-ends, persistence layers).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Metric Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Statistic category tracked per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    /// Damage dealt by the entity
    AttackDamage,
    /// Damage received by the entity
    TakenDamage,
    /// Healing done by the entity
    Healing,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::AttackDamage,
        MetricKind::TakenDamage,
        MetricKind::Healing,
    ];

    /// Stable slot index for per-metric arrays
    pub fn index(self) -> usize {
        match self {
            MetricKind::AttackDamage => 0,
            MetricKind::TakenDamage => 1,
            MetricKind::Healing => 2,
        }
    }

    /// Returns the display label for the rate column (DPS, DTPS, HPS)
    pub fn rate_label(self) -> &'static str {
        match self {
            MetricKind::AttackDamage => "DPS",
            MetricKind::TakenDamage => "DTPS",
            MetricKind::Healing => "HPS",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default number of samples kept per time series
pub const DEFAULT_SAMPLE_CAPACITY: usize = 300;
/// Default inactivity gap that closes a section
pub const DEFAULT_SECTION_TIMEOUT_SECS: f64 = 5.0;
/// Default cadence of the delta-rate sampling task
pub const DEFAULT_DELTA_INTERVAL_MS: u64 = 1000;
/// Default cadence of the section timeout monitor (1 Hz)
pub const DEFAULT_SECTION_CHECK_INTERVAL_MS: u64 = 1000;

/// Retention policy for per-metric rate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRetention {
    /// Fixed-capacity FIFO buffer (`sample_capacity`)
    #[default]
    Bounded,
    /// Multi-resolution tiers for very long sessions
    Adaptive,
}

/// Statistics engine configuration.
///
/// Values are validated eagerly by the engine constructor; an invalid value is
/// reported before any event is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Inactivity gap (seconds) after which the current section is closed
    #[serde(default = "default_section_timeout_secs")]
    pub section_timeout_secs: f64,

    /// Capacity of bounded rate series. `None` keeps every sample.
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: Option<usize>,

    #[serde(default)]
    pub retention: SampleRetention,

    /// Interval of the background delta-sampling task
    #[serde(default = "default_delta_interval_ms")]
    pub delta_interval_ms: u64,

    /// Interval of the background section timeout monitor
    #[serde(default = "default_section_check_interval_ms")]
    pub section_check_interval_ms: u64,
}

fn default_section_timeout_secs() -> f64 {
    DEFAULT_SECTION_TIMEOUT_SECS
}

fn default_sample_capacity() -> Option<usize> {
    Some(DEFAULT_SAMPLE_CAPACITY)
}

fn default_delta_interval_ms() -> u64 {
    DEFAULT_DELTA_INTERVAL_MS
}

fn default_section_check_interval_ms() -> u64 {
    DEFAULT_SECTION_CHECK_INTERVAL_MS
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            section_timeout_secs: DEFAULT_SECTION_TIMEOUT_SECS,
            sample_capacity: Some(DEFAULT_SAMPLE_CAPACITY),
            retention: SampleRetention::Bounded,
            delta_interval_ms: DEFAULT_DELTA_INTERVAL_MS,
            section_check_interval_ms: DEFAULT_SECTION_CHECK_INTERVAL_MS,
        }
    }
}

impl StatisticsConfig {
    /// Config with a custom section timeout and defaults elsewhere
    pub fn with_section_timeout(secs: f64) -> Self {
        Self {
            section_timeout_secs: secs,
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statistic Summaries (plain snapshots handed to UI / persistence)
// ─────────────────────────────────────────────────────────────────────────────

/// Point-in-time copy of one metric's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticSummary {
    pub total: i64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub crit_count: u64,
    pub lucky_count: u64,
    pub crit_and_lucky_count: u64,
    pub normal_value: i64,
    pub crit_value: i64,
    pub lucky_value: i64,
    pub crit_and_lucky_value: i64,
    pub max_value: i64,
    pub value_per_second: f64,
    pub delta_value_per_second: f64,
}

impl StatisticSummary {
    /// Share of hits that critted (crit-only and crit-and-lucky)
    pub fn crit_rate(&self) -> f64 {
        if self.hit_count == 0 {
            return 0.0;
        }
        (self.crit_count + self.crit_and_lucky_count) as f64 / self.hit_count as f64
    }

    /// Share of hits that were lucky (lucky-only and crit-and-lucky)
    pub fn lucky_rate(&self) -> f64 {
        if self.hit_count == 0 {
            return 0.0;
        }
        (self.lucky_count + self.crit_and_lucky_count) as f64 / self.hit_count as f64
    }
}

/// Per-skill breakdown row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSummary {
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

/// Plain copy of an entity's statistics in one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub entity_id: i64,
    pub is_npc: bool,
    pub start_tick: i64,
    pub last_tick: i64,
    pub death_count: u64,
    pub attack_damage: StatisticSummary,
    pub taken_damage: StatisticSummary,
    pub healing: StatisticSummary,
    /// Skill breakdowns keyed by metric, sorted by skill id
    #[serde(default)]
    pub skills: BTreeMap<MetricKind, Vec<SkillSummary>>,
}

impl PlayerSummary {
    pub fn metric(&self, kind: MetricKind) -> &StatisticSummary {
        match kind {
            MetricKind::AttackDamage => &self.attack_damage,
            MetricKind::TakenDamage => &self.taken_damage,
            MetricKind::Healing => &self.healing,
        }
    }
}
