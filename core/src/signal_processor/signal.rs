use std::sync::Arc;

use crate::battle_log::BattleLogEvent;

/// Why a section was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEndReason {
    /// The gap between two consecutive events exceeded the timeout
    EventGap,
    /// No event arrived within the timeout (monitor tick)
    IdleTimeout,
    /// `force_new_section` was armed before the event
    Forced,
    /// Host called `reset_section`
    Manual,
}

/// Signals emitted by the StatisticsEngine to subscribers.
#[derive(Debug, Clone)]
pub enum EngineSignal {
    /// An event was appended to both log lists (before aggregation)
    BattleLogRecorded { event: Arc<BattleLogEvent> },

    /// Calculators finished folding an event into the statistics
    StatsUpdated { sequence_id: u64, time_ticks: i64 },

    /// Section is about to be cleared. Section data is still populated.
    BeforeSectionCleared {
        section_id: u64,
        reason: SectionEndReason,
        /// Tick of the last event that belonged to the closing section
        last_event_ticks: Option<i64>,
    },

    /// Section data was cleared and a new section begins
    NewSectionCreated {
        section_id: u64,
        reason: SectionEndReason,
    },
}

/// Discriminant of [`EngineSignal`], used for typed subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    BattleLogRecorded,
    StatsUpdated,
    BeforeSectionCleared,
    NewSectionCreated,
}

impl EngineSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            EngineSignal::BattleLogRecorded { .. } => SignalKind::BattleLogRecorded,
            EngineSignal::StatsUpdated { .. } => SignalKind::StatsUpdated,
            EngineSignal::BeforeSectionCleared { .. } => SignalKind::BeforeSectionCleared,
            EngineSignal::NewSectionCreated { .. } => SignalKind::NewSectionCreated,
        }
    }
}
