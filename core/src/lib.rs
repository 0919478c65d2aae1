pub mod battle_log;
pub mod calculators;
pub mod context;
pub mod engine;
pub mod samples;
pub mod signal_processor;
pub mod statistics;

pub(crate) mod sync;

// Re-exports for convenience
pub use battle_log::*;
pub use calculators::{StatisticCalculator, default_calculators};
pub use context::{
    ConfigError, EngineError, Scope, StatisticsConfig, StatisticsConfigExt, StatisticsContext,
    StatisticsMap,
};
pub use engine::StatisticsEngine;
pub use samples::{DpsDataPoint, SampleManager, SamplePolicy};
pub use signal_processor::{
    EngineSignal, HandlerError, SectionEndReason, SectionState, SignalHandler, SignalKind,
    SubscriptionId,
};
pub use statistics::{PlayerStatistics, SkillStatistics, StatisticValues};
