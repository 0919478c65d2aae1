mod background_tasks;
mod config;
mod error;
mod statistics;

pub use background_tasks::BackgroundTasks;
pub use config::{SampleRetention, StatisticsConfig, StatisticsConfigExt};
pub use error::{ConfigError, EngineError};
pub use statistics::{Scope, ScopedPlayer, StatisticsContext, StatisticsMap};
