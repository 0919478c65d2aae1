//! Rate series retention.
//!
//! Each tracked metric owns one [`SampleManager`] that receives a
//! [`DpsDataPoint`] per delta-sampling tick. Two policies exist:
//! [`TimeSeriesSampleManager`] (fixed-capacity FIFO) and
//! [`AdaptiveSampleManager`] (multi-resolution tiers for long sessions).

mod adaptive;
mod bounded;

use std::fmt::Debug;
use std::sync::Arc;

use meter_types::{SampleRetention, StatisticsConfig};
use serde::{Deserialize, Serialize};

use crate::context::ConfigError;

pub use adaptive::AdaptiveSampleManager;
pub use bounded::TimeSeriesSampleManager;

/// One sample of a rate series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DpsDataPoint {
    /// Seconds since the host started sampling
    pub time_offset: f64,
    pub value: f64,
}

impl DpsDataPoint {
    pub fn new(time_offset: f64, value: f64) -> Self {
        Self { time_offset, value }
    }
}

/// Retention policy for one rate series.
///
/// Writers call [`add_sample`](Self::add_sample) from the sampling task while
/// readers call [`samples`](Self::samples) from a UI thread; implementations
/// must hand out a copy that is unaffected by later writes.
pub trait SampleManager: Send + Sync + Debug {
    fn add_sample(&self, point: DpsDataPoint);

    /// Point-in-time copy in chronological order
    fn samples(&self) -> Arc<[DpsDataPoint]>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

/// Validated retention settings used to build a series per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePolicy {
    retention: SampleRetention,
    capacity: Option<usize>,
}

impl Default for SamplePolicy {
    fn default() -> Self {
        Self {
            retention: SampleRetention::Bounded,
            capacity: Some(meter_types::DEFAULT_SAMPLE_CAPACITY),
        }
    }
}

impl SamplePolicy {
    pub fn bounded(capacity: Option<usize>) -> Result<Self, ConfigError> {
        bounded::validate_capacity(capacity)?;
        Ok(Self {
            retention: SampleRetention::Bounded,
            capacity,
        })
    }

    pub fn adaptive() -> Self {
        Self {
            retention: SampleRetention::Adaptive,
            capacity: None,
        }
    }

    pub fn from_config(config: &StatisticsConfig) -> Result<Self, ConfigError> {
        match config.retention {
            SampleRetention::Bounded => Self::bounded(config.sample_capacity),
            SampleRetention::Adaptive => Ok(Self::adaptive()),
        }
    }

    pub fn retention(&self) -> SampleRetention {
        self.retention
    }

    /// Build an empty series for one metric
    pub fn create(&self) -> Box<dyn SampleManager> {
        match self.retention {
            SampleRetention::Bounded => {
                Box::new(TimeSeriesSampleManager::with_valid_capacity(self.capacity))
            }
            SampleRetention::Adaptive => Box::new(AdaptiveSampleManager::new()),
        }
    }
}
