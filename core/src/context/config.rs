//! Engine configuration
//!
//! This module re-exports the shared config type from meter-types and adds
//! validation and persistence on top of it.

use std::time::Duration;

pub use meter_types::{SampleRetention, StatisticsConfig};

use super::ConfigError;

const APP_NAME: &str = "meter";
const CONFIG_NAME: &str = "config";

/// Extension trait for StatisticsConfig persistence and validation
pub trait StatisticsConfigExt: Sized {
    /// Load from the platform config directory, creating defaults on first run
    fn load() -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn from_toml_str(content: &str) -> Result<Self, ConfigError>;
    fn to_toml_string(&self) -> Result<String, ConfigError>;
    /// Reject values the engine cannot run with
    fn validate(&self) -> Result<(), ConfigError>;
    fn section_timeout(&self) -> Duration;
    fn delta_interval(&self) -> Duration;
    fn section_check_interval(&self) -> Duration;
}

impl StatisticsConfigExt for StatisticsConfig {
    fn load() -> Result<Self, ConfigError> {
        let config: StatisticsConfig = confy::load(APP_NAME, CONFIG_NAME)?;
        config.validate()?;
        Ok(config)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self.clone()).map_err(ConfigError::Save)
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StatisticsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.section_timeout_secs.is_finite() || self.section_timeout_secs <= 0.0 {
            return Err(ConfigError::InvalidSectionTimeout {
                secs: self.section_timeout_secs,
            });
        }
        if let Some(0) = self.sample_capacity {
            return Err(ConfigError::InvalidSampleCapacity { capacity: 0 });
        }
        if self.delta_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "delta_interval_ms",
            });
        }
        if self.section_check_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "section_check_interval_ms",
            });
        }
        Ok(())
    }

    fn section_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.section_timeout_secs)
    }

    fn delta_interval(&self) -> Duration {
        Duration::from_millis(self.delta_interval_ms)
    }

    fn section_check_interval(&self) -> Duration {
        Duration::from_millis(self.section_check_interval_ms)
    }
}
