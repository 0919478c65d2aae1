mod atomic;
mod delta;
mod player;
mod skill;
mod values;

pub use atomic::AtomicF64;
pub use delta::{DELTA_EPSILON_SECS, DeltaRateTracker, DeltaTracking};
pub use player::PlayerStatistics;
pub use skill::SkillStatistics;
pub use values::StatisticValues;
