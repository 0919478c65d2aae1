use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::context::ConfigError;
use crate::sync::{lock, read, write};

use super::{DpsDataPoint, SampleManager};

pub(super) fn validate_capacity(capacity: Option<usize>) -> Result<(), ConfigError> {
    match capacity {
        Some(0) => Err(ConfigError::InvalidSampleCapacity { capacity: 0 }),
        _ => Ok(()),
    }
}

#[derive(Debug)]
struct CachedSamples {
    version: u64,
    samples: Arc<[DpsDataPoint]>,
}

/// Fixed-capacity FIFO rate series.
///
/// `samples()` reuses the previous copy while no write happened since it was
/// built. The version counter only moves under the buffer's write lock, so a
/// cache hit always reflects the buffer the reader observed.
#[derive(Debug)]
pub struct TimeSeriesSampleManager {
    capacity: Option<usize>,
    buffer: RwLock<VecDeque<DpsDataPoint>>,
    version: AtomicU64,
    cache: Mutex<Option<CachedSamples>>,
}

impl Default for TimeSeriesSampleManager {
    fn default() -> Self {
        Self::with_valid_capacity(Some(meter_types::DEFAULT_SAMPLE_CAPACITY))
    }
}

impl TimeSeriesSampleManager {
    /// `None` keeps every sample. `Some(0)` is rejected.
    pub fn new(capacity: Option<usize>) -> Result<Self, ConfigError> {
        validate_capacity(capacity)?;
        Ok(Self::with_valid_capacity(capacity))
    }

    pub(super) fn with_valid_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            buffer: RwLock::new(VecDeque::with_capacity(capacity.unwrap_or(0).min(1024))),
            version: AtomicU64::new(0),
            cache: Mutex::new(None),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Write counter; bumps on every mutation
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl SampleManager for TimeSeriesSampleManager {
    fn add_sample(&self, point: DpsDataPoint) {
        let mut buffer = write(&self.buffer);
        buffer.push_back(point);
        if let Some(capacity) = self.capacity {
            while buffer.len() > capacity {
                buffer.pop_front();
            }
        }
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    fn samples(&self) -> Arc<[DpsDataPoint]> {
        let buffer = read(&self.buffer);
        let version = self.version.load(Ordering::Acquire);

        let mut cache = lock(&self.cache);
        if let Some(cached) = cache.as_ref()
            && cached.version == version
        {
            return Arc::clone(&cached.samples);
        }

        let samples: Arc<[DpsDataPoint]> = buffer.iter().copied().collect();
        *cache = Some(CachedSamples {
            version,
            samples: Arc::clone(&samples),
        });
        samples
    }

    fn len(&self) -> usize {
        read(&self.buffer).len()
    }

    fn clear(&self) {
        let mut buffer = write(&self.buffer);
        buffer.clear();
        lock(&self.cache).take();
        self.version.store(0, Ordering::Release);
    }
}
