use std::sync::atomic::{AtomicU64, Ordering};

/// `f64` stored as its bit pattern so a reader never sees half a write.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn load_store_round_trip() {
        let value = AtomicF64::new(1.5);
        assert_eq!(value.load(), 1.5);
        value.store(-42.25);
        assert_eq!(value.load(), -42.25);
        assert_eq!(AtomicF64::default().load(), 0.0);
    }

    #[test]
    fn concurrent_reader_never_sees_torn_value() {
        let shared = Arc::new(AtomicF64::new(0.0));
        let writer = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    let v = if i % 2 == 0 { 1234.5678 } else { -9876.5432 };
                    shared.store(v);
                }
            })
        };
        for _ in 0..10_000 {
            let v = shared.load();
            assert!(v == 0.0 || v == 1234.5678 || v == -9876.5432);
        }
        writer.join().unwrap();
    }
}
