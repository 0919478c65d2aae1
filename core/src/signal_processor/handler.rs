use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::context::StatisticsContext;
use crate::sync::{lock, read, write};

use super::signal::EngineSignal;

/// Error a subscriber may return. It is logged and otherwise ignored.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for systems that react to engine signals.
/// Implement this for UI refreshers, persistence, section archivers, etc.
///
/// Handlers run synchronously on the thread that raised the signal (the
/// producer thread or a background task). They may read the context but must
/// not record events from inside a handler.
pub trait SignalHandler: Send {
    /// Handle a single signal with read access to the statistics
    fn handle_signal(
        &mut self,
        signal: &EngineSignal,
        context: &StatisticsContext,
    ) -> Result<(), HandlerError>;
}

impl<F> SignalHandler for F
where
    F: FnMut(&EngineSignal, &StatisticsContext) -> Result<(), HandlerError> + Send,
{
    fn handle_signal(
        &mut self,
        signal: &EngineSignal,
        context: &StatisticsContext,
    ) -> Result<(), HandlerError> {
        self(signal, context)
    }
}

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SharedHandler = Arc<Mutex<dyn SignalHandler>>;

/// Ordered subscriber list with isolated dispatch.
#[derive(Default)]
pub struct SignalBus {
    handlers: RwLock<Vec<(SubscriptionId, SharedHandler)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<H>(&self, handler: H) -> SubscriptionId
    where
        H: SignalHandler + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: SharedHandler = Arc::new(Mutex::new(handler));
        write(&self.handlers).push((id, handler));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = write(&self.handlers);
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        read(&self.handlers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        write(&self.handlers).clear();
    }

    /// Deliver `signal` to every subscriber in registration order.
    ///
    /// A subscriber that fails or panics is logged; the remaining subscribers
    /// still run. Returns the number of subscribers that failed.
    pub fn dispatch(&self, signal: &EngineSignal, context: &StatisticsContext) -> usize {
        // Copy the list so subscribers may (un)subscribe while being called
        let handlers: Vec<(SubscriptionId, SharedHandler)> = read(&self.handlers).clone();
        let mut failures = 0;

        for (id, handler) in handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                lock(&handler).handle_signal(signal, context)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    tracing::warn!(
                        subscriber = id.0,
                        signal = ?signal.kind(),
                        error = %err,
                        "Signal handler returned an error"
                    );
                }
                Err(panic) => {
                    failures += 1;
                    tracing::error!(
                        subscriber = id.0,
                        signal = ?signal.kind(),
                        panic = panic_message(panic.as_ref()),
                        "Signal handler panicked"
                    );
                }
            }
        }
        failures
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processor::SectionEndReason;

    fn new_section() -> EngineSignal {
        EngineSignal::NewSectionCreated {
            section_id: 1,
            reason: SectionEndReason::Manual,
        }
    }

    #[test]
    fn failing_subscribers_do_not_block_others() {
        let bus = SignalBus::new();
        let context = StatisticsContext::default();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&calls);
        bus.subscribe(move |_: &EngineSignal, _: &StatisticsContext| -> Result<(), HandlerError> {
            lock(&log).push("first");
            Err("boom".into())
        });
        bus.subscribe(|_: &EngineSignal, _: &StatisticsContext| -> Result<(), HandlerError> {
            panic!("subscriber exploded")
        });
        let log = Arc::clone(&calls);
        bus.subscribe(move |_: &EngineSignal, _: &StatisticsContext| -> Result<(), HandlerError> {
            lock(&log).push("third");
            Ok(())
        });

        let failures = bus.dispatch(&new_section(), &context);
        assert_eq!(failures, 2);
        assert_eq!(*lock(&calls), vec!["first", "third"]);

        // The panicking subscriber stays registered and keeps failing in isolation
        assert_eq!(bus.dispatch(&new_section(), &context), 2);
        assert_eq!(lock(&calls).len(), 4);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let bus = SignalBus::new();
        let id = bus.subscribe(|_: &EngineSignal, _: &StatisticsContext| -> Result<(), HandlerError> {
            Ok(())
        });
        assert_eq!(bus.len(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());
    }
}
