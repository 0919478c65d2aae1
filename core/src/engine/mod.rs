//! Real-time statistics engine.
//!
//! The decoder thread calls [`StatisticsEngine::record_event`]; UI threads
//! read snapshots; two optional tokio tasks drive section timeouts and
//! delta-rate sampling. The engine is a cheap handle: clones share one state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use meter_types::PlayerSummary;
use tokio::time::{Instant, MissedTickBehavior};

use crate::battle_log::{BattleLogEvent, EntityId};
use crate::calculators::{StatisticCalculator, default_calculators};
use crate::context::{
    BackgroundTasks, ConfigError, EngineError, Scope, StatisticsConfig, StatisticsConfigExt,
    StatisticsContext, StatisticsMap,
};
use crate::samples::SamplePolicy;
use crate::signal_processor::handler::panic_message;
use crate::signal_processor::{
    EngineSignal, HandlerError, SectionLifecycleManager, SectionRollover, SectionState, SignalBus,
    SignalHandler, SignalKind, SubscriptionId,
};
use crate::statistics::PlayerStatistics;
use crate::sync::{lock, read, write};


struct EngineInner {
    config: StatisticsConfig,
    context: StatisticsContext,
    calculators: RwLock<Vec<Box<dyn StatisticCalculator>>>,
    section: SectionLifecycleManager,
    signals: SignalBus,
    tasks: Mutex<BackgroundTasks>,
    /// Serializes event processing with timeout rollovers
    write_gate: Mutex<()>,
    /// Held for a whole delta-sampling tick; dispose waits on it
    sample_gate: Mutex<()>,
    disposed: AtomicBool,
    started_at: Instant,
}

/// Handle to a statistics engine.
#[derive(Clone)]
pub struct StatisticsEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for StatisticsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsEngine")
            .field("section_state", &self.section_state())
            .field("full_entities", &self.get_statistics_count(true))
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl StatisticsEngine {
    /// Engine with the attack-damage, taken-damage and healing calculators
    pub fn new(config: StatisticsConfig) -> Result<Self, ConfigError> {
        Self::with_calculators(config, default_calculators())
    }

    pub fn with_calculators(
        config: StatisticsConfig,
        calculators: Vec<Box<dyn StatisticCalculator>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = SamplePolicy::from_config(&config)?;

        tracing::debug!(
            section_timeout_secs = config.section_timeout_secs,
            retention = ?config.retention,
            sample_capacity = ?config.sample_capacity,
            calculators = calculators.len(),
            "Statistics engine created"
        );

        let inner = EngineInner {
            section: SectionLifecycleManager::new(config.section_timeout()),
            context: StatisticsContext::new(policy),
            calculators: RwLock::new(calculators),
            signals: SignalBus::new(),
            tasks: Mutex::new(BackgroundTasks::default()),
            write_gate: Mutex::new(()),
            sample_gate: Mutex::new(()),
            disposed: AtomicBool::new(false),
            started_at: Instant::now(),
            config,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &StatisticsConfig {
        &self.inner.config
    }

    /// Direct read access to both scopes
    pub fn context(&self) -> &StatisticsContext {
        &self.inner.context
    }

    pub fn register_calculator(&self, calculator: Box<dyn StatisticCalculator>) {
        tracing::debug!(calculator = calculator.name(), "Calculator registered");
        write(&self.inner.calculators).push(calculator);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ingestion
    // ═══════════════════════════════════════════════════════════════════════

    /// Record one decoded event. Never fails from the caller's point of view:
    /// internal failures are logged and the next event is processed normally.
    pub fn record_event(&self, event: BattleLogEvent) {
        if self.is_disposed() {
            tracing::debug!(sequence_id = event.sequence_id, "Event dropped, engine disposed");
            return;
        }
        let _gate = lock(&self.inner.write_gate);
        self.inner.process_event(event);
    }

    pub fn record_events<I>(&self, events: I)
    where
        I: IntoIterator<Item = BattleLogEvent>,
    {
        for event in events {
            self.record_event(event);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Snapshots
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get_statistics(&self, full: bool) -> StatisticsMap {
        self.inner.context.statistics(Scope::from_full(full))
    }

    pub fn get_player(&self, entity_id: EntityId, full: bool) -> Option<Arc<PlayerStatistics>> {
        self.inner.context.get(Scope::from_full(full), entity_id)
    }

    pub fn get_battle_logs(&self, full: bool) -> Vec<Arc<BattleLogEvent>> {
        self.inner.context.battle_logs(Scope::from_full(full))
    }

    pub fn get_battle_logs_for(&self, entity_id: EntityId, full: bool) -> Vec<Arc<BattleLogEvent>> {
        self.inner
            .context
            .battle_logs_for(entity_id, Scope::from_full(full))
    }

    pub fn get_statistics_count(&self, full: bool) -> usize {
        self.inner.context.statistics_count(Scope::from_full(full))
    }

    /// Plain copies of every entity in a scope, sorted by entity id
    pub fn summaries(&self, full: bool) -> Vec<PlayerSummary> {
        let mut summaries: Vec<PlayerSummary> = self
            .get_statistics(full)
            .values()
            .map(|player| player.snapshot())
            .collect();
        summaries.sort_by_key(|s| s.entity_id);
        summaries
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sections
    // ═══════════════════════════════════════════════════════════════════════

    pub fn section_state(&self) -> SectionState {
        self.inner.section.state()
    }

    pub fn section_id(&self) -> u64 {
        self.inner.section.section_id()
    }

    /// Close the current section now, with the usual notifications
    pub fn reset_section(&self) {
        let _gate = lock(&self.inner.write_gate);
        let rollover = self.inner.section.manual_rollover();
        self.inner.roll_section(rollover);
    }

    /// Start a new section with the next recorded event
    pub fn force_new_section(&self) {
        self.inner.section.force_new_section();
    }

    /// Drop both scopes and return the section state machine to Idle
    pub fn clear_all(&self) {
        let _gate = lock(&self.inner.write_gate);
        self.inner.context.clear_all();
        self.inner.section.reset();
        tracing::info!("Statistics cleared");
    }

    /// One section timeout evaluation against the current time
    pub fn check_section_timeout(&self) -> bool {
        self.inner.check_section_timeout_at(Instant::now())
    }

    /// One section timeout evaluation against `now`
    pub fn check_section_timeout_at(&self, now: Instant) -> bool {
        self.inner.check_section_timeout_at(now)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rates
    // ═══════════════════════════════════════════════════════════════════════

    /// Delta-sampling tick over both scopes. `elapsed` is the host's time
    /// since sampling began and becomes the samples' time offset.
    /// Returns the number of samples appended.
    pub fn record_periodic_samples(&self, elapsed: Duration) -> usize {
        self.inner.record_periodic_samples(elapsed)
    }

    pub fn stop_delta_tracking(&self) {
        self.inner.for_each_player(|p| p.stop_delta_tracking());
    }

    pub fn resume_delta_tracking(&self) {
        self.inner.for_each_player(|p| p.resume_delta_tracking());
    }

    pub fn reset_delta_tracking(&self) {
        self.inner.for_each_player(|p| p.reset_delta_tracking());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Subscriptions
    // ═══════════════════════════════════════════════════════════════════════

    pub fn subscribe<H>(&self, handler: H) -> SubscriptionId
    where
        H: SignalHandler + 'static,
    {
        self.inner.signals.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.signals.unsubscribe(id)
    }

    /// Subscribe a closure to one kind of signal
    pub fn on<F>(&self, kind: SignalKind, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&EngineSignal, &StatisticsContext) + Send + 'static,
    {
        self.subscribe(
            move |signal: &EngineSignal, context: &StatisticsContext| -> Result<(), HandlerError> {
                if signal.kind() == kind {
                    callback(signal, context);
                }
                Ok(())
            },
        )
    }

    /// Fires with the closing section's data still in place
    pub fn on_before_section_cleared<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EngineSignal, &StatisticsContext) + Send + 'static,
    {
        self.on(SignalKind::BeforeSectionCleared, callback)
    }

    /// Fires after the section scope was cleared
    pub fn on_new_section_created<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EngineSignal, &StatisticsContext) + Send + 'static,
    {
        self.on(SignalKind::NewSectionCreated, callback)
    }

    pub fn on_battle_log_recorded<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EngineSignal, &StatisticsContext) + Send + 'static,
    {
        self.on(SignalKind::BattleLogRecorded, callback)
    }

    pub fn on_stats_updated<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EngineSignal, &StatisticsContext) + Send + 'static,
    {
        self.on(SignalKind::StatsUpdated, callback)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Background tasks
    // ═══════════════════════════════════════════════════════════════════════

    /// Spawn the section timeout monitor on the current tokio runtime.
    /// Starting an already running monitor is a no-op.
    pub fn start_section_monitor(&self) -> Result<(), EngineError> {
        let runtime = self.runtime()?;
        let mut tasks = lock(&self.inner.tasks);
        if tasks.section_monitor_running() {
            return Ok(());
        }

        let period = self.inner.config.section_check_interval();
        tasks.section_monitor = Some(runtime.spawn(run_periodic(
            Arc::downgrade(&self.inner),
            period,
            |inner| {
                inner.check_section_timeout_at(Instant::now());
            },
        )));
        tracing::debug!(period_ms = period.as_millis() as u64, "Section monitor started");
        Ok(())
    }

    pub fn stop_section_monitor(&self) -> bool {
        lock(&self.inner.tasks).stop_section_monitor()
    }

    /// Spawn the delta-sampling task on the current tokio runtime.
    /// Starting an already running sampler is a no-op.
    pub fn start_delta_sampling(&self) -> Result<(), EngineError> {
        let runtime = self.runtime()?;
        let mut tasks = lock(&self.inner.tasks);
        if tasks.delta_sampler_running() {
            return Ok(());
        }

        let period = self.inner.config.delta_interval();
        tasks.delta_sampler = Some(runtime.spawn(run_periodic(
            Arc::downgrade(&self.inner),
            period,
            |inner| {
                let elapsed = Instant::now().saturating_duration_since(inner.started_at);
                inner.record_periodic_samples(elapsed);
            },
        )));
        tracing::debug!(period_ms = period.as_millis() as u64, "Delta sampling started");
        Ok(())
    }

    pub fn stop_delta_sampling(&self) -> bool {
        lock(&self.inner.tasks).stop_delta_sampler()
    }

    pub fn is_section_monitor_running(&self) -> bool {
        lock(&self.inner.tasks).section_monitor_running()
    }

    pub fn is_delta_sampling_running(&self) -> bool {
        lock(&self.inner.tasks).delta_sampler_running()
    }

    fn runtime(&self) -> Result<tokio::runtime::Handle, EngineError> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        tokio::runtime::Handle::try_current().map_err(EngineError::NoRuntime)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Disposal
    // ═══════════════════════════════════════════════════════════════════════

    /// Stop both background tasks and drop subscribers. Later events, ticks
    /// and samples are ignored. Calling this more than once is harmless.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

/// Interval loop shared by both background tasks. Holds only a weak
/// reference, so a dropped engine ends the task on its next tick.
async fn run_periodic<F>(engine: Weak<EngineInner>, period: Duration, mut tick: F)
where
    F: FnMut(&EngineInner) + Send + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(inner) = engine.upgrade() else { break };
        if inner.disposed.load(Ordering::SeqCst) {
            break;
        }
        tick(&inner);
    }
}

impl EngineInner {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Caller holds the write gate
    fn process_event(&self, event: BattleLogEvent) {
        let resuming = self.section.state() == SectionState::TimedOut;
        if let Some(rollover) = self.section.on_event(event.time_ticks, Instant::now()) {
            self.roll_section(rollover);
        }
        if resuming {
            self.for_each_player(|p| p.resume_delta_tracking());
        }

        let event = self.context.record_log(event);
        self.signals.dispatch(
            &EngineSignal::BattleLogRecorded {
                event: Arc::clone(&event),
            },
            &self.context,
        );

        for calculator in read(&self.calculators).iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                calculator.calculate(&event, &self.context)
            }));
            if let Err(panic) = outcome {
                tracing::error!(
                    calculator = calculator.name(),
                    sequence_id = event.sequence_id,
                    panic = panic_message(panic.as_ref()),
                    "Calculator failed, event skipped for this metric"
                );
            }
        }

        self.signals.dispatch(
            &EngineSignal::StatsUpdated {
                sequence_id: event.sequence_id,
                time_ticks: event.time_ticks,
            },
            &self.context,
        );
    }

    /// BeforeSectionCleared (data still present), clear, NewSectionCreated.
    /// Caller holds the write gate.
    fn roll_section(&self, rollover: SectionRollover) {
        tracing::info!(
            closing_section = rollover.closing_id,
            reason = ?rollover.reason,
            entities = self.context.statistics_count(Scope::Section),
            "Section closed"
        );

        self.signals.dispatch(
            &EngineSignal::BeforeSectionCleared {
                section_id: rollover.closing_id,
                reason: rollover.reason,
                last_event_ticks: rollover.last_event_ticks,
            },
            &self.context,
        );

        self.context.reset_section();
        for calculator in read(&self.calculators).iter() {
            calculator.reset_section(&self.context);
        }

        self.signals.dispatch(
            &EngineSignal::NewSectionCreated {
                section_id: rollover.next_id,
                reason: rollover.reason,
            },
            &self.context,
        );
    }

    fn check_section_timeout_at(&self, now: Instant) -> bool {
        if self.is_disposed() {
            return false;
        }
        let _gate = lock(&self.write_gate);
        // Disposed while waiting for the gate
        if self.is_disposed() {
            return false;
        }
        let Some(rollover) = self.section.check_timeout(now) else {
            return false;
        };
        self.roll_section(rollover);
        // Hold the last burst rate while combat is paused
        for player in self.context.full_statistics().values() {
            player.stop_delta_tracking();
        }
        true
    }

    fn record_periodic_samples(&self, elapsed: Duration) -> usize {
        let _gate = lock(&self.sample_gate);
        if self.is_disposed() {
            return 0;
        }
        let mut appended = 0;
        for scope in [Scope::Full, Scope::Section] {
            for player in self.context.statistics(scope).values() {
                appended += player.update_delta_values(elapsed);
            }
        }
        tracing::trace!(elapsed_ms = elapsed.as_millis() as u64, appended, "Delta samples recorded");
        appended
    }

    fn for_each_player(&self, f: impl Fn(&PlayerStatistics)) {
        for scope in [Scope::Full, Scope::Section] {
            for player in self.context.statistics(scope).values() {
                f(player);
            }
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        lock(&self.tasks).abort_all();
        // Wait out a sampling tick already past its disposed check
        drop(lock(&self.sample_gate));
        self.signals.clear();
        tracing::info!("Statistics engine disposed");
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if !self.is_disposed() {
            self.disposed.store(true, Ordering::SeqCst);
            lock(&self.tasks).abort_all();
        }
    }
}
