use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use meter_core::{
    BattleLogEvent, EngineSignal, StatisticsConfig, StatisticsConfigExt, StatisticsEngine,
    secs_to_ticks, ticks_to_secs,
};
use meter_types::PlayerSummary;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::report;

/// Sampling ticks replayed per event gap before skipping ahead
const MAX_CATCH_UP_SAMPLES: i64 = 3600;

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub config: StatisticsConfig,
    /// Report the whole session instead of the last section
    pub full: bool,
}

/// A section that closed during the replay
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub section_id: u64,
    pub reason: String,
    pub entities: usize,
    pub events: usize,
    pub last_event_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub events: usize,
    pub skipped_lines: usize,
    pub elapsed_ms: u128,
    pub sections: Vec<SectionReport>,
    pub players: Vec<PlayerSummary>,
}

/// Feed a JSON-lines event log through a fresh engine.
///
/// Delta samples are taken on log time, one per configured interval, so the
/// series match what a live session would have produced.
pub async fn replay(path: &Path, options: &ReplayOptions) -> Result<ReplayReport, String> {
    let started = Instant::now();
    let engine = StatisticsEngine::new(options.config.clone()).map_err(|e| e.to_string())?;

    let sections = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::clone(&sections);
    engine.on_before_section_cleared(move |signal, context| {
        if let EngineSignal::BeforeSectionCleared {
            section_id,
            reason,
            last_event_ticks,
        } = signal
        {
            closed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SectionReport {
                    section_id: *section_id,
                    reason: format!("{reason:?}"),
                    entities: context.section_statistics().len(),
                    events: context.section_battle_logs().len(),
                    last_event_secs: last_event_ticks.map(ticks_to_secs),
                });
        }
    });

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let sample_interval = secs_to_ticks(options.config.delta_interval().as_secs_f64()).max(1);
    let mut origin: Option<i64> = None;
    let mut next_sample = 0;
    let mut events = 0;
    let mut skipped_lines = 0;
    let mut line_no = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?
    {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: BattleLogEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                skipped_lines += 1;
                tracing::warn!(line = line_no, error = %err, "Skipping malformed event");
                continue;
            }
        };

        let origin = *origin.get_or_insert(event.time_ticks);
        let offset = event.time_ticks.saturating_sub(origin);
        // A long silence only needs the samples just before the event
        if offset.saturating_sub(next_sample) > sample_interval.saturating_mul(MAX_CATCH_UP_SAMPLES) {
            next_sample = offset - offset % sample_interval;
        }
        while offset >= next_sample {
            engine.record_periodic_samples(Duration::from_secs_f64(ticks_to_secs(next_sample)));
            match next_sample.checked_add(sample_interval) {
                Some(next) => next_sample = next,
                None => break,
            }
        }

        engine.record_event(event);
        events += 1;
    }

    let players = engine.summaries(options.full);
    engine.dispose();

    let sections = std::mem::take(&mut *sections.lock().unwrap_or_else(PoisonError::into_inner));
    tracing::info!(events, skipped_lines, sections = sections.len(), "Replay finished");

    Ok(ReplayReport {
        events,
        skipped_lines,
        elapsed_ms: started.elapsed().as_millis(),
        sections,
        players,
    })
}

pub fn print_replay(report: &ReplayReport, full: bool, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "replayed {} events in {}ms ({} skipped)",
        report.events, report.elapsed_ms, report.skipped_lines
    );
    report::print_sections(&report.sections);
    let scope = if full { "Session" } else { "Last section" };
    report::print_players(scope, &report.players);
    Ok(())
}

/// Print the effective configuration as TOML, optionally writing it back
pub fn show_config(save: bool) -> Result<(), String> {
    let config = StatisticsConfig::load().map_err(|e| e.to_string())?;
    if save {
        config.save().map_err(|e| e.to_string())?;
        tracing::info!("Configuration saved");
    }
    let out = config.to_toml_string().map_err(|e| e.to_string())?;
    print!("{out}");
    Ok(())
}
