//! Runtime diagnostics for the coordinator tasks.
//!
//! [`CoordinatorStats`] is a bag of relaxed atomic counters shared (behind an
//! `Arc`) by the storage task, the network task and the render core. Counters
//! only ever grow; [`CoordinatorStats::snapshot`] copies them into a plain
//! [`StatsSnapshot`] for logging or display.

use core::sync::atomic::{AtomicU32, Ordering};

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct CoordinatorStats {
    // Storage task
    pub frames_loaded: AtomicU32,
    pub frame_load_failures: AtomicU32,
    pub requests_dropped_busy: AtomicU32,
    pub requests_invalid: AtomicU32,
    pub requests_duplicate: AtomicU32,
    // Render side
    pub frames_shown: AtomicU32,
    pub frame_ticks_skipped: AtomicU32,
    pub stale_buffers_released: AtomicU32,
    pub mood_evaluations: AtomicU32,
    // Network task
    pub advisory_calls: AtomicU32,
    pub advisory_failures: AtomicU32,
    pub cooldown_refusals: AtomicU32,
    pub offline_refusals: AtomicU32,
    pub telemetry_pushes: AtomicU32,
    pub telemetry_failures: AtomicU32,
}

/// Plain copy of [`CoordinatorStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_loaded: u32,
    pub frame_load_failures: u32,
    pub requests_dropped_busy: u32,
    pub requests_invalid: u32,
    pub requests_duplicate: u32,
    pub frames_shown: u32,
    pub frame_ticks_skipped: u32,
    pub stale_buffers_released: u32,
    pub mood_evaluations: u32,
    pub advisory_calls: u32,
    pub advisory_failures: u32,
    pub cooldown_refusals: u32,
    pub offline_refusals: u32,
    pub telemetry_pushes: u32,
    pub telemetry_failures: u32,
}

impl CoordinatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment one counter.
    #[inline]
    pub fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU32| c.load(Ordering::Relaxed);
        StatsSnapshot {
            frames_loaded: get(&self.frames_loaded),
            frame_load_failures: get(&self.frame_load_failures),
            requests_dropped_busy: get(&self.requests_dropped_busy),
            requests_invalid: get(&self.requests_invalid),
            requests_duplicate: get(&self.requests_duplicate),
            frames_shown: get(&self.frames_shown),
            frame_ticks_skipped: get(&self.frame_ticks_skipped),
            stale_buffers_released: get(&self.stale_buffers_released),
            mood_evaluations: get(&self.mood_evaluations),
            advisory_calls: get(&self.advisory_calls),
            advisory_failures: get(&self.advisory_failures),
            cooldown_refusals: get(&self.cooldown_refusals),
            offline_refusals: get(&self.offline_refusals),
            telemetry_pushes: get(&self.telemetry_pushes),
            telemetry_failures: get(&self.telemetry_failures),
        }
    }

    /// One-line summary at info level.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            "DIAG | frames loaded={} failed={} busy={} invalid={} dup={} | \
             shown={} skipped={} stale={} | moods={} | \
             advisory calls={} failed={} cooldown={} offline={} | telem ok={} failed={}",
            s.frames_loaded,
            s.frame_load_failures,
            s.requests_dropped_busy,
            s.requests_invalid,
            s.requests_duplicate,
            s.frames_shown,
            s.frame_ticks_skipped,
            s.stale_buffers_released,
            s.mood_evaluations,
            s.advisory_calls,
            s.advisory_failures,
            s.cooldown_refusals,
            s.offline_refusals,
            s.telemetry_pushes,
            s.telemetry_failures,
        );
    }
}

impl StatsSnapshot {
    /// Frame requests the storage task did not turn into a ready buffer.
    pub fn frame_requests_lost(&self) -> u32 {
        self.frame_load_failures + self.requests_dropped_busy + self.requests_invalid
    }
}
