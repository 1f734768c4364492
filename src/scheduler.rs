//! Render-side timer engine.
//!
//! Drives the render-task pollers at fixed rates. The render loop calls
//! [`RenderScheduler::tick`] with the milliseconds elapsed since the last
//! call; the scheduler notifies a [`TimerDelegate`] for every timer that came
//! due. It knows nothing about frames, moods or channels.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Render loop (core 0)                     │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ FrameTick │  │ MoodPoll  │  │ Advisory  │  │Telemetry │   │
//! │  │  10 s     │  │  100 ms   │  │ Poll 500ms│  │  30 s    │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │              │              │              │        │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                   TimerDelegate                        │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │        RenderCore.tick_frame_consumer / poll_* / publish     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each timer fires at most once per `tick`. A long stall does not cause a
//! burst of catch-up fires; the overdue remainder is dropped.

use log::info;

use crate::app::ports::{RenderTimer, TimerDelegate};
use crate::config::SystemConfig;

// ═══════════════════════════════════════════════════════════════
//  Timer entries
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    timer: RenderTimer,
    interval_ms: u32,
    elapsed_ms: u32,
    enabled: bool,
}

const TIMER_COUNT: usize = 4;

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct RenderScheduler {
    timers: [TimerEntry; TIMER_COUNT],
}

impl RenderScheduler {
    pub fn new(config: &SystemConfig) -> Self {
        let entry = |timer, interval_ms| TimerEntry {
            timer,
            interval_ms,
            elapsed_ms: 0,
            enabled: true,
        };
        Self {
            // Fire order within one tick: results first, then the frame.
            timers: [
                entry(RenderTimer::MoodPoll, config.mood_poll_interval_ms),
                entry(RenderTimer::AdvisoryPoll, config.advisory_poll_interval_ms),
                entry(RenderTimer::FrameTick, config.frame_tick_interval_ms),
                entry(
                    RenderTimer::Telemetry,
                    config.telemetry_interval_secs.saturating_mul(1000),
                ),
            ],
        }
    }

    fn entry_mut(&mut self, timer: RenderTimer) -> Option<&mut TimerEntry> {
        self.timers.iter_mut().find(|e| e.timer == timer)
    }

    /// Enable or disable one timer. A re-enabled timer starts a fresh period.
    pub fn set_enabled(&mut self, timer: RenderTimer, enabled: bool) {
        if let Some(e) = self.entry_mut(timer) {
            if enabled && !e.enabled {
                e.elapsed_ms = 0;
            }
            e.enabled = enabled;
            info!("Scheduler: {:?} {}", timer, if enabled { "enabled" } else { "disabled" });
        }
    }

    /// Change a timer's period. Takes effect from the next tick.
    pub fn set_interval(&mut self, timer: RenderTimer, interval_ms: u32) {
        if let Some(e) = self.entry_mut(timer) {
            e.interval_ms = interval_ms.max(1);
        }
    }

    /// Apply the timer fields of a reloaded configuration.
    pub fn reconfigure(&mut self, config: &SystemConfig) {
        self.set_interval(RenderTimer::MoodPoll, config.mood_poll_interval_ms);
        self.set_interval(RenderTimer::AdvisoryPoll, config.advisory_poll_interval_ms);
        self.set_interval(RenderTimer::FrameTick, config.frame_tick_interval_ms);
        self.set_interval(
            RenderTimer::Telemetry,
            config.telemetry_interval_secs.saturating_mul(1000),
        );
    }

    /// Advance every enabled timer by `elapsed_ms` and notify `delegate`
    /// for the ones that came due.
    pub fn tick(&mut self, elapsed_ms: u32, delegate: &mut dyn TimerDelegate) {
        for entry in &mut self.timers {
            if !entry.enabled {
                continue;
            }
            entry.elapsed_ms = entry.elapsed_ms.saturating_add(elapsed_ms);
            if entry.elapsed_ms >= entry.interval_ms {
                entry.elapsed_ms = (entry.elapsed_ms - entry.interval_ms) % entry.interval_ms.max(1);
                delegate.on_timer(entry.timer);
            }
        }
    }

    /// Milliseconds until the next enabled timer is due. The render loop
    /// sleeps at most this long.
    pub fn next_due_ms(&self) -> u32 {
        self.timers
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.interval_ms.saturating_sub(e.elapsed_ms))
            .min()
            .unwrap_or(u32::MAX)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
