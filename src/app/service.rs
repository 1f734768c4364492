//! Render core: the render-task half of the coordination system.
//!
//! [`RenderCore`] owns the frame consumer, the current parameter snapshot,
//! the latest mood result and the advisory cache. Every method is
//! non-blocking: it only uses `try_*` operations on the coordinator links.
//! All I/O flows through port traits passed in at call sites, making the
//! whole render side testable with mock adapters.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!   EventLog  ◀──────│          RenderCore          │──────▶ EventSink
//!                    │  snapshot · mood · advice    │
//!   FrameSink ◀──────│  FrameConsumer · limiter     │
//!                    └──────────────┬───────────────┘
//!                                   │ CoordLinks
//!                 mood task ◀───────┼───────▶ net task
//!                                   ▼
//!                             storage task
//! ```

use std::sync::Arc;

use embassy_sync::channel::TrySendError;
use log::{debug, info, warn};

use crate::advisory::local::local_advice;
use crate::advisory::quota::QuotaLimits;
use crate::advisory::{AdviceText, AdvisoryRequest, AdvisoryResult};
use crate::config::SystemConfig;
use crate::coord::channels::CoordLinks;
use crate::diagnostics::CoordinatorStats;
use crate::frames::FrameReader;
use crate::frames::consumer::{FrameConsumer, TickOutcome};
use crate::mood::{self, MoodCategory, MoodResult, ParameterSnapshot};

use super::commands::AppCommand;
use super::events::{AppEvent, CareEvent, TelemetrySnapshot};
use super::ports::{
    ConfigError, ConfigPort, EventLog, EventSink, FrameSink, RenderTimer, TimerDelegate,
};

/// What [`RenderCore::request_advisory`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryDispatch {
    /// Handed to the network task; the answer arrives via
    /// [`RenderCore::poll_advisory_result`].
    Sent,
    /// Refused by the minimum-interval gate.
    Throttled { retry_in_secs: u64 },
    /// Urgent: answered immediately from rule-engine output.
    AnsweredLocally,
}

// ───────────────────────────────────────────────────────────────
// RenderCore
// ───────────────────────────────────────────────────────────────

pub struct RenderCore {
    config: SystemConfig,
    links: Arc<CoordLinks>,
    frames: FrameConsumer,
    snapshot: ParameterSnapshot,
    /// Snapshot that did not fit into the mood channel yet.
    pending_snapshot: Option<ParameterSnapshot>,
    last_result: Option<MoodResult>,
    advice: AdviceText,
    last_advisory_success: Option<u64>,
    stats: Arc<CoordinatorStats>,
}

impl RenderCore {
    /// Build the render core. The initial snapshot assumes a freshly fed,
    /// freshly cleaned tank at `now` with neutral water readings.
    pub fn new(
        config: SystemConfig,
        links: Arc<CoordLinks>,
        reader: FrameReader,
        stats: Arc<CoordinatorStats>,
        now: u64,
    ) -> Self {
        let frames = FrameConsumer::new(reader, &config, Arc::clone(&stats));
        let snapshot = ParameterSnapshot {
            ammonia_ppm: 0.0,
            nitrite_ppm: 0.0,
            nitrate_ppm: 0.0,
            ph: 7.0,
            last_feed_secs: now,
            last_water_change_secs: now,
            feed_interval_secs: config.feed_interval_secs,
            water_change_interval_secs: config.water_change_interval_secs,
        };
        Self {
            config,
            links,
            frames,
            snapshot,
            pending_snapshot: None,
            last_result: None,
            advice: AdviceText::new(),
            last_advisory_success: None,
            stats,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Request the first frame and submit the initial snapshot.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.frames.prime(&self.links.frame_requests);
        self.submit_snapshot(self.snapshot);
        sink.emit(&AppEvent::Started(self.frames.category()));
        info!("RenderCore started in {}", self.frames.category().label());
    }

    // ── Mood ──────────────────────────────────────────────────

    /// Replace the current snapshot, log the reading and queue it for
    /// evaluation.
    pub fn set_parameters(&mut self, snapshot: ParameterSnapshot, now: u64, log: &mut impl EventLog) {
        self.snapshot = snapshot;
        Self::append(
            log,
            CareEvent::ParameterReading {
                at_secs: now,
                ammonia_ppm: snapshot.ammonia_ppm,
                nitrite_ppm: snapshot.nitrite_ppm,
                nitrate_ppm: snapshot.nitrate_ppm,
                ph: snapshot.ph,
            },
        );
        self.submit_snapshot(snapshot);
    }

    /// Drain the mood-result channel and apply the newest result.
    ///
    /// A category change re-primes the frame pipeline and triggers an
    /// advisory request (urgent when a factor is critical).
    pub fn poll_mood_result(&mut self, now: u64, sink: &mut impl EventSink) -> Option<MoodResult> {
        let mut latest = None;
        while let Ok(result) = self.links.mood_results.try_receive() {
            latest = Some(result);
        }

        if let Some(pending) = self.pending_snapshot.take() {
            self.submit_snapshot(pending);
        }

        let result = latest?;
        let previous = self.frames.category();
        self.last_result = Some(result.clone());

        if result.category != previous {
            info!(
                "MOOD: {} -> {} (total {}): {}",
                previous.label(),
                result.category.label(),
                result.total,
                result.reason
            );
            self.set_mood_category(result.category);
            sink.emit(&AppEvent::MoodChanged {
                from: previous,
                to: result.category,
                total: result.total,
            });
            self.request_advisory(result.is_critical(), now, sink);
        }
        Some(result)
    }

    /// Switch the displayed category. Always invalidates both frame buffers.
    pub fn set_mood_category(&mut self, category: MoodCategory) {
        self.frames.set_category(category, &self.links.frame_requests);
    }

    fn submit_snapshot(&mut self, snapshot: ParameterSnapshot) {
        match self.links.snapshots.try_send(snapshot) {
            Ok(()) => self.pending_snapshot = None,
            Err(TrySendError::Full(s)) => {
                debug!("MOOD: snapshot channel full, retrying on next poll");
                self.pending_snapshot = Some(s);
            }
        }
    }

    // ── Frames ────────────────────────────────────────────────

    pub fn tick_frame_consumer(
        &mut self,
        display: &mut impl FrameSink,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        let outcome = self.frames.tick(display, &self.links.frame_requests);
        if let TickOutcome::Shown { index, descriptor } = outcome {
            sink.emit(&AppEvent::FrameShown { index, descriptor });
        }
        outcome
    }

    // ── Advisory ──────────────────────────────────────────────

    /// Ask for advice.
    ///
    /// Urgent requests are answered here from the rule engine and never
    /// reach the network. Non-urgent requests are refused while less than
    /// `advisory_min_interval_secs` have passed since the last successful
    /// remote answer.
    pub fn request_advisory(
        &mut self,
        urgent: bool,
        now: u64,
        sink: &mut impl EventSink,
    ) -> AdvisoryDispatch {
        if urgent {
            let result = mood::evaluate(&self.snapshot, now);
            info!("ADVISORY: urgent request answered locally ({})", result.reason);
            self.apply_advisory(local_advice(&result), true, now, sink);
            return AdvisoryDispatch::AnsweredLocally;
        }

        if let Some(last) = self.last_advisory_success {
            let since = now.saturating_sub(last);
            let min = u64::from(self.config.advisory_min_interval_secs);
            if since < min {
                let retry_in_secs = min - since;
                debug!("ADVISORY: throttled, next request allowed in {}s", retry_in_secs);
                sink.emit(&AppEvent::AdvisoryThrottled { retry_in_secs });
                return AdvisoryDispatch::Throttled { retry_in_secs };
            }
        }

        let request = AdvisoryRequest::from_snapshot(&self.snapshot, self.frames.category(), now);
        self.links.advisory_requests.signal(request);
        AdvisoryDispatch::Sent
    }

    /// Apply a pending advisory result, if any.
    pub fn poll_advisory_result(&mut self, now: u64, sink: &mut impl EventSink) -> Option<AdvisoryResult> {
        let result = self.links.advisory_results.try_take()?;
        self.apply_advisory(result.clone(), false, now, sink);
        Some(result)
    }

    fn apply_advisory(
        &mut self,
        result: AdvisoryResult,
        local: bool,
        now: u64,
        sink: &mut impl EventSink,
    ) {
        if result.success && !local {
            self.last_advisory_success = Some(now);
        }
        sink.emit(&AppEvent::AdvisoryApplied {
            success: result.success,
            local,
        });
        self.advice = result.text;
    }

    // ── Care events ───────────────────────────────────────────

    pub fn record_feed(&mut self, now: u64, log: &mut impl EventLog) {
        self.snapshot.last_feed_secs = now;
        Self::append(log, CareEvent::Fed { at_secs: now });
        self.submit_snapshot(self.snapshot);
    }

    pub fn record_water_change(&mut self, now: u64, log: &mut impl EventLog) {
        self.snapshot.last_water_change_secs = now;
        Self::append(log, CareEvent::WaterChanged { at_secs: now });
        self.submit_snapshot(self.snapshot);
    }

    fn append(log: &mut impl EventLog, event: CareEvent) {
        if let Err(e) = log.append(&event) {
            warn!("LOG: failed to append {} record: {}", event.kind(), e);
        }
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Hand a dashboard snapshot to the network task.
    pub fn publish_telemetry(&mut self, now: u64, sink: &mut impl EventSink) -> TelemetrySnapshot {
        let snapshot = self.build_telemetry(now);
        self.links.telemetry.signal(snapshot.clone());
        sink.emit(&AppEvent::TelemetryPublished(snapshot.clone()));
        snapshot
    }

    pub fn build_telemetry(&self, now: u64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            ammonia_ppm: self.snapshot.ammonia_ppm,
            nitrite_ppm: self.snapshot.nitrite_ppm,
            nitrate_ppm: self.snapshot.nitrate_ppm,
            ph: self.snapshot.ph,
            hours_since_feed: self.snapshot.hours_since_feed(now),
            days_since_water_change: self.snapshot.days_since_water_change(now),
            mood: self.frames.category(),
            advice: self.advice.clone(),
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a command from the UI layer. Returns `true` when the
    /// command replaced the configuration.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now: u64,
        log: &mut impl EventLog,
        sink: &mut impl EventSink,
    ) -> bool {
        match cmd {
            AppCommand::SetParameters(snapshot) => self.set_parameters(snapshot, now, log),
            AppCommand::RecordFeed => self.record_feed(now, log),
            AppCommand::RecordWaterChange => self.record_water_change(now, log),
            AppCommand::RequestAdvisory { urgent } => {
                self.request_advisory(urgent, now, sink);
            }
            AppCommand::UpdateConfig(new_config) => return self.update_config(new_config),
        }
        false
    }

    /// Apply a runtime configuration change. Frame geometry is fixed at
    /// boot because the buffers are already allocated. The quota cooldown
    /// settings are forwarded to the network task.
    fn update_config(&mut self, new_config: SystemConfig) -> bool {
        if let Err(msg) = new_config.validate() {
            warn!("Config update rejected: {}", msg);
            return false;
        }
        let geometry_changed = new_config.frame_width != self.config.frame_width
            || new_config.frame_height != self.config.frame_height
            || new_config.frames_per_category != self.config.frames_per_category
            || new_config.swap_rgb565_bytes != self.config.swap_rgb565_bytes;
        if geometry_changed {
            warn!("Config update: frame geometry changes apply after restart");
        }
        self.config = SystemConfig {
            frame_width: self.config.frame_width,
            frame_height: self.config.frame_height,
            frames_per_category: self.config.frames_per_category,
            swap_rgb565_bytes: self.config.swap_rgb565_bytes,
            ..new_config
        };
        self.links
            .quota_limits
            .signal(QuotaLimits::from_config(&self.config));
        info!("Configuration updated at runtime");
        true
    }

    /// Write the active configuration to persistent storage.
    pub fn persist_config(&self, store: &impl ConfigPort) -> Result<(), ConfigError> {
        match store.save(&self.config) {
            Ok(()) => {
                info!("Configuration saved");
                Ok(())
            }
            Err(e) => {
                warn!("Configuration not saved: {}", e);
                Err(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn category(&self) -> MoodCategory {
        self.frames.category()
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    pub fn last_result(&self) -> Option<&MoodResult> {
        self.last_result.as_ref()
    }

    /// Advisory text currently on screen.
    pub fn advice(&self) -> &str {
        self.advice.as_str()
    }

    pub fn frames(&self) -> &FrameConsumer {
        &self.frames
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn has_pending_snapshot(&self) -> bool {
        self.pending_snapshot.is_some()
    }

    pub fn stats(&self) -> &CoordinatorStats {
        &self.stats
    }
}

// ───────────────────────────────────────────────────────────────
// Timer glue
// ───────────────────────────────────────────────────────────────

/// Binds a [`RenderCore`] to its render-side ports for one scheduler tick.
pub struct RenderDriver<'a, D, E> {
    pub core: &'a mut RenderCore,
    pub display: &'a mut D,
    pub events: &'a mut E,
    /// Seconds since boot at this tick.
    pub now: u64,
}

impl<D: FrameSink, E: EventSink> TimerDelegate for RenderDriver<'_, D, E> {
    fn on_timer(&mut self, timer: RenderTimer) {
        match timer {
            RenderTimer::FrameTick => {
                self.core.tick_frame_consumer(self.display, self.events);
            }
            RenderTimer::MoodPoll => {
                self.core.poll_mood_result(self.now, self.events);
            }
            RenderTimer::AdvisoryPoll => {
                self.core.poll_advisory_result(self.now, self.events);
            }
            RenderTimer::Telemetry => {
                self.core.publish_telemetry(self.now, self.events);
            }
        }
    }
}
