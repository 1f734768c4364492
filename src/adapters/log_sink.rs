//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! An on-screen status line would implement the same trait.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mood) => {
                info!("START | initial_mood={}", mood.label());
            }
            AppEvent::MoodChanged { from, to, total } => {
                info!("MOOD  | {} -> {} (total {:+})", from.label(), to.label(), total);
            }
            AppEvent::FrameShown { index, descriptor } => {
                debug!("FRAME | #{} via {:?}", index, descriptor);
            }
            AppEvent::AdvisoryApplied { success, local } => {
                info!(
                    "ADVICE| {} ({})",
                    if *success { "applied" } else { "failed" },
                    if *local { "local" } else { "remote" }
                );
            }
            AppEvent::AdvisoryThrottled { retry_in_secs } => {
                info!("ADVICE| throttled, retry in {}s", retry_in_secs);
            }
            AppEvent::TelemetryPublished(t) => {
                info!(
                    "TELEM | NH3={:.2} NO2={:.2} NO3={:.1} pH={:.2} | fed {:.1}h ago | \
                     cleaned {:.1}d ago | mood={}",
                    t.ammonia_ppm,
                    t.nitrite_ppm,
                    t.nitrate_ppm,
                    t.ph,
                    t.hours_since_feed,
                    t.days_since_water_change,
                    t.mood.label(),
                );
            }
        }
    }
}
