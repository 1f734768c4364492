//! Advisory requests and results.
//!
//! The render task asks for advice with an [`AdvisoryRequest`]; the network
//! task answers with an [`AdvisoryResult`]. Urgent requests never leave the
//! render task: they are answered from rule-engine output by
//! [`local::local_advice`].

pub mod local;
pub mod net_task;
pub mod prompt;
pub mod quota;

use crate::mood::{MoodCategory, ParameterSnapshot};

/// Capacity of an advice text.
pub const ADVICE_CAP: usize = 512;

pub type AdviceText = heapless::String<ADVICE_CAP>;

/// Answer synthesized when the network is down.
pub const OFFLINE_TEXT: &str = "AI Assistant offline\n\nWiFi not connected.\nCheck network settings.";

/// Context sent to the remote advisory service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisoryRequest {
    pub ammonia_ppm: f32,
    pub nitrite_ppm: f32,
    pub nitrate_ppm: f32,
    pub ph: f32,
    pub hours_since_feed: f32,
    pub days_since_water_change: f32,
    /// Planned feeds per day, derived from the feed interval.
    pub feeds_per_day: f32,
    pub water_change_interval_days: f32,
    pub category: MoodCategory,
    /// Seconds since boot when the render task issued the request.
    pub requested_at: u64,
}

impl AdvisoryRequest {
    pub fn from_snapshot(snapshot: &ParameterSnapshot, category: MoodCategory, now: u64) -> Self {
        let feeds_per_day = if snapshot.feed_interval_secs == 0 {
            0.0
        } else {
            86_400.0 / snapshot.feed_interval_secs as f32
        };
        Self {
            ammonia_ppm: snapshot.ammonia_ppm,
            nitrite_ppm: snapshot.nitrite_ppm,
            nitrate_ppm: snapshot.nitrate_ppm,
            ph: snapshot.ph,
            hours_since_feed: snapshot.hours_since_feed(now),
            days_since_water_change: snapshot.days_since_water_change(now),
            feeds_per_day,
            water_change_interval_days: snapshot.water_change_interval_secs as f32 / 86_400.0,
            category,
            requested_at: now,
        }
    }
}

/// Outcome of one advisory request, shown on the display either way.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryResult {
    pub success: bool,
    pub text: AdviceText,
}

impl AdvisoryResult {
    pub fn success(text: &str) -> Self {
        Self {
            success: true,
            text: advice_text(text),
        }
    }

    pub fn failure(text: &str) -> Self {
        Self {
            success: false,
            text: advice_text(text),
        }
    }
}

/// Copy `text` into an [`AdviceText`], truncating on a char boundary.
pub fn advice_text(text: &str) -> AdviceText {
    let mut out = AdviceText::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
