//! Outbound application events and records.
//!
//! [`RenderCore`](super::service::RenderCore) emits [`AppEvent`]s through the
//! [`EventSink`](super::ports::EventSink) port, appends [`CareEvent`]s to the
//! [`EventLog`](super::ports::EventLog) port and publishes
//! [`TelemetrySnapshot`]s towards the network task. Adapters on the other
//! side decide where they end up.

use serde::{Deserialize, Serialize};

use crate::advisory::AdviceText;
use crate::frames::Descriptor;
use crate::mood::MoodCategory;

/// Structured events emitted by the render core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The render core has started (carries the initial category).
    Started(MoodCategory),

    /// A mood result moved the display to another category.
    MoodChanged {
        from: MoodCategory,
        to: MoodCategory,
        total: i8,
    },

    /// A frame was handed to the display sink.
    FrameShown { index: u8, descriptor: Descriptor },

    /// An advisory result reached the display.
    AdvisoryApplied { success: bool, local: bool },

    /// A non-urgent advisory request was refused by the minimum-interval gate.
    AdvisoryThrottled { retry_in_secs: u64 },

    /// A telemetry snapshot was handed to the network task.
    TelemetryPublished(TelemetrySnapshot),
}

/// Flat dashboard snapshot: numeric fields plus two text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub ammonia_ppm: f32,
    pub nitrite_ppm: f32,
    pub nitrate_ppm: f32,
    pub ph: f32,
    pub hours_since_feed: f32,
    pub days_since_water_change: f32,
    pub mood: MoodCategory,
    /// Latest advisory text shown on the display (may be empty).
    pub advice: AdviceText,
}

/// Append-only care record for the persistent event log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CareEvent {
    ParameterReading {
        at_secs: u64,
        ammonia_ppm: f32,
        nitrite_ppm: f32,
        nitrate_ppm: f32,
        ph: f32,
    },
    Fed {
        at_secs: u64,
    },
    WaterChanged {
        at_secs: u64,
    },
}

impl CareEvent {
    pub fn at_secs(&self) -> u64 {
        match *self {
            Self::ParameterReading { at_secs, .. }
            | Self::Fed { at_secs }
            | Self::WaterChanged { at_secs } => at_secs,
        }
    }

    /// Short tag used as the record kind in log files.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ParameterReading { .. } => "reading",
            Self::Fed { .. } => "feed",
            Self::WaterChanged { .. } => "water_change",
        }
    }
}
