//! Port traits: the hexagonal boundary between the coordination core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ coordinators / RenderCore (domain)
//! ```
//!
//! Storage, network, display and logging adapters implement these traits.
//! The coordinator tasks and [`RenderCore`](super::service::RenderCore)
//! consume them via generics, so the domain never touches hardware directly.
//!
//! ## Threading notes
//!
//! - Ports owned by a coordinator task ([`FrameStore`], [`AdvisoryClient`],
//!   [`TelemetryPort`], [`Connectivity`]) may block; they run on the I/O core.
//! - Ports used by the render core ([`FrameSink`], [`EventSink`],
//!   [`EventLog`]) are called from the render task and must return quickly.

use crate::advisory::AdviceText;
use crate::config::SystemConfig;
use crate::error::{EventLogError, FrameStoreError, TelemetryError, TransportError};
use crate::frames::Descriptor;

use super::events::{AppEvent, CareEvent, TelemetrySnapshot};

// ───────────────────────────────────────────────────────────────
// Frame storage (driven adapter: flash / SD → storage task)
// ───────────────────────────────────────────────────────────────

/// Blocking read of one pre-rendered frame.
pub trait FrameStore {
    /// Fill `buf` completely with the payload of frame `index`.
    ///
    /// A payload shorter than `buf` is a [`FrameStoreError::ShortRead`].
    fn read_frame(&mut self, index: u8, buf: &mut [u8]) -> Result<(), FrameStoreError>;
}

// ───────────────────────────────────────────────────────────────
// Network (driven adapters: network task → remote services)
// ───────────────────────────────────────────────────────────────

/// Reports whether the station has an IP and can reach the outside.
pub trait Connectivity {
    fn is_network_ready(&self) -> bool;
}

/// Raw answer from the remote advisory service.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryResponse {
    /// HTTP-style status. 429 means quota exhausted, 2xx means success.
    pub status: u16,
    /// Extracted answer text (empty when the body carried none).
    pub text: AdviceText,
}

/// Blocking call to the remote reasoning service.
///
/// Implementations carry their own timeout; there is no cancellation.
pub trait AdvisoryClient {
    fn query(&mut self, prompt: &str) -> Result<AdvisoryResponse, TransportError>;
}

/// Fire-and-forget dashboard push.
pub trait TelemetryPort {
    fn push(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError>;
}

// ───────────────────────────────────────────────────────────────
// Render side (driven adapters: domain → display / logs)
// ───────────────────────────────────────────────────────────────

/// Display collaborator. Receives the pixels of a ready frame through one of
/// the two alternating image descriptors.
///
/// The pixel slice is only valid for the duration of the call: the buffer
/// returns to the storage task right after `present` returns, so the sink
/// must copy or draw the pixels before returning.
pub trait FrameSink {
    fn present(&mut self, descriptor: Descriptor, frame_index: u8, pixels: &[u8]);
}

/// The domain emits structured [`AppEvent`]s through this port. Adapters
/// decide where they go (serial log, on-screen status line, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Append-only persistent care log. Never read back by this crate.
pub trait EventLog {
    fn append(&mut self, event: &CareEvent) -> Result<(), EventLogError>;
}

impl<L: EventLog + ?Sized> EventLog for Box<L> {
    fn append(&mut self, event: &CareEvent) -> Result<(), EventLogError> {
        (**self).append(event)
    }
}

/// Monotonic seconds since boot.
pub trait Clock {
    fn now_secs(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Timer delegate (decouples the render scheduler from RenderCore)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`RenderScheduler`](crate::scheduler::RenderScheduler)
/// invokes when a render-side timer fires.
pub trait TimerDelegate {
    fn on_timer(&mut self, timer: RenderTimer);
}

/// The fixed set of render-side periodic timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTimer {
    /// Advance the frame consumer.
    FrameTick,
    /// Drain pending mood results.
    MoodPoll,
    /// Drain a pending advisory result.
    AdvisoryPoll,
    /// Publish a dashboard snapshot.
    Telemetry,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
