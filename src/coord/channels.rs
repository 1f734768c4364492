//! Cross-task links between the render task and the coordinator tasks.
//!
//! Two kinds of link, both from `embassy-sync`:
//!
//! - **Bounded channels** (depth 2) for parameter snapshots and mood
//!   results. These must not be lost; the render side keeps an unsent
//!   snapshot pending instead of blocking.
//! - **Single-slot signals** for frame requests, advisory requests,
//!   advisory results, telemetry snapshots and quota limits. A new value replaces any
//!   unconsumed one. Losing the older value is intended: only the newest
//!   request or result matters.
//!
//! ```text
//!  ┌──────────────┐  snapshots (2)      ┌──────────────┐
//!  │              │────────────────────▶│  mood task   │
//!  │              │◀────────────────────│              │
//!  │              │  mood_results (2)   └──────────────┘
//!  │              │
//!  │  render task │  frame_requests [1] ┌──────────────┐
//!  │              │────────────────────▶│ storage task │──▶ FrameWriter
//!  │              │                     └──────────────┘
//!  │              │  advisory_requests  ┌──────────────┐
//!  │              │────────────────────▶│              │
//!  │              │  telemetry [1]      │  net task    │
//!  │              │  quota_limits [1]   │              │
//!  │              │────────────────────▶│              │
//!  │              │◀────────────────────│              │
//!  └──────────────┘  advisory_results   └──────────────┘
//! ```
//!
//! The render task only ever uses the non-blocking `try_*` / `signal`
//! operations. Coordinator tasks block on the futures with
//! `futures_lite::future::block_on`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::advisory::quota::QuotaLimits;
use crate::advisory::{AdvisoryRequest, AdvisoryResult};
use crate::app::events::TelemetrySnapshot;
use crate::mood::{MoodResult, ParameterSnapshot};

/// Depth of the snapshot and mood-result channels.
pub const MOOD_DEPTH: usize = 2;

pub type SnapshotChannel = Channel<CriticalSectionRawMutex, ParameterSnapshot, MOOD_DEPTH>;
pub type MoodResultChannel = Channel<CriticalSectionRawMutex, MoodResult, MOOD_DEPTH>;

/// Single-slot overwrite cell.
pub type Latest<T> = Signal<CriticalSectionRawMutex, T>;

/// Absolute frame index requested from the storage task.
pub type FrameRequestSlot = Latest<u8>;

/// Every link between the render task and the three coordinators.
///
/// Shared behind an `Arc`; each link has exactly one producer side and one
/// consumer side.
pub struct CoordLinks {
    /// render → mood task
    pub snapshots: SnapshotChannel,
    /// mood task → render
    pub mood_results: MoodResultChannel,
    /// render → storage task
    pub frame_requests: FrameRequestSlot,
    /// render → net task
    pub advisory_requests: Latest<AdvisoryRequest>,
    /// net task → render
    pub advisory_results: Latest<AdvisoryResult>,
    /// render → net task
    pub telemetry: Latest<TelemetrySnapshot>,
    /// render → net task, after a runtime config change
    pub quota_limits: Latest<QuotaLimits>,
}

impl CoordLinks {
    pub const fn new() -> Self {
        Self {
            snapshots: Channel::new(),
            mood_results: Channel::new(),
            frame_requests: Signal::new(),
            advisory_requests: Signal::new(),
            advisory_results: Signal::new(),
            telemetry: Signal::new(),
            quota_limits: Signal::new(),
        }
    }
}

impl Default for CoordLinks {
    fn default() -> Self {
        Self::new()
    }
}
