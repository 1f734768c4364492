//! Inbound commands to the render core.
//!
//! These represent actions requested by the UI layer (touch buttons, a
//! parameter entry form, the periodic timers) that
//! [`RenderCore`](super::service::RenderCore) interprets and acts upon.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::SystemConfig;
use crate::mood::ParameterSnapshot;

/// Depth of the UI → render command queue.
pub const COMMAND_DEPTH: usize = 4;

/// UI callbacks push commands here; the render loop drains it with
/// `try_receive` once per iteration.
pub type CommandQueue = Channel<CriticalSectionRawMutex, AppCommand, COMMAND_DEPTH>;

/// Commands that the UI layer can send into the render core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Replace the water parameters and care timestamps, then re-evaluate.
    SetParameters(ParameterSnapshot),

    /// The fish were fed just now.
    RecordFeed,

    /// A water change was done just now.
    RecordWaterChange,

    /// Ask for advice. `urgent` bypasses the network entirely.
    RequestAdvisory { urgent: bool },

    /// Hot-reload configuration (e.g. from NVS).
    UpdateConfig(SystemConfig),
}
