//! Render-side application core.
//!
//! This module contains the render-task half of the AquaMood system: the
//! pollers that apply mood and advisory results, the frame consumer tick,
//! and the advisory rate limiter. All interaction with storage, network and
//! display happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
