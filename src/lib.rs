//! AquaMood firmware library.
//!
//! Exposes the coordination core (mood engine, frame pipeline, advisory
//! path) and its adapters for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod advisory;
pub mod app;
pub mod config;
pub mod coord;
pub mod diagnostics;
pub mod error;
pub mod frames;
pub mod mood;
pub mod scheduler;

// Adapters and platform helpers compile on every target; the real
// implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
