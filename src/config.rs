//! System configuration parameters
//!
//! All tunable parameters for the AquaMood core.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Number of mood categories, each owning one bank of animation frames.
pub const MOOD_CATEGORIES: usize = 3;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Display / frames ---
    /// Animation frame width in pixels
    pub frame_width: u16,
    /// Animation frame height in pixels
    pub frame_height: u16,
    /// Frames stored per mood category
    pub frames_per_category: u8,
    /// Swap the two bytes of every RGB565 pixel after loading
    pub swap_rgb565_bytes: bool,

    // --- Render-side timers ---
    /// Interval between frame-consumer ticks (milliseconds)
    pub frame_tick_interval_ms: u32,
    /// Interval between mood-result polls (milliseconds)
    pub mood_poll_interval_ms: u32,
    /// Interval between advisory-result polls (milliseconds)
    pub advisory_poll_interval_ms: u32,
    /// Telemetry snapshot publication interval (seconds)
    pub telemetry_interval_secs: u32,

    // --- Advisory ---
    /// Minimum time since the last successful advisory before a new
    /// non-urgent request is issued (seconds)
    pub advisory_min_interval_secs: u32,
    /// First quota cooldown after a rate-limit response (seconds)
    pub quota_cooldown_secs: u32,
    /// Upper bound for the doubling quota cooldown (seconds)
    pub quota_cooldown_max_secs: u32,

    // --- Care schedule defaults ---
    /// Planned time between feeds (seconds)
    pub feed_interval_secs: u32,
    /// Planned time between water changes (seconds)
    pub water_change_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Frames
            frame_width: 320,
            frame_height: 240,
            frames_per_category: 8,
            swap_rgb565_bytes: true,

            // Timers
            frame_tick_interval_ms: 10_000, // static frames, slow swap
            mood_poll_interval_ms: 100,
            advisory_poll_interval_ms: 500,
            telemetry_interval_secs: 30,

            // Advisory
            advisory_min_interval_secs: 300,
            quota_cooldown_secs: 3600,
            quota_cooldown_max_secs: 4 * 3600,

            // Care schedule
            feed_interval_secs: 8 * 3600,
            water_change_interval_secs: 7 * 24 * 3600,
        }
    }
}

impl SystemConfig {
    /// Size of one frame buffer in bytes (RGB565, 2 bytes per pixel).
    pub fn frame_bytes(&self) -> usize {
        self.frame_width as usize * self.frame_height as usize * 2
    }

    /// Total number of frames across all categories.
    pub fn total_frames(&self) -> usize {
        MOOD_CATEGORIES * self.frames_per_category as usize
    }

    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err("frame dimensions must be non-zero");
        }
        if self.frames_per_category == 0 {
            return Err("frames_per_category must be at least 1");
        }
        // Absolute frame indices travel as u8.
        if self.total_frames() > u8::MAX as usize + 1 {
            return Err("frames_per_category too large for u8 frame indices");
        }
        if !(100..=60_000).contains(&self.frame_tick_interval_ms) {
            return Err("frame_tick_interval_ms must be 100–60000");
        }
        if !(10..=5_000).contains(&self.mood_poll_interval_ms) {
            return Err("mood_poll_interval_ms must be 10–5000");
        }
        if !(10..=5_000).contains(&self.advisory_poll_interval_ms) {
            return Err("advisory_poll_interval_ms must be 10–5000");
        }
        if !(5..=3600).contains(&self.telemetry_interval_secs) {
            return Err("telemetry_interval_secs must be 5–3600");
        }
        if self.quota_cooldown_secs == 0 {
            return Err("quota_cooldown_secs must be non-zero");
        }
        if self.quota_cooldown_max_secs < self.quota_cooldown_secs {
            return Err("quota_cooldown_max_secs must be >= quota_cooldown_secs");
        }
        if self.feed_interval_secs == 0 || self.water_change_interval_secs == 0 {
            return Err("care intervals must be non-zero");
        }
        Ok(())
    }
}
