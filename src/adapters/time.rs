//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::app::ports::Clock;

/// Seconds/milliseconds since boot. Cheap to copy into every task.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time has no preconditions once the system
        // timer is running, which ESP-IDF guarantees before app_main.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    pub fn uptime_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }
}

impl Clock for MonotonicClock {
    fn now_secs(&self) -> u64 {
        self.uptime_secs()
    }
}
