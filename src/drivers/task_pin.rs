//! Core-pinned thread spawning for ESP32-S3 dual-core.
//!
//! The render loop owns core 0 together with the protocol stacks; the
//! storage, mood and network coordinators run on core 1 so that blocking
//! flash reads and HTTP calls never stall a frame.
//!
//! ESP-IDF implements `std::thread` via pthreads on top of FreeRTOS tasks.
//! `esp_pthread_set_cfg()` sets thread-local configuration that applies to
//! the *next* `pthread_create()` from the calling thread, so the
//! config→spawn pair must not be interleaved with other thread creation on
//! the same thread.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers for the ESP32-S3 Xtensa LX7 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): WiFi/lwIP and the render loop.
    Pro = 0,
    /// Core 1 (APP_CPU): coordinator tasks.
    App = 1,
}

/// Spawn a thread pinned to `core` with explicit priority and stack size.
///
/// `name` must be NUL-terminated (e.g. `"storage\0"`); it becomes the
/// FreeRTOS task name.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct is fully initialised by
    // esp_create_default_pthread_config and `name` is 'static and
    // NUL-terminated.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );
    std::thread::Builder::new().name(display_name.into()).spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        stack_kb
    );
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
