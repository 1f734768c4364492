//! Mock adapters for integration tests.
//!
//! Everything that crosses into a coordinator task is `Send` and shares its
//! state through `Arc`, so a test can keep a handle after moving the adapter
//! into a thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use aquamood::advisory::advice_text;
use aquamood::app::events::{AppEvent, CareEvent, TelemetrySnapshot};
use aquamood::app::ports::{
    AdvisoryClient, AdvisoryResponse, Clock, ConfigError, ConfigPort, Connectivity, EventLog,
    EventSink, FrameSink, FrameStore, TelemetryPort,
};
use aquamood::config::SystemConfig;
use aquamood::error::{EventLogError, FrameStoreError, TelemetryError, TransportError};
use aquamood::frames::Descriptor;

/// Small frames keep the threaded tests fast.
#[allow(dead_code)]
pub fn small_config() -> SystemConfig {
    SystemConfig {
        frame_width: 4,
        frame_height: 2,
        frames_per_category: 4,
        swap_rgb565_bytes: false,
        ..Default::default()
    }
}

// ── Frame storage ─────────────────────────────────────────────

/// Every byte of frame `k` is `k`, so torn or mixed-up frames show up in
/// the first pixel.
#[derive(Clone, Default)]
pub struct PatternStore {
    pub reads: Arc<AtomicU32>,
    /// Frames that fail once with `NotFound`, then load normally.
    pub fail_once: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_read_of(&self, index: u8) {
        self.fail_once.lock().unwrap().push(index);
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FrameStore for PatternStore {
    fn read_frame(&mut self, index: u8, buf: &mut [u8]) -> Result<(), FrameStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut failing = self.fail_once.lock().unwrap();
        if let Some(pos) = failing.iter().position(|i| *i == index) {
            failing.remove(pos);
            return Err(FrameStoreError::NotFound);
        }
        buf.fill(index);
        Ok(())
    }
}

// ── Clock / network ───────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ManualClock(pub Arc<AtomicU64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct MockNet(pub Arc<AtomicBool>);

#[allow(dead_code)]
impl MockNet {
    pub fn online() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set_online(&self, up: bool) {
        self.0.store(up, Ordering::SeqCst);
    }
}

impl Connectivity for MockNet {
    fn is_network_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Remote services ───────────────────────────────────────────

/// Answers from a script; once it runs dry every call succeeds with
/// [`ScriptedClient::FALLBACK`].
#[derive(Clone, Default)]
pub struct ScriptedClient {
    answers: Arc<Mutex<VecDeque<Result<AdvisoryResponse, TransportError>>>>,
    pub calls: Arc<AtomicU32>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub const FALLBACK: &'static str = "Tank looks stable. Keep the routine.";

    pub fn new(answers: Vec<Result<AdvisoryResponse, TransportError>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl AdvisoryClient for ScriptedClient {
    fn query(&mut self, prompt: &str) -> Result<AdvisoryResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok(Self::FALLBACK))
    }
}

#[allow(dead_code)]
pub fn ok(text: &str) -> Result<AdvisoryResponse, TransportError> {
    Ok(AdvisoryResponse {
        status: 200,
        text: advice_text(text),
    })
}

#[allow(dead_code)]
pub fn status(code: u16) -> Result<AdvisoryResponse, TransportError> {
    Ok(AdvisoryResponse {
        status: code,
        text: advice_text(""),
    })
}

#[derive(Clone, Default)]
pub struct MockTelemetry {
    pub pushed: Arc<Mutex<Vec<TelemetrySnapshot>>>,
    pub reject: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockTelemetry {
    pub fn pushed(&self) -> Vec<TelemetrySnapshot> {
        self.pushed.lock().unwrap().clone()
    }
}

impl TelemetryPort for MockTelemetry {
    fn push(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(TelemetryError::Rejected(400));
        }
        self.pushed.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

// ── Render-side sinks ─────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mood_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::MoodChanged { .. }))
            .count()
    }

    pub fn shown(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::FrameShown { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Default)]
pub struct MemoryLog {
    pub records: Vec<CareEvent>,
    pub broken: bool,
}

impl EventLog for MemoryLog {
    fn append(&mut self, event: &CareEvent) -> Result<(), EventLogError> {
        if self.broken {
            return Err(EventLogError::Unavailable);
        }
        self.records.push(*event);
        Ok(())
    }
}

/// Records `(descriptor, frame index, first pixel byte)` per present.
#[derive(Default)]
pub struct Screen {
    pub shown: Vec<(Descriptor, u8, u8)>,
}

impl FrameSink for Screen {
    fn present(&mut self, descriptor: Descriptor, frame_index: u8, pixels: &[u8]) {
        self.shown.push((descriptor, frame_index, pixels.first().copied().unwrap_or(0)));
    }
}

// ── Config storage ────────────────────────────────────────────

/// Keeps the last saved configuration; validates like the real store.
#[derive(Default)]
pub struct MemoryConfig {
    pub stored: Mutex<Option<SystemConfig>>,
    pub saves: AtomicU32,
}

impl ConfigPort for MemoryConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(config.clone());
        Ok(())
    }
}
