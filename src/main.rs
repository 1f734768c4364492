//! AquaMood firmware entry point
//!
//! Hexagonal architecture: one render loop on core 0, three blocking
//! coordinator tasks on core 1, joined by the `CoordLinks` channel set.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FrameFiles     HttpAdvisoryClient  BlynkTelemetry  StationLink│
//! │  (FrameStore)   (AdvisoryClient)    (TelemetryPort) (Connect.) │
//! │  DescriptorPair LogEventSink  CsvEventLog  NvsAdapter  Clock   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  core 1: StorageTask · MoodTask · NetTask   (block_on loops)   │
//! │  core 0: RenderCore driven by RenderScheduler                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use aquamood::adapters::advisory_http::HttpAdvisoryClient;
use aquamood::adapters::csv_log::CsvEventLog;
use aquamood::adapters::display::DescriptorPair;
use aquamood::adapters::frame_files::FrameFiles;
use aquamood::adapters::log_sink::LogEventSink;
use aquamood::adapters::nvs::NvsAdapter;
use aquamood::adapters::storage_mount::{self, SdSpiPins};
use aquamood::adapters::telemetry::BlynkTelemetry;
use aquamood::adapters::time::MonotonicClock;
use aquamood::adapters::wifi::StationLink;
use aquamood::advisory::net_task::NetTask;
use aquamood::app::commands::CommandQueue;
use aquamood::app::ports::{Clock, ConfigPort, EventLog};
use aquamood::app::service::{RenderCore, RenderDriver};
use aquamood::config::SystemConfig;
use aquamood::coord::channels::CoordLinks;
use aquamood::coord::mood_task::MoodTask;
use aquamood::diagnostics::CoordinatorStats;
use aquamood::drivers::task_pin::{Core, spawn_on_core};
use aquamood::frames::frame_buffers;
use aquamood::frames::storage_task::StorageTask;
use aquamood::scheduler::RenderScheduler;

const FRAME_ROOT: &str = "/spiffs/frames";
const CARE_LOG_PATH: &str = "/sdcard/care_log.csv";

/// SD card slot wiring on the display board.
const SD_PINS: SdSpiPins = SdSpiPins {
    mosi: 11,
    miso: 13,
    sclk: 12,
    cs: 10,
};

const ADVISORY_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const ADVISORY_KEY: &str = match option_env!("AQUAMOOD_ADVISORY_KEY") {
    Some(k) => k,
    None => "",
};
const TELEMETRY_SERVER: &str = "blynk.cloud";
const TELEMETRY_TOKEN: &str = match option_env!("AQUAMOOD_TELEMETRY_TOKEN") {
    Some(t) => t,
    None => "",
};

const STATS_LOG_INTERVAL_MS: u64 = 60_000;

/// UI callbacks (touch buttons, parameter form) push commands here.
static COMMANDS: CommandQueue = CommandQueue::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AquaMood v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(nvs) => Some(nvs),
        Err(e) => {
            warn!("NVS unavailable ({}), config changes will not persist", e);
            None
        }
    };
    let config = match nvs.as_ref().map(ConfigPort::load) {
        Some(Ok(c)) => c,
        Some(Err(e)) => {
            warn!("Config load failed ({}), running with defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };

    // ── 2b. Mount frame and log volumes ───────────────────────
    if let Err(e) = storage_mount::mount_spiffs() {
        warn!("SPIFFS mount failed ({}), no frames under {}", e, FRAME_ROOT);
    }
    let sd_mounted = match storage_mount::mount_sdcard(&SD_PINS) {
        Ok(()) => true,
        Err(e) => {
            warn!("SD card mount failed ({}), care log disabled", e);
            false
        }
    };

    // ── 3. Shared state ───────────────────────────────────────
    let clock = MonotonicClock::new();
    let stats = Arc::new(CoordinatorStats::new());
    let links = Arc::new(CoordLinks::new());
    let (writer, reader) = frame_buffers(config.frame_bytes());
    info!(
        "Frame pool: 2 × {} bytes, {} frames total",
        config.frame_bytes(),
        config.total_frames()
    );

    // ── 4. Coordinator tasks (core 1) ─────────────────────────
    let storage = StorageTask::new(
        FrameFiles::new(FRAME_ROOT, config.frames_per_category),
        writer,
        &config,
        Arc::clone(&stats),
    );
    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 6, 6, "storage\0", move || storage.run(&l.frame_requests))?;

    let mood = MoodTask::new(clock, Arc::clone(&stats));
    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 5, 6, "mood\0", move || mood.run(&l))?;

    if ADVISORY_KEY.is_empty() {
        warn!("No advisory API key compiled in; remote advice will fail");
    }
    let net = NetTask::new(
        StationLink::new(),
        HttpAdvisoryClient::new(ADVISORY_ENDPOINT, ADVISORY_KEY),
        BlynkTelemetry::new(TELEMETRY_SERVER, TELEMETRY_TOKEN),
        clock,
        &config,
        Arc::clone(&stats),
    );
    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 4, 16, "net\0", move || net.run(&l))?;

    // ── 5. Render side (this thread, core 0) ──────────────────
    let mut display = DescriptorPair::new(config.frame_bytes());
    let mut events = LogEventSink::new();
    let opened = if sd_mounted {
        CsvEventLog::open(CARE_LOG_PATH)
    } else {
        Err(std::io::ErrorKind::NotFound.into())
    };
    let mut care_log: Box<dyn EventLog> = match opened {
        Ok(log) => Box::new(log),
        Err(e) => {
            warn!("Care log {} unavailable ({}), records will be dropped", CARE_LOG_PATH, e);
            Box::new(CsvEventLog::new(std::io::sink(), false)?)
        }
    };

    let mut sched = RenderScheduler::new(&config);
    let mut render = RenderCore::new(config, links, reader, Arc::clone(&stats), clock.now_secs());
    render.start(&mut events);

    info!("System ready. Entering render loop.");

    // ── 6. Render loop ────────────────────────────────────────
    let mut last_ms = clock.uptime_ms();
    let mut last_stats_ms = last_ms;

    loop {
        let now_ms = clock.uptime_ms();
        let elapsed = now_ms.saturating_sub(last_ms).min(u64::from(u32::MAX)) as u32;
        last_ms = now_ms;
        let now = clock.now_secs();

        while let Ok(cmd) = COMMANDS.try_receive() {
            if render.handle_command(cmd, now, &mut care_log, &mut events) {
                sched.reconfigure(render.config());
                if let Some(nvs) = &nvs {
                    // Failures are logged by persist_config.
                    let _ = render.persist_config(nvs);
                }
            }
        }

        let mut driver = RenderDriver {
            core: &mut render,
            display: &mut display,
            events: &mut events,
            now,
        };
        sched.tick(elapsed, &mut driver);

        if now_ms.saturating_sub(last_stats_ms) >= STATS_LOG_INTERVAL_MS {
            last_stats_ms = now_ms;
            stats.log_summary();
        }

        let sleep_ms = sched.next_due_ms().clamp(1, 1_000);
        std::thread::sleep(Duration::from_millis(u64::from(sleep_ms)));
    }
}
