//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements     | Connects to                       |
//! |-----------------|----------------|-----------------------------------|
//! | `frame_files`   | FrameStore     | Frame files on the mounted volume |
//! | `advisory_http` | AdvisoryClient | `generateContent` JSON API        |
//! | `telemetry`     | TelemetryPort  | Blynk-style HTTP update API       |
//! | `csv_log`       | EventLog       | Append-only CSV file              |
//! | `display`       | FrameSink      | Two owned image descriptors       |
//! | `log_sink`      | EventSink      | Serial log output                 |
//! | `time`          | Clock          | ESP32 system timer                |
//! | `nvs`           | ConfigPort     | NVS / in-memory store             |
//! | `wifi`          | Connectivity   | ESP-IDF WiFi STA status           |
//!
//! `storage_mount` implements no port: it registers the SPIFFS and SD card
//! volumes that `frame_files` and `csv_log` read and write.

pub mod advisory_http;
pub mod csv_log;
pub mod display;
pub mod frame_files;
#[cfg(target_os = "espidf")]
mod http;
pub mod log_sink;
pub mod nvs;
pub mod storage_mount;
pub mod telemetry;
pub mod time;
pub mod wifi;
