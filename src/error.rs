//! Unified error types for the AquaMood core.
//!
//! A single `Error` enum that every subsystem can convert into. All variants
//! are `Copy` so they can travel through the coordinator tasks and into log
//! lines without allocation. None of them is fatal: coordinators resolve
//! every error into a logged no-op or a synthesized result value.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Frame storage read failed.
    FrameStore(FrameStoreError),
    /// The remote advisory call failed before producing a status.
    Advisory(TransportError),
    /// Telemetry push failed.
    Telemetry(TelemetryError),
    /// The persistent event log rejected a record.
    EventLog(EventLogError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameStore(e) => write!(f, "frame store: {e}"),
            Self::Advisory(e) => write!(f, "advisory: {e}"),
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::EventLog(e) => write!(f, "event log: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Frame storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStoreError {
    /// No payload exists for the requested frame.
    NotFound,
    /// The payload ended before the buffer was filled.
    ShortRead { expected: usize, got: usize },
    /// The storage driver reported an error.
    Io,
}

impl fmt::Display for FrameStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "frame not found"),
            Self::ShortRead { expected, got } => {
                write!(f, "short read ({got} of {expected} bytes)")
            }
            Self::Io => write!(f, "storage I/O error"),
        }
    }
}

impl From<FrameStoreError> for Error {
    fn from(e: FrameStoreError) -> Self {
        Self::FrameStore(e)
    }
}

// ---------------------------------------------------------------------------
// Advisory transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established.
    Connect,
    /// The call timed out.
    Timeout,
    /// The response body could not be decoded.
    MalformedResponse,
    /// No transport exists on this target.
    Unavailable,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connection failed"),
            Self::Timeout => write!(f, "request timed out"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Unavailable => write!(f, "transport unavailable"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Advisory(e)
    }
}

// ---------------------------------------------------------------------------
// Telemetry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// The telemetry endpoint answered with a non-success status.
    Rejected(u16),
    /// The request never reached the endpoint.
    Transport(TransportError),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(status) => write!(f, "rejected with HTTP {status}"),
            Self::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl From<TransportError> for TelemetryError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<TelemetryError> for Error {
    fn from(e: TelemetryError) -> Self {
        Self::Telemetry(e)
    }
}

// ---------------------------------------------------------------------------
// Event log errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLogError {
    /// The backing medium is missing (e.g. no card inserted).
    Unavailable,
    /// Writing the record failed.
    WriteFailed,
}

impl fmt::Display for EventLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "log medium unavailable"),
            Self::WriteFailed => write!(f, "write failed"),
        }
    }
}

impl From<EventLogError> for Error {
    fn from(e: EventLogError) -> Self {
        Self::EventLog(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
