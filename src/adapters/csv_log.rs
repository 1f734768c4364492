//! Append-only CSV care log.
//!
//! One line per [`CareEvent`]; columns that do not apply to a record stay
//! empty:
//!
//! ```text
//! at_secs,kind,ammonia_ppm,nitrite_ppm,nitrate_ppm,ph
//! 3600,reading,0.00,0.00,10.0,7.20
//! 7200,feed,,,,
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use log::info;

use crate::app::events::CareEvent;
use crate::app::ports::EventLog;
use crate::error::EventLogError;

pub const HEADER: [&str; 6] = ["at_secs", "kind", "ammonia_ppm", "nitrite_ppm", "nitrate_ppm", "ph"];

/// Fields of one record, in [`HEADER`] order.
pub fn record(event: &CareEvent) -> [String; 6] {
    match *event {
        CareEvent::ParameterReading {
            at_secs,
            ammonia_ppm,
            nitrite_ppm,
            nitrate_ppm,
            ph,
        } => [
            at_secs.to_string(),
            event.kind().to_string(),
            format!("{ammonia_ppm:.2}"),
            format!("{nitrite_ppm:.2}"),
            format!("{nitrate_ppm:.1}"),
            format!("{ph:.2}"),
        ],
        CareEvent::Fed { at_secs } | CareEvent::WaterChanged { at_secs } => [
            at_secs.to_string(),
            event.kind().to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ],
    }
}

pub struct CsvEventLog<W: Write> {
    out: csv::Writer<W>,
}

impl<W: Write> CsvEventLog<W> {
    /// Wrap a writer. When `write_header` is set the column line is written
    /// first.
    pub fn new(out: W, write_header: bool) -> io::Result<Self> {
        let mut out = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        if write_header {
            out.write_record(HEADER)?;
            out.flush()?;
        }
        Ok(Self { out })
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}

impl CsvEventLog<File> {
    /// Open (or create) the log file in append mode. The header is written
    /// only when the file is new or empty.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;
        info!("LOG: care log at {} ({})", path.display(), if empty { "new" } else { "appending" });
        Self::new(file, empty)
    }
}

impl<W: Write> EventLog for CsvEventLog<W> {
    fn append(&mut self, event: &CareEvent) -> Result<(), EventLogError> {
        self.out
            .write_record(record(event))
            .map_err(|_| EventLogError::WriteFailed)?;
        self.out.flush().map_err(|_| EventLogError::WriteFailed)
    }
}
