//! Frame storage coordinator task.
//!
//! The only place in the system that performs blocking storage I/O. Owns
//! the [`FrameWriter`] half of the frame pool and serves the newest pending
//! frame request:
//!
//! 1. reject indices outside `0..total_frames`
//! 2. drop the request if a ready buffer already holds that frame
//! 3. pick a free buffer (A first); drop the request if both are busy
//! 4. read the frame into it, byte-swap if configured, publish
//!
//! Failed reads leave the buffer not-ready. Nothing is retried here; the
//! next explicit request re-attempts.

use std::sync::Arc;

use futures_lite::future;
use log::{debug, error, info, warn};

use crate::app::ports::FrameStore;
use crate::config::SystemConfig;
use crate::coord::channels::FrameRequestSlot;
use crate::diagnostics::CoordinatorStats;
use crate::error::FrameStoreError;

use super::{BufferId, FillError, FrameWriter, swap_rgb565};

/// What happened to one frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(BufferId),
    /// Index out of range.
    Rejected,
    /// A ready buffer already holds this frame.
    Duplicate,
    /// Both buffers are owned by the reader.
    Busy,
    Failed(FrameStoreError),
}

pub struct StorageTask<S> {
    store: S,
    writer: FrameWriter,
    total_frames: usize,
    swap_bytes: bool,
    stats: Arc<CoordinatorStats>,
}

impl<S: FrameStore> StorageTask<S> {
    pub fn new(store: S, writer: FrameWriter, config: &SystemConfig, stats: Arc<CoordinatorStats>) -> Self {
        Self {
            store,
            writer,
            total_frames: config.total_frames(),
            swap_bytes: config.swap_rgb565_bytes,
            stats,
        }
    }

    pub fn handle(&mut self, index: u8) -> LoadOutcome {
        if usize::from(index) >= self.total_frames {
            warn!(
                "STORAGE: frame {} out of range (0..{}), request dropped",
                index, self.total_frames
            );
            CoordinatorStats::bump(&self.stats.requests_invalid);
            return LoadOutcome::Rejected;
        }

        if let Some(id) = self.writer.find_ready(index) {
            debug!("STORAGE: frame {} already ready in buffer {}", index, id);
            CoordinatorStats::bump(&self.stats.requests_duplicate);
            return LoadOutcome::Duplicate;
        }

        let Some(id) = self.writer.free_buffer() else {
            warn!("STORAGE: both buffers busy, dropping request for frame {}", index);
            CoordinatorStats::bump(&self.stats.requests_dropped_busy);
            return LoadOutcome::Busy;
        };

        let store = &mut self.store;
        let swap = self.swap_bytes;
        let filled: Result<(), FillError<FrameStoreError>> = self.writer.fill(id, index, |pixels| {
            store.read_frame(index, pixels)?;
            if swap {
                swap_rgb565(pixels);
            }
            Ok(())
        });

        match filled {
            Ok(()) => {
                debug!("STORAGE: frame {} loaded into buffer {}", index, id);
                CoordinatorStats::bump(&self.stats.frames_loaded);
                LoadOutcome::Loaded(id)
            }
            Err(FillError::Load(e)) => {
                error!("STORAGE: failed to load frame {}: {}", index, e);
                CoordinatorStats::bump(&self.stats.frame_load_failures);
                LoadOutcome::Failed(e)
            }
            // free_buffer() just reported it free and only the reader can
            // change it, and only towards free.
            Err(FillError::Busy) => LoadOutcome::Busy,
        }
    }

    /// Task body. Never returns.
    pub fn run(mut self, requests: &FrameRequestSlot) -> ! {
        info!(
            "STORAGE: task started ({} frames, {} bytes each, swap={})",
            self.total_frames,
            self.writer.frame_bytes(),
            self.swap_bytes
        );
        loop {
            let index = future::block_on(requests.wait());
            self.handle(index);
        }
    }
}
