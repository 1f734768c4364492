//! Render-side frame consumer.
//!
//! Called from the render task on a slow fixed cadence. Never blocks and
//! never performs I/O: it only looks at the two ready flags, hands a
//! matching buffer to the display sink and posts the next frame request.
//!
//! Absolute frame index:
//!
//! ```text
//!   next = category.bank() * frames_per_category + counter % frames_per_category
//! ```

use std::sync::Arc;

use log::{debug, info};

use crate::app::ports::FrameSink;
use crate::config::SystemConfig;
use crate::coord::channels::FrameRequestSlot;
use crate::diagnostics::CoordinatorStats;
use crate::mood::MoodCategory;

use super::{BufferId, Descriptor, FrameReader};

/// Result of one consumer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Shown { index: u8, descriptor: Descriptor },
    /// The expected frame is not ready yet; nothing changed on screen.
    Waiting { expected: u8 },
}

pub struct FrameConsumer {
    reader: FrameReader,
    category: MoodCategory,
    counter: u32,
    frames_per_category: u8,
    /// Descriptor currently on screen.
    descriptor: Descriptor,
    stats: Arc<CoordinatorStats>,
}

impl FrameConsumer {
    pub fn new(reader: FrameReader, config: &SystemConfig, stats: Arc<CoordinatorStats>) -> Self {
        Self {
            reader,
            category: MoodCategory::Happy,
            counter: 0,
            frames_per_category: config.frames_per_category,
            descriptor: Descriptor::Secondary,
            stats,
        }
    }

    pub fn category(&self) -> MoodCategory {
        self.category
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
    }

    /// Absolute index of the frame the next tick wants to show.
    pub fn next_index(&self) -> u8 {
        let fpc = u32::from(self.frames_per_category.max(1));
        let index = u32::from(self.category.bank()) * fpc + self.counter % fpc;
        index as u8
    }

    fn bank_range(&self) -> core::ops::Range<u8> {
        let start = self.category.bank() * self.frames_per_category;
        start..start + self.frames_per_category
    }

    /// Ask the storage task for the frame the next tick wants.
    pub fn prime(&self, requests: &FrameRequestSlot) {
        requests.signal(self.next_index());
    }

    /// Switch to `category`: counter back to 0, both buffers invalidated,
    /// frame 0 of the new bank requested.
    pub fn set_category(&mut self, category: MoodCategory, requests: &FrameRequestSlot) {
        info!(
            "FRAMES: category {} -> {}, invalidating buffers",
            self.category.label(),
            category.label()
        );
        self.category = category;
        self.counter = 0;
        self.reader.invalidate_all();
        self.prime(requests);
    }

    pub fn tick(&mut self, sink: &mut impl FrameSink, requests: &FrameRequestSlot) -> TickOutcome {
        let expected = self.next_index();
        self.release_stale();

        let Some(id) = self.reader.find_ready(expected) else {
            CoordinatorStats::bump(&self.stats.frame_ticks_skipped);
            self.unblock(expected);
            // The request may have been dropped (busy or failed read);
            // asking again is harmless, duplicates are filtered downstream.
            self.prime(requests);
            return TickOutcome::Waiting { expected };
        };

        let descriptor = self.descriptor.other();
        let shown = self.reader.consume(id, |index, pixels| {
            sink.present(descriptor, index, pixels);
            index
        });
        let Some(index) = shown else {
            return TickOutcome::Waiting { expected };
        };

        self.counter = self.counter.wrapping_add(1);
        self.descriptor = descriptor;
        CoordinatorStats::bump(&self.stats.frames_shown);
        debug!("FRAMES: showing frame {} via {:?}", index, descriptor);

        // Pipeline one frame ahead.
        self.prime(requests);
        TickOutcome::Shown { index, descriptor }
    }

    /// Release ready buffers holding frames of another category. They are
    /// left over from a load that finished after the last category change.
    fn release_stale(&mut self) {
        let bank = self.bank_range();
        for id in BufferId::ALL {
            if let Some(index) = self.reader.ready_index(id) {
                if !bank.contains(&index) && self.reader.release(id) {
                    debug!("FRAMES: released stale frame {} from buffer {}", index, id);
                    CoordinatorStats::bump(&self.stats.stale_buffers_released);
                }
            }
        }
    }

    /// Both buffers ready and neither holds `expected`: the storage task can
    /// never deliver it, so give both back.
    fn unblock(&mut self, expected: u8) {
        let all_ready = BufferId::ALL
            .into_iter()
            .all(|id| self.reader.ready_index(id).is_some_and(|i| i != expected));
        if all_ready {
            debug!("FRAMES: both buffers hold other frames, releasing for {}", expected);
            self.reader.invalidate_all();
            CoordinatorStats::bump(&self.stats.stale_buffers_released);
        }
    }
}
