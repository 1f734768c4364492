//! Double-buffered frame handoff between the storage task and the renderer.
//!
//! Two fixed-size pixel buffers are shared by exactly one writer (the
//! storage task, via [`FrameWriter`]) and one reader (the render-side
//! consumer, via [`FrameReader`]). Ownership of each buffer alternates
//! through its `ready` flag; no mutex is involved.
//!
//! ```text
//!  storage task                          render task
//!  ────────────                          ───────────
//!  write pixels
//!  frame_index.store(i, Relaxed)
//!  ready.store(true, Release)  ───────▶  ready.load(Acquire) == true
//!                                        frame_index.load(Relaxed)
//!                                        read pixels
//!  ready.load(Acquire) == false ◀──────  ready.store(false, Release)
//!  (buffer may be rewritten)
//! ```
//!
//! The writer and reader halves are not `Clone`, so a second concurrent
//! writer or reader cannot be created from safe code.

pub mod consumer;
pub mod storage_task;

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Number of shared frame buffers.
pub const BUFFER_COUNT: usize = 2;

/// One of the two shared buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    /// Preference order when both buffers are free.
    pub const ALL: [Self; BUFFER_COUNT] = [Self::A, Self::B];

    const fn slot(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// One of the two image descriptors the display alternates between.
///
/// The renderer only redraws when the image source reference changes, so
/// consecutive frames are presented through alternating descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    Primary,
    Secondary,
}

impl Descriptor {
    pub const fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared pool
// ───────────────────────────────────────────────────────────────

struct FrameSlot {
    ready: AtomicBool,
    frame_index: AtomicU8,
    pixels: UnsafeCell<Box<[u8]>>,
}

impl FrameSlot {
    fn new(frame_bytes: usize) -> Self {
        Self {
            ready: AtomicBool::new(false),
            frame_index: AtomicU8::new(0),
            pixels: UnsafeCell::new(vec![0u8; frame_bytes].into_boxed_slice()),
        }
    }
}

struct FramePool {
    slots: [FrameSlot; BUFFER_COUNT],
    frame_bytes: usize,
}

// SAFETY: pixel memory is touched by at most one side at a time. The writer
// only accesses a slot after observing `ready == false` (Acquire) and the
// reader only after observing `ready == true` (Acquire); each side hands the
// slot over with a Release store to `ready`. Only one `FrameWriter` and one
// `FrameReader` exist per pool.
unsafe impl Sync for FramePool {}

impl FramePool {
    fn slot(&self, id: BufferId) -> &FrameSlot {
        &self.slots[id.slot()]
    }

    fn ready_index(&self, id: BufferId) -> Option<u8> {
        let slot = self.slot(id);
        if slot.ready.load(Ordering::Acquire) {
            Some(slot.frame_index.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    fn find_ready(&self, index: u8) -> Option<BufferId> {
        BufferId::ALL
            .into_iter()
            .find(|id| self.ready_index(*id) == Some(index))
    }
}

/// Allocate the two buffers of `frame_bytes` each and split them into the
/// writer and reader halves.
pub fn frame_buffers(frame_bytes: usize) -> (FrameWriter, FrameReader) {
    let pool = Arc::new(FramePool {
        slots: [FrameSlot::new(frame_bytes), FrameSlot::new(frame_bytes)],
        frame_bytes,
    });
    (
        FrameWriter {
            pool: Arc::clone(&pool),
        },
        FrameReader { pool },
    )
}

// ───────────────────────────────────────────────────────────────
// Writer half (storage task)
// ───────────────────────────────────────────────────────────────

/// Why [`FrameWriter::fill`] did not publish a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillError<E> {
    /// The buffer is still owned by the reader.
    Busy,
    /// The loader failed; the buffer stays not-ready.
    Load(E),
}

/// Exclusive write access to free buffers.
pub struct FrameWriter {
    pool: Arc<FramePool>,
}

impl FrameWriter {
    pub fn frame_bytes(&self) -> usize {
        self.pool.frame_bytes
    }

    /// Frame index held by `id`, if it is currently published.
    pub fn ready_index(&self, id: BufferId) -> Option<u8> {
        self.pool.ready_index(id)
    }

    /// The published buffer holding `index`, if any.
    pub fn find_ready(&self, index: u8) -> Option<BufferId> {
        self.pool.find_ready(index)
    }

    /// First free buffer, A preferred.
    pub fn free_buffer(&self) -> Option<BufferId> {
        BufferId::ALL
            .into_iter()
            .find(|id| !self.pool.slot(*id).ready.load(Ordering::Acquire))
    }

    /// Run `load` over the pixels of free buffer `id` and publish the result
    /// as frame `index`.
    ///
    /// The index is stored before the ready flag. On loader failure the
    /// buffer is left not-ready.
    pub fn fill<E>(
        &mut self,
        id: BufferId,
        index: u8,
        load: impl FnOnce(&mut [u8]) -> Result<(), E>,
    ) -> Result<(), FillError<E>> {
        let slot = self.pool.slot(id);
        if slot.ready.load(Ordering::Acquire) {
            return Err(FillError::Busy);
        }

        // SAFETY: `ready` is false, so the reader will not touch this slot
        // until we publish it below, and `&mut self` rules out another
        // writer.
        let pixels: &mut [u8] = unsafe { &mut *slot.pixels.get() };
        load(pixels).map_err(FillError::Load)?;

        slot.frame_index.store(index, Ordering::Relaxed);
        slot.ready.store(true, Ordering::Release);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Reader half (render task)
// ───────────────────────────────────────────────────────────────

/// Exclusive read access to published buffers.
pub struct FrameReader {
    pool: Arc<FramePool>,
}

impl FrameReader {
    pub fn ready_index(&self, id: BufferId) -> Option<u8> {
        self.pool.ready_index(id)
    }

    pub fn find_ready(&self, index: u8) -> Option<BufferId> {
        self.pool.find_ready(index)
    }

    /// Hand the published contents of `id` to `f`, then return the buffer
    /// to the writer. `None` if the buffer was not ready.
    pub fn consume<R>(&mut self, id: BufferId, f: impl FnOnce(u8, &[u8]) -> R) -> Option<R> {
        let slot = self.pool.slot(id);
        if !slot.ready.load(Ordering::Acquire) {
            return None;
        }
        let index = slot.frame_index.load(Ordering::Relaxed);

        // SAFETY: `ready` is true, so the writer will not touch this slot
        // until we clear the flag below.
        let pixels: &[u8] = unsafe { &*slot.pixels.get() };
        let out = f(index, pixels);

        slot.ready.store(false, Ordering::Release);
        Some(out)
    }

    /// Return `id` to the writer without reading it. Returns whether the
    /// buffer was ready.
    pub fn release(&mut self, id: BufferId) -> bool {
        self.pool.slot(id).ready.swap(false, Ordering::AcqRel)
    }

    /// Mark both buffers not-ready.
    pub fn invalidate_all(&mut self) {
        for id in BufferId::ALL {
            self.release(id);
        }
    }
}

/// Swap the two bytes of every RGB565 pixel in place.
pub fn swap_rgb565(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(2) {
        px.swap(0, 1);
    }
}
