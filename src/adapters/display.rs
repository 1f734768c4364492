//! Two owned image descriptors for the display layer.
//!
//! [`FrameSink::present`] hands out pixels that belong to the frame pool
//! and are recycled as soon as the call returns. `DescriptorPair` copies
//! them into the descriptor named by the consumer and flips the active
//! one, so the widget layer always points at stable memory while the next
//! frame is being loaded.

use log::debug;

use crate::app::ports::FrameSink;
use crate::frames::Descriptor;

pub struct DescriptorPair {
    primary: Box<[u8]>,
    secondary: Box<[u8]>,
    active: Option<(Descriptor, u8)>,
    presents: u32,
}

impl DescriptorPair {
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            primary: vec![0; frame_bytes].into_boxed_slice(),
            secondary: vec![0; frame_bytes].into_boxed_slice(),
            active: None,
            presents: 0,
        }
    }

    fn slot_mut(&mut self, descriptor: Descriptor) -> &mut [u8] {
        match descriptor {
            Descriptor::Primary => &mut self.primary,
            Descriptor::Secondary => &mut self.secondary,
        }
    }

    /// Descriptor and frame index currently on screen.
    pub fn active(&self) -> Option<(Descriptor, u8)> {
        self.active
    }

    /// Pixels of the descriptor currently on screen.
    pub fn active_pixels(&self) -> Option<&[u8]> {
        self.active.map(|(d, _)| match d {
            Descriptor::Primary => &*self.primary,
            Descriptor::Secondary => &*self.secondary,
        })
    }

    pub fn presents(&self) -> u32 {
        self.presents
    }
}

impl FrameSink for DescriptorPair {
    fn present(&mut self, descriptor: Descriptor, frame_index: u8, pixels: &[u8]) {
        let slot = self.slot_mut(descriptor);
        let n = slot.len().min(pixels.len());
        slot[..n].copy_from_slice(&pixels[..n]);
        self.active = Some((descriptor, frame_index));
        self.presents = self.presents.wrapping_add(1);
        debug!("DISPLAY: frame {} -> {:?}", frame_index, descriptor);
    }
}
