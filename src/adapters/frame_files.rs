//! File-backed frame store.
//!
//! Frames live on the mounted storage volume (SPIFFS / FAT / SD) as raw
//! RGB565 payloads, one file per frame:
//!
//! ```text
//!   <root>/happy/frame0.bin … frame7.bin
//!   <root>/sad/frame0.bin   … frame7.bin
//!   <root>/angry/frame0.bin … frame7.bin
//! ```
//!
//! ESP-IDF exposes mounted volumes through the VFS layer, so `std::fs`
//! works unchanged on both the target and the host.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::debug;

use crate::app::ports::FrameStore;
use crate::error::FrameStoreError;
use crate::mood::MoodCategory;

pub struct FrameFiles {
    root: PathBuf,
    frames_per_category: u8,
}

impl FrameFiles {
    pub fn new(root: impl Into<PathBuf>, frames_per_category: u8) -> Self {
        Self {
            root: root.into(),
            frames_per_category: frames_per_category.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of absolute frame `index`, or `None` past the last bank.
    pub fn path_for(&self, index: u8) -> Option<PathBuf> {
        let category = MoodCategory::from_bank(index / self.frames_per_category)?;
        let k = index % self.frames_per_category;
        Some(
            self.root
                .join(category.dir_name())
                .join(format!("frame{k}.bin")),
        )
    }
}

impl FrameStore for FrameFiles {
    fn read_frame(&mut self, index: u8, buf: &mut [u8]) -> Result<(), FrameStoreError> {
        let path = self.path_for(index).ok_or(FrameStoreError::NotFound)?;
        let mut file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FrameStoreError::NotFound,
            _ => FrameStoreError::Io,
        })?;

        let mut got = 0;
        while got < buf.len() {
            match file.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return Err(FrameStoreError::Io),
            }
        }
        if got < buf.len() {
            return Err(FrameStoreError::ShortRead {
                expected: buf.len(),
                got,
            });
        }
        debug!("STORAGE: read {} bytes from {}", got, path.display());
        Ok(())
    }
}
