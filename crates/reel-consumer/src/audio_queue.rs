//! Bounded queue of rendered audio between the worker and a playback side.

use std::collections::VecDeque;

use parking_lot::Mutex;
use reel_core::Audio;
use tracing::warn;

/// Default number of frames of audio buffered before the oldest is dropped.
pub const DEFAULT_AUDIO_FRAMES: usize = 8;

/// Audio blocks in render order, behind their own lock so a playback thread
/// never contends with the render rendezvous.
pub struct AudioQueue {
    blocks: Mutex<VecDeque<Audio>>,
    capacity: usize,
}

impl AudioQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            blocks: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Queue a block. When full the oldest block is stale and gets dropped.
    pub fn push(&self, audio: Audio) {
        let mut blocks = self.blocks.lock();
        if blocks.len() >= self.capacity {
            blocks.pop_front();
            warn!(capacity = self.capacity, "audio queue full, dropping stale block");
        }
        blocks.push_back(audio);
    }

    pub fn pop(&self) -> Option<Audio> {
        self.blocks.lock().pop_front()
    }

    /// Take everything queued.
    pub fn drain(&self) -> Vec<Audio> {
        self.blocks.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.blocks.lock().clear();
    }
}

impl Default for AudioQueue {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_FRAMES)
    }
}
