//! A set of track producers addressed by track index.

use std::sync::Arc;

use reel_core::{Context, Frame, Service};
use tracing::debug;

/// Holds one service per track. Requests for a track hand back that track's
/// next frame; tracks with nothing connected give test cards.
pub struct Multitrack {
    tracks: Vec<Option<Box<dyn Service>>>,
    context: Arc<Context>,
}

impl Multitrack {
    pub fn new(context: &Arc<Context>) -> Self {
        Self {
            tracks: Vec::new(),
            context: Arc::clone(context),
        }
    }

    /// Attach `producer` to `track`, replacing whatever was there.
    pub fn connect(&mut self, producer: Box<dyn Service>, track: usize) {
        if self.tracks.len() <= track {
            self.tracks.resize_with(track + 1, || None);
        }
        if self.tracks[track].replace(producer).is_some() {
            debug!(track, "replaced track producer");
        }
    }

    /// Detach and return the producer on `track`.
    pub fn disconnect(&mut self, track: usize) -> Option<Box<dyn Service>> {
        self.tracks.get_mut(track).and_then(Option::take)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn get_frame(&mut self, track: usize) -> Frame {
        match self.tracks.get_mut(track).and_then(Option::as_mut) {
            Some(producer) => producer.get_frame(track),
            None => {
                debug!(track, "no producer on track, using test card");
                Frame::new(&self.context)
            }
        }
    }
}

impl Service for Multitrack {
    fn get_frame(&mut self, index: usize) -> Frame {
        Multitrack::get_frame(self, index)
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
