//! Drives one synchronisation cycle per output frame.

use reel_core::{Frame, Service};
use tracing::trace;

/// Pulls every track of its service in order and keeps one frame.
///
/// Transitions rely on tracks being requested once per cycle in ascending
/// order; the tractor is what guarantees that cadence.
pub struct Tractor {
    producer: Box<dyn Service>,
}

impl Tractor {
    pub fn new(producer: Box<dyn Service>) -> Self {
        Self { producer }
    }

    pub fn producer_mut(&mut self) -> &mut dyn Service {
        self.producer.as_mut()
    }

    /// Request tracks `0..track_count` and return the last frame that is not
    /// a test card, or track 0's frame when all are. The others are closed.
    pub fn get_frame(&mut self) -> Frame {
        let mut output: Option<Frame> = None;
        for track in 0..self.producer.track_count().max(1) {
            let frame = self.producer.get_frame(track);
            let keep = output.is_none() || !frame.is_test_card();
            trace!(track, keep, test_card = frame.is_test_card(), "tractor pulled track");
            if keep {
                if let Some(previous) = output.replace(frame) {
                    previous.close();
                }
            } else {
                frame.close();
            }
        }
        // The loop runs at least once
        output.unwrap_or_else(|| self.producer.get_frame(0))
    }

    pub fn into_inner(self) -> Box<dyn Service> {
        self.producer
    }
}

impl Service for Tractor {
    fn get_frame(&mut self, _index: usize) -> Frame {
        Tractor::get_frame(self)
    }
}
