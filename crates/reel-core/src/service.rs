//! The pull interface shared by producers, multitracks, transitions and tractors.

use crate::frame::Frame;

/// Anything frames can be pulled from.
///
/// `get_frame` never fails: a service with nothing to offer hands back a test
/// card. `index` selects a track on multi-track services and is ignored
/// elsewhere.
pub trait Service: Send {
    fn get_frame(&mut self, index: usize) -> Frame;

    /// Number of tracks a tractor should pull per output frame.
    fn track_count(&self) -> usize {
        1
    }
}

impl<S: Service + ?Sized> Service for Box<S> {
    fn get_frame(&mut self, index: usize) -> Frame {
        (**self).get_frame(index)
    }

    fn track_count(&self) -> usize {
        (**self).track_count()
    }
}
