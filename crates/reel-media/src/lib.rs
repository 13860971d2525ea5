//! Reel Media - frame sources for the pipeline
//!
//! This crate handles:
//! - The producer state machine (in/out, speed, position, end-of-stream policy)
//! - Built-in producer kinds: blank, solid colour, sine tone
//! - External frame sources, including raw PPM streams
//! - Multitracks and the tractor that drives them

pub mod multitrack;
pub mod producer;
pub mod producers;
pub mod tractor;

pub use multitrack::Multitrack;
pub use producer::{Eof, FrameSource, Producer, ProducerKind};
pub use producers::PpmSource;
pub use tractor::Tractor;
