//! Reel Consumer - threaded frame consumer
//!
//! Architecture:
//! - `Consumer`: owns a service on a worker thread; one pending render
//!   command at a time through a mutex/condvar rendezvous
//! - `AudioQueue`: separately locked buffer of rendered audio
//! - Rendered frames are announced on a channel for monitoring

pub mod audio_queue;
pub mod consumer;

pub use audio_queue::{AudioQueue, DEFAULT_AUDIO_FRAMES};
pub use consumer::{Consumer, RenderedFrame};
