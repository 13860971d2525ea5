//! Reel Core - Foundation types for the Reel media pipeline
//!
//! This crate provides the building blocks every service shares:
//! - The typed property store ([`Properties`], [`Property`])
//! - Frames with lazily resolved image and audio ([`Frame`])
//! - Pixel formats and 4:2:2 pixel helpers ([`image`], [`netpbm`])
//! - The profile and shared test-card [`Context`]
//! - The pull interface implemented by services ([`Service`])

pub mod audio;
pub mod colour;
pub mod error;
pub mod frame;
pub mod image;
pub mod keys;
pub mod netpbm;
pub mod profile;
pub mod properties;
pub mod property;
pub mod service;
pub mod stack;

pub use audio::{Audio, AudioFormat, SharedSamples};
pub use colour::Colour;
pub use error::{ReelError, Result, StackFull};
pub use frame::{Frame, GetAudio, GetImage};
pub use image::{Image, ImageFormat, SharedBytes};
pub use profile::{Context, Profile};
pub use properties::Properties;
pub use property::{OpaqueData, Position, Property, PropertyKind, Timecode};
pub use service::Service;
pub use stack::{BoundedStack, STACK_CAPACITY};
