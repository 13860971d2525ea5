//! Stable property key names.
//!
//! These names are the contract between the pipeline and its collaborators.
//! Renaming any of them is a breaking change.

// === Timing ===
/// Frames per second
pub const FPS: &str = "fps";
/// Playback speed (1.0 forward, 0.0 paused, negative reverse)
pub const SPEED: &str = "speed";
/// Position relative to the in point
pub const POSITION: &str = "position";
/// Absolute frame index (in + position)
pub const FRAME: &str = "frame";
/// In point
pub const IN: &str = "in";
/// Out point
pub const OUT: &str = "out";
/// Total length in frames
pub const LENGTH: &str = "length";
/// End-of-stream policy ("pause" or "continue")
pub const EOF: &str = "eof";
/// Timecode of a frame
pub const TIMECODE: &str = "timecode";

// === Identity ===
/// Resource string the producer was built from
pub const RESOURCE: &str = "resource";
/// Service type tag
pub const SERVICE: &str = "service";

// === Image ===
/// Image width in pixels
pub const WIDTH: &str = "width";
/// Image height in pixels
pub const HEIGHT: &str = "height";
/// Display aspect ratio
pub const ASPECT_RATIO: &str = "aspect_ratio";
/// Raw image buffer
pub const IMAGE: &str = "image";
/// Alpha mask, one byte per pixel
pub const ALPHA: &str = "alpha";
/// Interlace flag
pub const PROGRESSIVE: &str = "progressive";
/// Field order for interlaced material
pub const TOP_FIELD_FIRST: &str = "top_field_first";

// === Audio ===
/// Interleaved sample buffer
pub const AUDIO: &str = "audio";
/// Sample rate of the raw audio buffer; pitch in Hz on a tone producer
pub const FREQUENCY: &str = "frequency";
/// Channel count of the raw audio buffer
pub const CHANNELS: &str = "channels";
/// Samples per channel in the raw audio buffer
pub const SAMPLES: &str = "samples";
/// Linear amplitude of a tone, 0.0 to 1.0
pub const LEVEL: &str = "level";
/// Starting phase of a tone in radians
pub const PHASE: &str = "phase";

// === Transitions ===
/// Index of the A track
pub const A_TRACK: &str = "a_track";
/// Index of the B track
pub const B_TRACK: &str = "b_track";
/// Mix level
pub const MIX: &str = "mix";
/// Swap the mix direction
pub const REVERSE: &str = "reverse";
/// Horizontal composite offset
pub const X: &str = "x";
/// Vertical composite offset
pub const Y: &str = "y";
/// Audio mix level stamped on a B frame
pub const AUDIO_MIX: &str = "audio.mix";
/// Audio mix reversal stamped on a B frame
pub const AUDIO_REVERSE: &str = "audio.reverse";
/// Luma wipe softness
pub const SOFTNESS: &str = "softness";
/// Luma wipe softness stamped on a B frame
pub const LUMA_SOFTNESS: &str = "luma.softness";
