//! Sine tone audio.

use std::f64::consts::TAU;
use std::sync::Arc;

use reel_core::audio::samples_per_frame;
use reel_core::{keys, Audio, AudioFormat, Context, Frame, Position, Properties};
use tracing::warn;

/// Build a frame carrying one frame's worth of sine tone starting at `position`.
///
/// The image stays a test card.
pub(crate) fn get_frame(
    properties: &Properties,
    context: &Arc<Context>,
    position: Position,
) -> Frame {
    let pitch = properties.get_double(keys::FREQUENCY);
    let level = properties.get_double(keys::LEVEL).clamp(0.0, 1.0);
    let phase = properties.get_double(keys::PHASE);
    let fps = properties.get_double(keys::FPS);

    let mut frame = Frame::new(context);
    let pushed = frame.push_get_audio(Box::new(move |frame: &mut Frame, _format: AudioFormat| {
        let profile = frame.context().profile();
        let (rate, channels) = (profile.frequency, profile.channels);
        let samples = samples_per_frame(rate, fps);
        let offset = if fps > 0.0 { position / fps * rate as f64 } else { 0.0 };
        let amplitude = level * i16::MAX as f64;

        let mut data = Vec::with_capacity(samples * channels as usize);
        for i in 0..samples {
            let t = (offset + i as f64) / rate as f64;
            let value = (amplitude * (TAU * pitch * t + phase).sin()).round() as i16;
            data.extend(std::iter::repeat(value).take(channels as usize));
        }
        Ok(Audio::new(rate, channels, samples, data))
    }));
    if pushed.is_err() {
        warn!("audio stack full on a fresh frame");
    }
    frame
}
