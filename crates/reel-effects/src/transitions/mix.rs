//! Audio crossfade between the A and B frames.

use reel_core::{keys, AudioFormat, Frame, Properties, Timecode};
use tracing::warn;

/// Level used when neither the transition nor the B frame sets one.
const DEFAULT_MIX: f64 = 0.5;

/// Position of `time` within the window `[in, out]`, as used by an
/// automatic crossfade.
pub(crate) fn crossfade(time: Timecode, in_point: Timecode, out_point: Timecode) -> f64 {
    (time - in_point) / (out_point - in_point + 1.0)
}

/// Stamp the mix level on B, then let A's audio resolve through B.
pub(crate) fn process(properties: &Properties, mut a_frame: Frame, mut b_frame: Frame) -> Frame {
    // Without a level on the transition the B frame's own level stands
    if properties.contains(keys::MIX) {
        let level = properties.get_double(keys::MIX);
        let level = if level < 0.0 {
            crossfade(
                b_frame.timecode(),
                properties.get_timecode(keys::IN),
                properties.get_timecode(keys::OUT),
            )
        } else {
            level
        };
        let b_props = b_frame.properties_mut();
        b_props.set_double(keys::AUDIO_MIX, level);
        b_props.set_int(keys::AUDIO_REVERSE, properties.get_int(keys::REVERSE));
    }

    let pushed = a_frame.push_get_audio(Box::new(|frame: &mut Frame, format: AudioFormat| {
        let Some(mut b_frame) = frame.pop_frame() else {
            return Ok(frame.get_audio(format));
        };
        let b_props = b_frame.properties();
        let mut level = if b_props.contains(keys::AUDIO_MIX) {
            b_props.get_double(keys::AUDIO_MIX)
        } else {
            DEFAULT_MIX
        };
        if b_props.get_int(keys::AUDIO_REVERSE) != 0 {
            level = 1.0 - level;
        }
        let audio = frame.mix_audio(&mut b_frame, level);
        // B goes back for any image capability still to run
        if let Err(full) = frame.push_frame(b_frame) {
            full.into_inner().close();
        }
        Ok(audio)
    }));
    if pushed.is_err() {
        warn!("audio stack full, mix skipped");
        b_frame.close();
        return a_frame;
    }

    if let Err(full) = a_frame.push_frame(b_frame) {
        warn!("frame stack full, mixing against silence");
        full.into_inner().close();
    }
    a_frame
}
