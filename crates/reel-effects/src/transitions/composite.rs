//! Lay the B frame over the A frame.

use reel_core::{keys, Frame, ImageFormat, Properties};
use tracing::warn;

/// Copy the placement onto B and defer the composite to A's image resolution.
pub(crate) fn process(properties: &Properties, mut a_frame: Frame, mut b_frame: Frame) -> Frame {
    let b_props = b_frame.properties_mut();
    if properties.contains(keys::X) {
        b_props.set_int(keys::X, properties.get_int(keys::X));
    }
    if properties.contains(keys::Y) {
        b_props.set_int(keys::Y, properties.get_int(keys::Y));
    }
    if properties.contains(keys::MIX) {
        b_props.set_double(keys::MIX, properties.get_double(keys::MIX));
    }

    let pushed = a_frame.push_get_image(Box::new(
        |frame: &mut Frame, format: ImageFormat, writable: bool| {
            let Some(mut b_frame) = frame.pop_frame() else {
                return Ok(frame.get_image(format, writable));
            };
            let b_props = b_frame.properties();
            let x = if b_props.contains(keys::X) { b_props.get_int(keys::X) } else { 0 };
            let y = if b_props.contains(keys::Y) { b_props.get_int(keys::Y) } else { 0 };
            let mix = if b_props.contains(keys::MIX) {
                b_props.get_double(keys::MIX)
            } else {
                1.0
            };
            let image = frame.composite_yuv(&mut b_frame, x, y, mix as f32);
            b_frame.close();
            Ok(image)
        },
    ));
    if pushed.is_err() {
        warn!("image stack full, composite skipped");
        b_frame.close();
        return a_frame;
    }
    if let Err(full) = a_frame.push_frame(b_frame) {
        warn!("frame stack full, composite has no B frame");
        full.into_inner().close();
    }
    a_frame
}
