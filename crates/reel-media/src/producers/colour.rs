//! Solid colour frames.

use std::sync::Arc;

use reel_core::image::rgb24a_to_yuv422;
use reel_core::{keys, Colour, Context, Frame, Image, ImageFormat, Properties, ReelError};
use tracing::warn;

/// Build a frame whose image is the colour named by the `resource` property.
pub(crate) fn get_frame(properties: &Properties, context: &Arc<Context>) -> Frame {
    let resource = properties.get(keys::RESOURCE).unwrap_or_default();
    let colour = resource.parse::<Colour>().unwrap_or_else(|err| {
        warn!(error = %err, "unparseable colour, using black");
        Colour::BLACK
    });

    let mut frame = Frame::new(context);
    let (width, height) = (frame.width(), frame.height());
    let pushed = frame.push_get_image(Box::new(
        move |frame: &mut Frame, format: ImageFormat, _writable: bool| {
            render(frame, colour, format, width, height)
        },
    ));
    if pushed.is_err() {
        warn!("image stack full on a fresh frame");
    }
    frame
}

fn render(
    frame: &mut Frame,
    colour: Colour,
    format: ImageFormat,
    width: usize,
    height: usize,
) -> reel_core::Result<Image> {
    match format {
        ImageFormat::Rgb24 => Ok(Image::new(
            format,
            width,
            height,
            [colour.r, colour.g, colour.b].repeat(width * height),
        )),
        ImageFormat::Rgb24a => Ok(Image::new(
            format,
            width,
            height,
            bytemuck::bytes_of(&colour).repeat(width * height),
        )),
        _ => {
            let row = bytemuck::bytes_of(&colour).repeat(width);
            let (yuv_row, _) = rgb24a_to_yuv422(&row, width, 1, width * 4);
            frame.set_image(yuv_row.repeat(height), width, height);
            frame.set_alpha(vec![colour.a; width * height]);
            frame
                .image()
                .ok_or_else(|| ReelError::Internal("colour image vanished".into()))
        }
    }
}
