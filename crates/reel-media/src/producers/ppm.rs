//! Frames from a stream of concatenated binary PPM images.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use reel_core::image::rgb24_to_yuv422;
use reel_core::netpbm::{self, PIXMAP};
use reel_core::{keys, Context, Frame, Image, ImageFormat, Position, ReelError, Result};
use tracing::{debug, info};

use crate::producer::FrameSource;

/// Reads one P6 image per frame. Once the stream ends every further frame is
/// a test card.
pub struct PpmSource<R> {
    reader: R,
    frames_read: usize,
}

impl<R: BufRead + Send> PpmSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frames_read: 0,
        }
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }
}

impl PpmSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening PPM stream: {}", path.display());
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead + Send> FrameSource for PpmSource<R> {
    fn get_frame(&mut self, context: &Arc<Context>, position: Position) -> Result<Frame> {
        let mut frame = Frame::new(context);
        let Some(header) = netpbm::read_header(&mut self.reader, PIXMAP)? else {
            debug!(position, "PPM stream exhausted");
            return Ok(frame);
        };
        if header.maxval != 255 {
            return Err(ReelError::Source(format!(
                "PPM maxval {} unsupported, only 8-bit rasters",
                header.maxval
            )));
        }
        let rgb = netpbm::read_raster(&mut self.reader, &header)?;
        self.frames_read += 1;

        let (width, height) = (header.width, header.height);
        frame.properties_mut().set_int(keys::WIDTH, width as i32);
        frame.properties_mut().set_int(keys::HEIGHT, height as i32);
        frame.push_get_image(Box::new(
            move |frame: &mut Frame, format: ImageFormat, _writable: bool| {
                if format == ImageFormat::Rgb24 {
                    return Ok(Image::new(format, width, height, rgb));
                }
                frame.set_image(rgb24_to_yuv422(&rgb, width, height, width * 3), width, height);
                frame
                    .image()
                    .ok_or_else(|| ReelError::Internal("converted image vanished".into()))
            },
        ))?;
        Ok(frame)
    }
}
