//! Luma wipe: B is revealed over A in the order given by a greyscale map.
//!
//! Each map value in `0.0..=1.0` is the point in the transition at which that
//! pixel switches from A to B; `softness` widens the switch into a ramp.
//! Without a map the wipe degrades to a plain dissolve.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use reel_core::netpbm::{self, GREYMAP};
use reel_core::{keys, AudioFormat, Frame, Image, ImageFormat, Properties, ReelError, Result};
use tracing::{debug, info, warn};

/// A luma map: one threshold per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LumaMap {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl LumaMap {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::InvalidParameter(format!(
                "luma map of {}x{} is empty",
                width, height
            )));
        }
        if width.checked_mul(height) != Some(values.len()) {
            return Err(ReelError::InvalidParameter(format!(
                "luma map of {}x{} got {} values",
                width,
                height,
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// A left-to-right wipe.
    pub fn horizontal(width: usize, height: usize) -> Result<Self> {
        let row: Vec<f64> = (0..width).map(|x| x as f64 / width as f64).collect();
        Self::new(width, height, row.repeat(height))
    }

    /// Parse a binary greymap (P5).
    pub fn from_pgm<R: BufRead>(reader: &mut R) -> Result<Self> {
        let header = netpbm::read_header(reader, GREYMAP)?
            .ok_or_else(|| ReelError::Serialization("empty luma map".into()))?;
        let raster = netpbm::read_raster(reader, &header)?;
        Self::new(
            header.width,
            header.height,
            netpbm::normalised_samples(&raster, &header),
        )
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading luma map: {}", path.display());
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_pgm(&mut reader)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Nearest-neighbour resample to `width` x `height`. A zero target
    /// leaves the map as it is.
    pub fn rescaled(&self, width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            return self.clone();
        }
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = y * self.height / height;
            for x in 0..width {
                let sx = x * self.width / width;
                values.push(self.values[sy * self.width + sx]);
            }
        }
        Self {
            width,
            height,
            values,
        }
    }
}

/// Per-transition luma state: the map and where it came from.
#[derive(Debug, Default)]
pub struct LumaState {
    map: Option<Arc<LumaMap>>,
    loaded_from: Option<String>,
    previous_mix: f64,
}

impl LumaState {
    pub fn new(map: Option<LumaMap>) -> Self {
        Self {
            map: map.map(Arc::new),
            ..Self::default()
        }
    }

    pub fn map(&self) -> Option<&LumaMap> {
        self.map.as_deref()
    }

    /// Load the map named by the transition's `resource` when it changes.
    fn reload(&mut self, properties: &Properties) {
        let Some(path) = properties.get(keys::RESOURCE) else {
            return;
        };
        if self.loaded_from.as_deref() == Some(path) {
            return;
        }
        self.loaded_from = Some(path.to_owned());
        match LumaMap::load(path) {
            Ok(map) => self.map = Some(Arc::new(map)),
            Err(err) => warn!(error = %err, path, "luma map not loaded, dissolving instead"),
        }
    }
}

fn smoothstep(edge1: f64, edge2: f64, a: f64) -> f64 {
    if a < edge1 {
        return 0.0;
    }
    if a >= edge2 {
        return 1.0;
    }
    let a = (a - edge1) / (edge2 - edge1);
    a * a * (3.0 - 2.0 * a)
}

/// Stamp the wipe position on B and defer the wipe to A's image and audio.
pub(crate) fn process(
    state: &mut LumaState,
    properties: &Properties,
    mut a_frame: Frame,
    mut b_frame: Frame,
) -> Frame {
    state.reload(properties);

    let in_point = properties.get_timecode(keys::IN);
    let out_point = properties.get_timecode(keys::OUT);
    let position = if out_point > in_point {
        (b_frame.timecode() - in_point) / (out_point - in_point)
    } else {
        0.0
    };
    // Running backwards restarts the field delta
    let delta = if position < state.previous_mix {
        position
    } else {
        position - state.previous_mix
    };
    state.previous_mix = position;

    let b_props = b_frame.properties_mut();
    b_props.set_double(keys::MIX, position);
    if properties.contains(keys::SOFTNESS) {
        b_props.set_double(keys::LUMA_SOFTNESS, properties.get_double(keys::SOFTNESS));
    }
    debug!(position, delta, has_map = state.map.is_some(), "luma wipe");

    let map = state.map.clone();
    let image_pushed = a_frame.push_get_image(Box::new(
        move |frame: &mut Frame, format: ImageFormat, writable: bool| {
            let Some(mut b_frame) = frame.pop_frame() else {
                return Ok(frame.get_image(format, writable));
            };
            let b_props = b_frame.properties();
            let mix = b_props.get_double(keys::MIX);
            let softness = b_props.get_double(keys::LUMA_SOFTNESS);
            let field_order = if b_props.get_int(keys::PROGRESSIVE) > 0 {
                -1
            } else {
                b_props.get_int(keys::TOP_FIELD_FIRST)
            };
            let image = match &map {
                Some(map) => wipe(frame, &mut b_frame, map, mix, delta, softness, field_order),
                None => frame.composite_yuv(&mut b_frame, 0, 0, mix as f32),
            };
            b_frame.close();
            Ok(image)
        },
    ));
    if image_pushed.is_err() {
        warn!("image stack full, luma wipe skipped");
        b_frame.close();
        return a_frame;
    }

    let audio_pushed = a_frame.push_get_audio(Box::new(|frame: &mut Frame, format: AudioFormat| {
        let Some(mut b_frame) = frame.pop_frame() else {
            return Ok(frame.get_audio(format));
        };
        let mix = b_frame.properties().get_double(keys::MIX);
        let audio = frame.mix_audio(&mut b_frame, mix);
        if let Err(full) = frame.push_frame(b_frame) {
            full.into_inner().close();
        }
        Ok(audio)
    }));
    if audio_pushed.is_err() {
        warn!("audio stack full, luma audio left unmixed");
    }

    if let Err(full) = a_frame.push_frame(b_frame) {
        warn!("frame stack full, luma has no B frame");
        full.into_inner().close();
    }
    a_frame
}

/// Blend B into A's picture pixel by pixel according to `map`.
///
/// `field_order` is -1 for progressive material, 0 for lower field first and
/// 1 for top field first. Interlaced fields are offset by half of `delta`.
#[allow(clippy::too_many_arguments)]
fn wipe(
    a_frame: &mut Frame,
    b_frame: &mut Frame,
    map: &LumaMap,
    position: f64,
    delta: f64,
    softness: f64,
    field_order: i32,
) -> Image {
    let mut dest = a_frame.get_image(ImageFormat::Yuv422, true);
    let src = b_frame.get_image(ImageFormat::Yuv422, false);
    if !dest.is_complete_yuv422() || !src.is_complete_yuv422() {
        warn!("luma wipe needs complete 4:2:2 pictures, skipping");
        return dest;
    }

    let scaled;
    let map = if map.width != src.width || map.height != src.height {
        scaled = map.rescaled(src.width, src.height);
        &scaled
    } else {
        map
    };

    let (width, height) = (src.width.min(dest.width), src.height.min(dest.height));
    let dest_width = dest.width;
    let (fields, step) = if field_order < 0 { (1, 1) } else { (2, 2) };
    let out = dest.data_mut();
    for field in 0..fields {
        let offset = (if field_order == 0 { 1 - field } else { field }) as f64;
        let field_position = (position + offset * delta * 0.5) * (1.0 + softness);
        for i in (field..height).step_by(step) {
            for j in 0..width {
                let threshold = map.values[i * map.width + j];
                let value = smoothstep(threshold, threshold + softness, field_position);
                let s = (i * src.width + j) * 2;
                let d = (i * dest_width + j) * 2;
                for c in 0..2 {
                    let mixed = src.data[s + c] as f64 * value + out[d + c] as f64 * (1.0 - value);
                    out[d + c] = mixed as u8;
                }
            }
        }
    }

    a_frame.set_shared_image(Arc::clone(&dest.data), dest.width, dest.height);
    dest
}
