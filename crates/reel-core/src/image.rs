//! Image formats and pixel utilities for interleaved 4:2:2 buffers.
//!
//! The helpers here are pure functions of (buffer, dimensions) and are usually
//! called from inside an image capability rather than by pipeline code.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A shared byte buffer. Cloning shares, writing copies when shared.
pub type SharedBytes = Arc<Vec<u8>>;

/// Image format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    /// No image requested
    None,
    /// 8-bit packed RGB
    Rgb24,
    /// 8-bit packed RGBA
    Rgb24a,
    /// Interleaved Y/UV 4:2:2, the pipeline's native format
    #[default]
    Yuv422,
    /// Planar YUV 4:2:0
    Yuv420p,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::None,
        ImageFormat::Rgb24,
        ImageFormat::Rgb24a,
        ImageFormat::Yuv422,
        ImageFormat::Yuv420p,
    ];

    /// Calculate total bytes needed for an image of this format.
    pub fn buffer_size(self, width: usize, height: usize) -> usize {
        match self {
            Self::None => 0,
            Self::Rgb24 => width * height * 3,
            Self::Rgb24a => width * height * 4,
            Self::Yuv422 => width * height * 2,
            Self::Yuv420p => width * height * 3 / 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::None => 0,
            Self::Rgb24 => 1,
            Self::Rgb24a => 2,
            Self::Yuv422 => 3,
            Self::Yuv420p => 4,
        }
    }
}

/// A resolved image.
#[derive(Debug, Clone)]
pub struct Image {
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    pub data: SharedBytes,
}

impl Image {
    pub fn new(format: ImageFormat, width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            format,
            width,
            height,
            data: Arc::new(data),
        }
    }

    /// Mutable access to the pixels; copies first if the buffer is shared.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        Arc::make_mut(&mut self.data)
    }

    /// A 4:2:2 image whose buffer covers its full size.
    pub fn is_complete_yuv422(&self) -> bool {
        self.format == ImageFormat::Yuv422
            && self.data.len() >= ImageFormat::Yuv422.buffer_size(self.width, self.height)
    }

    /// Whether two images share the same buffer.
    pub fn shares_buffer(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Y and UV values of the black fill used by resize and rescale.
const BLACK: [u8; 2] = [16, 128];

#[inline]
fn rgb_to_yuv(r: i32, g: i32, b: i32) -> (i32, i32, i32) {
    let y = (306 * r + 601 * g + 117 * b) >> 10;
    let u = ((-172 * r - 340 * g + 512 * b) >> 10) + 128;
    let v = ((512 * r - 429 * g - 83 * b) >> 10) + 128;
    (y.clamp(0, 255), u.clamp(0, 255), v.clamp(0, 255))
}

#[inline]
fn yuv_to_rgb(y: i32, u: i32, v: i32) -> [u8; 3] {
    let u = u - 128;
    let v = v - 128;
    let r = y + ((1436 * v) >> 10);
    let g = y - ((352 * u + 731 * v) >> 10);
    let b = y + ((1815 * u) >> 10);
    [r.clamp(0, 255) as u8, g.clamp(0, 255) as u8, b.clamp(0, 255) as u8]
}

/// Pack RGB-like pixels into 4:2:2, `bpp` bytes per source pixel.
fn pack_yuv422(
    src: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    bpp: usize,
    mut alpha: Option<&mut Vec<u8>>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height * 2);
    for row in 0..height {
        let line = &src[row * stride..];
        let mut pixels = line.chunks_exact(bpp).take(width);
        let mut pair = [(0, 0, 0); 2];
        let mut filled = 0;
        for px in pixels.by_ref() {
            if let Some(alpha) = alpha.as_deref_mut() {
                alpha.push(px[3]);
            }
            pair[filled] = rgb_to_yuv(px[0] as i32, px[1] as i32, px[2] as i32);
            filled += 1;
            if filled == 2 {
                let (y0, u0, v0) = pair[0];
                let (y1, u1, v1) = pair[1];
                out.extend_from_slice(&[
                    y0 as u8,
                    ((u0 + u1) >> 1) as u8,
                    y1 as u8,
                    ((v0 + v1) >> 1) as u8,
                ]);
                filled = 0;
            }
        }
        if filled == 1 {
            let (y0, u0, _) = pair[0];
            out.extend_from_slice(&[y0 as u8, u0 as u8]);
        }
    }
    out
}

/// Convert packed RGB to interleaved 4:2:2.
pub fn rgb24_to_yuv422(rgb: &[u8], width: usize, height: usize, stride: usize) -> Vec<u8> {
    pack_yuv422(rgb, width, height, stride, 3, None)
}

/// Convert packed RGBA to interleaved 4:2:2, splitting out the alpha mask.
pub fn rgb24a_to_yuv422(
    rgba: &[u8],
    width: usize,
    height: usize,
    stride: usize,
) -> (Vec<u8>, Vec<u8>) {
    let mut alpha = Vec::with_capacity(width * height);
    let yuv = pack_yuv422(rgba, width, height, stride, 4, Some(&mut alpha));
    (yuv, alpha)
}

/// Convert interleaved 4:2:2 back to packed RGB.
pub fn yuv422_to_rgb24(yuv: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height * 3);
    for row in yuv.chunks_exact(width * 2).take(height) {
        let mut macro_pixels = row.chunks_exact(4);
        for m in macro_pixels.by_ref() {
            let (u, v) = (m[1] as i32, m[3] as i32);
            out.extend_from_slice(&yuv_to_rgb(m[0] as i32, u, v));
            out.extend_from_slice(&yuv_to_rgb(m[2] as i32, u, v));
        }
        if let [y, u] = macro_pixels.remainder() {
            out.extend_from_slice(&yuv_to_rgb(*y as i32, *u as i32, 128));
        }
    }
    out
}

/// Blend `src` onto `dest` at (`x`, `y`), weighting each pixel by `weight`
/// and the optional per-pixel alpha mask of the source.
///
/// Pixels falling outside the destination are clipped. `x` is rounded down to
/// an even column so chroma pairs stay aligned.
#[allow(clippy::too_many_arguments)]
pub fn composite_yuv(
    dest: &mut [u8],
    dest_width: usize,
    dest_height: usize,
    src: &[u8],
    src_width: usize,
    src_height: usize,
    alpha: Option<&[u8]>,
    x: i32,
    y: i32,
    weight: f32,
) {
    let x = (x as i64) & !1;
    let y = y as i64;
    for i in 0..src_height {
        let dy = y + i as i64;
        if dy < 0 || dy >= dest_height as i64 {
            continue;
        }
        for j in 0..src_width {
            let dx = x + j as i64;
            if dx < 0 || dx >= dest_width as i64 {
                continue;
            }
            let a = alpha.and_then(|mask| mask.get(i * src_width + j)).copied().unwrap_or(255);
            let value = weight * a as f32 / 255.0;
            let s = (i * src_width + j) * 2;
            let d = (dy as usize * dest_width + dx as usize) * 2;
            for c in 0..2 {
                let blended = src[s + c] as f32 * value + dest[d + c] as f32 * (1.0 - value);
                dest[d + c] = blended as u8;
            }
        }
    }
}

/// Resize without scaling: centre the input on an output canvas, cropping or
/// padding with black.
pub fn resize_yuv422(
    input: &[u8],
    iwidth: usize,
    iheight: usize,
    owidth: usize,
    oheight: usize,
) -> Vec<u8> {
    let offset_x = ((iwidth as i64 - owidth as i64) / 2) & !1;
    let offset_y = (iheight as i64 - oheight as i64) / 2;
    let mut output = Vec::with_capacity(owidth * oheight * 2);
    for oy in 0..oheight as i64 {
        let sy = oy + offset_y;
        for ox in 0..owidth as i64 {
            let sx = ox + offset_x;
            if sx >= 0 && sy >= 0 && (sx as usize) < iwidth && (sy as usize) < iheight {
                let s = (sy as usize * iwidth + sx as usize) * 2;
                output.extend_from_slice(&input[s..s + 2]);
            } else {
                output.extend_from_slice(&BLACK);
            }
        }
    }
    output
}

/// Nearest-neighbour rescale, copying whole macro pixels so chroma stays paired.
pub fn rescale_yuv422(
    input: &[u8],
    iwidth: usize,
    iheight: usize,
    owidth: usize,
    oheight: usize,
) -> Vec<u8> {
    let mut output = Vec::with_capacity(owidth * oheight * 2);
    let in_pairs = iwidth / 2;
    let out_pairs = owidth / 2;
    for oy in 0..oheight {
        let sy = oy * iheight / oheight.max(1);
        for op in 0..out_pairs {
            let sp = op * in_pairs / out_pairs.max(1);
            if sy < iheight && sp < in_pairs {
                let s = sy * iwidth * 2 + sp * 4;
                output.extend_from_slice(&input[s..s + 4]);
            } else {
                output.extend_from_slice(&[BLACK[0], BLACK[1], BLACK[0], BLACK[1]]);
            }
        }
        if owidth % 2 == 1 {
            output.extend_from_slice(&BLACK);
        }
    }
    output
}

/// Build the stock test-card picture for a format.
pub fn test_card(format: ImageFormat, width: usize, height: usize) -> Vec<u8> {
    match format {
        ImageFormat::None => Vec::new(),
        ImageFormat::Rgb24 | ImageFormat::Rgb24a | ImageFormat::Yuv420p => {
            vec![255; format.buffer_size(width, height)]
        }
        ImageFormat::Yuv422 => [255u8, 128].repeat(width * height),
    }
}
