//! Binary netpbm (P5 greymap, P6 pixmap) header and raster reading.
//!
//! Used for luma wipe maps and raw RGB frame streams. Only the binary
//! variants are supported; plain-text rasters are rejected.

use std::io::{BufRead, Read};

use crate::error::{ReelError, Result};

/// Binary greymap magic.
pub const GREYMAP: [u8; 2] = *b"P5";
/// Binary pixmap magic.
pub const PIXMAP: [u8; 2] = *b"P6";

/// Largest accepted raster, in pixels.
pub const MAX_PIXELS: usize = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 2],
    pub width: usize,
    pub height: usize,
    pub maxval: u32,
}

impl Header {
    /// Bytes per sample: two when maxval needs more than eight bits.
    pub fn bytes_per_sample(&self) -> usize {
        if self.maxval > 255 {
            2
        } else {
            1
        }
    }

    pub fn channels(&self) -> usize {
        if self.magic == PIXMAP {
            3
        } else {
            1
        }
    }

    /// Size in bytes of the raster following the header.
    pub fn raster_len(&self) -> Result<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|pixels| pixels.checked_mul(self.channels() * self.bytes_per_sample()))
            .ok_or_else(|| invalid("raster size overflows"))
    }
}

fn invalid(msg: &str) -> ReelError {
    ReelError::Serialization(format!("Invalid netpbm data: {}", msg))
}

fn read_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let byte = match reader.fill_buf()?.first() {
        Some(&b) => b,
        None => return Ok(None),
    };
    reader.consume(1);
    Ok(Some(byte))
}

fn skip_comment<R: BufRead>(reader: &mut R) -> Result<()> {
    while let Some(byte) = read_byte(reader)? {
        if byte == b'\n' {
            break;
        }
    }
    Ok(())
}

/// Read one decimal header field, consuming the single whitespace byte after it.
fn read_number<R: BufRead>(reader: &mut R) -> Result<u32> {
    let mut value: Option<u32> = None;
    loop {
        let byte = read_byte(reader)?.ok_or_else(|| invalid("truncated header"))?;
        match byte {
            b'#' if value.is_none() => skip_comment(reader)?,
            b'0'..=b'9' => {
                let digit = (byte - b'0') as u32;
                value = Some(
                    value
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or_else(|| invalid("header field overflows"))?,
                );
            }
            b if b.is_ascii_whitespace() => {
                if let Some(value) = value {
                    return Ok(value);
                }
            }
            _ => return Err(invalid("unexpected byte in header")),
        }
    }
}

/// Read a header expecting `magic`. Returns `None` at a clean end of stream.
pub fn read_header<R: BufRead>(reader: &mut R, magic: [u8; 2]) -> Result<Option<Header>> {
    let first = match read_byte(reader)? {
        Some(b) => b,
        None => return Ok(None),
    };
    let second = read_byte(reader)?.ok_or_else(|| invalid("truncated magic"))?;
    if [first, second] != magic {
        return Err(invalid("unexpected magic"));
    }

    let width = read_number(reader)? as usize;
    let height = read_number(reader)? as usize;
    let maxval = read_number(reader)?;
    if width == 0 || height == 0 || maxval == 0 || maxval > 65535 {
        return Err(invalid("bad dimensions or maxval"));
    }
    if width.checked_mul(height).map_or(true, |pixels| pixels > MAX_PIXELS) {
        return Err(invalid("dimensions too large"));
    }
    Ok(Some(Header {
        magic,
        width,
        height,
        maxval,
    }))
}

/// Read the raster that follows `header`.
///
/// The buffer grows with the bytes actually read, so a header promising more
/// than the stream holds fails without allocating the promised size.
pub fn read_raster<R: BufRead>(reader: &mut R, header: &Header) -> Result<Vec<u8>> {
    let len = header.raster_len()?;
    let mut raster = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut raster)?;
    if raster.len() != len {
        return Err(invalid("truncated raster"));
    }
    Ok(raster)
}

/// Samples of a raster scaled to `0.0..=1.0` by the header's maxval.
pub fn normalised_samples(raster: &[u8], header: &Header) -> Vec<f64> {
    let maxval = header.maxval as f64;
    match header.bytes_per_sample() {
        1 => raster.iter().map(|&v| v as f64 / maxval).collect(),
        _ => raster
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as f64 / maxval)
            .collect(),
    }
}
