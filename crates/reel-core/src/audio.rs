//! Audio buffers and sample mixing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared interleaved sample buffer.
pub type SharedSamples = Arc<Vec<i16>>;

/// Audio format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioFormat {
    None,
    /// Signed 16-bit interleaved PCM
    #[default]
    Pcm16,
}

/// A resolved block of audio.
#[derive(Debug, Clone)]
pub struct Audio {
    pub format: AudioFormat,
    pub frequency: u32,
    pub channels: u16,
    /// Samples per channel
    pub samples: usize,
    pub data: SharedSamples,
}

impl Audio {
    pub fn new(frequency: u32, channels: u16, samples: usize, data: Vec<i16>) -> Self {
        Self {
            format: AudioFormat::Pcm16,
            frequency,
            channels,
            samples,
            data: Arc::new(data),
        }
    }

    /// A block of silence.
    pub fn silence(frequency: u32, channels: u16, samples: usize) -> Self {
        Self::new(frequency, channels, samples, vec![0; samples * channels as usize])
    }

    pub fn data_mut(&mut self) -> &mut Vec<i16> {
        Arc::make_mut(&mut self.data)
    }

    pub fn is_silent(&self) -> bool {
        self.data.iter().all(|&s| s == 0)
    }
}

/// Crossfade two interleaved buffers: `weight` 0.0 keeps `a`, 1.0 gives `b`.
///
/// The result has the length of `a`; missing samples in `b` count as silence.
pub fn mix_samples(a: &[i16], b: &[i16], weight: f64) -> Vec<i16> {
    let weight = weight.clamp(0.0, 1.0);
    a.iter()
        .enumerate()
        .map(|(i, &sa)| {
            let sb = b.get(i).copied().unwrap_or(0);
            let mixed = sa as f64 * (1.0 - weight) + sb as f64 * weight;
            mixed.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
        })
        .collect()
}

/// Number of samples per channel for one frame at `fps`.
pub fn samples_per_frame(frequency: u32, fps: f64) -> usize {
    if fps <= 0.0 {
        return 0;
    }
    (frequency as f64 / fps).round() as usize
}
