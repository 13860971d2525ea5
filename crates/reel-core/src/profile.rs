//! Pipeline-wide configuration and the shared test-card context.
//!
//! A [`Context`] is built once per pipeline and handed to every frame. It owns
//! the stock test-card buffers, which are generated lazily the first time a
//! format is asked for and shared read-only from then on.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::audio::Audio;
use crate::error::{ReelError, Result};
use crate::image::{self, Image, ImageFormat};

/// Current profile schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Default picture and sound parameters for a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Schema version for migration.
    pub version: u32,
    pub width: usize,
    pub height: usize,
    pub aspect_ratio: f64,
    pub fps: f64,
    /// Audio sample rate
    pub frequency: u32,
    pub channels: u16,
    /// Samples per channel in one frame of audio
    pub samples: usize,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            width: 720,
            height: 576,
            aspect_ratio: 4.0 / 3.0,
            fps: 25.0,
            frequency: 48000,
            channels: 2,
            samples: 1920,
        }
    }
}

impl Profile {
    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ReelError::Serialization(format!("Failed to serialize profile: {}", e)))
    }

    /// Deserialize from JSON bytes. Missing fields take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let profile: Profile = serde_json::from_slice(data)
            .map_err(|e| ReelError::Serialization(format!("Invalid profile: {}", e)))?;

        if profile.version > CURRENT_VERSION {
            return Err(ReelError::Serialization(format!(
                "Profile version {} is newer than supported version {}",
                profile.version, CURRENT_VERSION
            )));
        }
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Save the profile to a file path.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::InvalidParameter(format!(
                "profile size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.fps <= 0.0 || self.channels == 0 || self.frequency == 0 {
            return Err(ReelError::InvalidParameter(
                "profile fps, channels and frequency must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Shared pipeline context: the profile plus the lazily built test cards.
#[derive(Debug)]
pub struct Context {
    profile: Profile,
    test_cards: [OnceLock<Image>; 5],
    silence: OnceLock<Audio>,
}

impl Context {
    pub fn new(profile: Profile) -> Arc<Self> {
        Arc::new(Self {
            profile,
            test_cards: Default::default(),
            silence: OnceLock::new(),
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The stock picture for `format`, generated on first use.
    pub fn test_card(&self, format: ImageFormat) -> Image {
        self.test_cards[format.index()]
            .get_or_init(|| {
                tracing::debug!(?format, "generating test card");
                let (width, height) = (self.profile.width, self.profile.height);
                Image::new(format, width, height, image::test_card(format, width, height))
            })
            .clone()
    }

    /// The stock block of silence, generated on first use.
    pub fn silence(&self) -> Audio {
        self.silence
            .get_or_init(|| {
                let p = &self.profile;
                Audio::silence(p.frequency, p.channels, p.samples)
            })
            .clone()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            test_cards: Default::default(),
            silence: OnceLock::new(),
        }
    }
}
