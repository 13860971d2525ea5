//! The producer: a position-addressable frame source.
//!
//! A producer owns a single state variable, its position relative to the in
//! point. Every fetch hands out one frame for the current position and then
//! advances by the playback speed. Timing state lives in the producer's
//! property store under the keys in [`reel_core::keys`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reel_core::{keys, Context, Frame, Position, Properties, ReelError, Result, Service};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::producers::{colour, tone};

/// Default out point: a very long, effectively unknown duration.
pub const DEFAULT_OUT: Position = 1_799_999.0;
/// Default length, one past [`DEFAULT_OUT`].
pub const DEFAULT_LENGTH: Position = 1_800_000.0;
/// Resource string of a producer built without one.
pub const DEFAULT_RESOURCE: &str = "<producer>";

/// What happens when playback runs past the out point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eof {
    /// Hold the last position.
    #[default]
    Pause,
    /// Keep advancing and hand out test cards.
    Continue,
}

impl Eof {
    pub fn as_str(self) -> &'static str {
        match self {
            Eof::Pause => "pause",
            Eof::Continue => "continue",
        }
    }
}

impl FromStr for Eof {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pause" => Ok(Eof::Pause),
            "continue" => Ok(Eof::Continue),
            other => Err(ReelError::InvalidParameter(format!("unknown eof policy '{other}'"))),
        }
    }
}

impl fmt::Display for Eof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external frame supplier, such as a decoder.
///
/// Failures are absorbed by the producer, which logs them and substitutes a
/// test card.
pub trait FrameSource: Send {
    fn get_frame(&mut self, context: &Arc<Context>, position: Position) -> Result<Frame>;

    fn close(&mut self) {}
}

/// The concrete computation behind a producer.
pub enum ProducerKind {
    /// Nothing attached: every frame is a test card.
    Blank,
    /// Solid colour parsed from the `resource` property.
    Colour,
    /// Sine tone from the `frequency`, `level` and `phase` properties.
    Tone,
    Source(Box<dyn FrameSource>),
}

impl fmt::Debug for ProducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProducerKind::Blank => "Blank",
            ProducerKind::Colour => "Colour",
            ProducerKind::Tone => "Tone",
            ProducerKind::Source(_) => "Source",
        })
    }
}

#[derive(Debug)]
pub struct Producer {
    properties: Properties,
    kind: ProducerKind,
    context: Arc<Context>,
}

impl Producer {
    pub fn new(context: &Arc<Context>, kind: ProducerKind) -> Self {
        let profile = context.profile();
        let mut properties = Properties::new();
        properties.set(keys::SERVICE, "producer");
        properties.set_position(keys::POSITION, 0.0);
        properties.set_position(keys::FRAME, 0.0);
        properties.set_double(keys::FPS, profile.fps);
        properties.set_double(keys::SPEED, 1.0);
        properties.set_position(keys::IN, 0.0);
        properties.set_position(keys::OUT, DEFAULT_OUT);
        properties.set_position(keys::LENGTH, DEFAULT_LENGTH);
        properties.set_double(keys::ASPECT_RATIO, profile.aspect_ratio);
        properties.set(keys::EOF, Eof::Pause.as_str());
        properties.set(keys::RESOURCE, DEFAULT_RESOURCE);
        Self {
            properties,
            kind,
            context: Arc::clone(context),
        }
    }

    /// A producer that only ever hands out test cards.
    pub fn blank(context: &Arc<Context>) -> Self {
        Self::new(context, ProducerKind::Blank)
    }

    /// A solid colour, given as a name or `0xRRGGBBAA`.
    pub fn colour(context: &Arc<Context>, colour: &str) -> Self {
        let mut producer = Self::new(context, ProducerKind::Colour);
        producer.properties.set(keys::RESOURCE, colour);
        producer
    }

    /// A full-scale sine tone at `pitch` Hz.
    pub fn tone(context: &Arc<Context>, pitch: f64) -> Self {
        let mut producer = Self::new(context, ProducerKind::Tone);
        producer.properties.set_double(keys::FREQUENCY, pitch);
        producer.properties.set_double(keys::LEVEL, 1.0);
        producer.properties.set_double(keys::PHASE, 0.0);
        producer
    }

    pub fn source(context: &Arc<Context>, source: Box<dyn FrameSource>) -> Self {
        Self::new(context, ProducerKind::Source(source))
    }

    pub fn kind(&self) -> &ProducerKind {
        &self.kind
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn fps(&self) -> f64 {
        self.properties.get_double(keys::FPS)
    }

    pub fn speed(&self) -> f64 {
        self.properties.get_double(keys::SPEED)
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.properties.set_double(keys::SPEED, speed);
    }

    pub fn in_point(&self) -> Position {
        self.properties.get_position(keys::IN)
    }

    pub fn out_point(&self) -> Position {
        self.properties.get_position(keys::OUT)
    }

    pub fn length(&self) -> Position {
        self.properties.get_position(keys::LENGTH)
    }

    /// Number of addressable positions: `out - in + 1`.
    pub fn playtime(&self) -> Position {
        self.out_point() - self.in_point() + 1.0
    }

    /// Position relative to the in point.
    pub fn position(&self) -> Position {
        self.properties.get_position(keys::POSITION)
    }

    /// Absolute frame index, `in + position`.
    pub fn frame(&self) -> Position {
        self.properties.get_position(keys::FRAME)
    }

    /// The end-of-stream policy. Unrecognised values behave as [`Eof::Pause`].
    pub fn eof(&self) -> Eof {
        self.properties
            .get(keys::EOF)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_eof(&mut self, eof: Eof) {
        self.properties.set(keys::EOF, eof.as_str());
    }

    /// Set the usable range. Both points are clamped to `[0, length]` and
    /// swapped when given in the wrong order.
    pub fn set_in_and_out(&mut self, in_point: Position, out_point: Position) {
        let length = self.length();
        let mut in_point = in_point.clamp(0.0, length);
        let mut out_point = out_point.clamp(0.0, length);
        if out_point < in_point {
            std::mem::swap(&mut in_point, &mut out_point);
        }
        self.properties.set_position(keys::IN, in_point);
        self.properties.set_position(keys::OUT, out_point);
    }

    /// Move to `position`.
    ///
    /// Negative targets go to 0. Under [`Eof::Pause`] targets at or beyond the
    /// playtime are held at the last position.
    pub fn seek(&mut self, position: Position) {
        let playtime = self.playtime();
        let position = if position < 0.0 {
            0.0
        } else if self.eof() == Eof::Pause && position >= playtime {
            playtime - 1.0
        } else {
            position
        };
        self.properties.set_position(keys::POSITION, position);
        let frame = self.in_point() + position;
        self.properties.set_position(keys::FRAME, frame);
    }

    /// Advance by the playback speed.
    pub fn prepare_next(&mut self) {
        self.seek(self.position() + self.speed());
    }

    /// Hand out the frame for the current position, then advance.
    ///
    /// Never fails: with nothing attached, past the out point under
    /// [`Eof::Continue`], or when the source errors, the frame is a test card.
    /// The producer's fps and speed are stamped on every frame.
    pub fn get_frame(&mut self, _index: usize) -> Frame {
        let position = self.position();
        let past_end = self.eof() == Eof::Continue && position > self.out_point();

        let produced = if past_end {
            debug!(position, "past the out point, using test card");
            None
        } else {
            match &mut self.kind {
                ProducerKind::Blank => None,
                ProducerKind::Colour => Some(colour::get_frame(&self.properties, &self.context)),
                ProducerKind::Tone => {
                    Some(tone::get_frame(&self.properties, &self.context, position))
                }
                ProducerKind::Source(source) => match source.get_frame(&self.context, position) {
                    Ok(frame) => Some(frame),
                    Err(err) => {
                        warn!(error = %err, position, "source failed, using test card");
                        None
                    }
                },
            }
        };

        let mut frame = produced.unwrap_or_else(|| Frame::new(&self.context));
        frame.set_timecode(position);
        self.prepare_next();

        let properties = frame.properties_mut();
        properties.set_double(keys::FPS, self.fps());
        properties.set_double(keys::SPEED, self.speed());
        frame
    }

    /// Close the producer and any attached source.
    pub fn close(mut self) {
        if let ProducerKind::Source(source) = &mut self.kind {
            source.close();
        }
        debug!(resource = self.properties.get(keys::RESOURCE), "producer closed");
        self.properties.close();
    }
}

impl Service for Producer {
    fn get_frame(&mut self, index: usize) -> Frame {
        Producer::get_frame(self, index)
    }
}
