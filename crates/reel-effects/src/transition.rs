//! The transition state machine.
//!
//! Each synchronisation cycle the caller requests every track once. The first
//! request for either the A or the B track pulls both frames from upstream and
//! holds them. From there:
//! - A track, A frame inside `[in, out)`: run the effect on both held frames
//!   and return the result; the cycle is resolved.
//! - A track, outside the window: return the held A frame as is.
//! - B track with nothing held: return a test card (the effect already
//!   consumed the B frame).
//! - B track, B frame inside the window: return a test card and keep holding
//!   B for the A request still to come.
//! - B track, outside the window: return the held B frame as is.
//! - Any other track passes straight through to upstream.
//!
//! The cycle ends once both tracks have been requested; anything still held
//! then is closed. A second request for the same track within a cycle gets a
//! test card.
//!
//! Either request order works. The effect runs at most once per cycle and both
//! held frames are always handed on or closed.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reel_core::{keys, Context, Frame, Properties, ReelError, Service, Timecode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::transitions::{composite, luma, mix, LumaMap, LumaState};

/// A custom effect run on the A and B frames of a cycle.
pub trait TransitionProcess: Send {
    /// Combine the two frames into one. Whatever is not returned must be
    /// closed or attached to the returned frame.
    fn process(&mut self, properties: &Properties, a_frame: Frame, b_frame: Frame) -> Frame;
}

impl<F> TransitionProcess for F
where
    F: FnMut(&Properties, Frame, Frame) -> Frame + Send,
{
    fn process(&mut self, properties: &Properties, a_frame: Frame, b_frame: Frame) -> Frame {
        self(properties, a_frame, b_frame)
    }
}

/// Names of the built-in effects, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectName {
    #[default]
    Switch,
    Mix,
    Composite,
    Luma,
}

impl EffectName {
    pub const ALL: [EffectName; 4] = [
        EffectName::Switch,
        EffectName::Mix,
        EffectName::Composite,
        EffectName::Luma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EffectName::Switch => "switch",
            EffectName::Mix => "mix",
            EffectName::Composite => "composite",
            EffectName::Luma => "luma",
        }
    }
}

impl FromStr for EffectName {
    type Err = ReelError;

    fn from_str(s: &str) -> reel_core::Result<Self> {
        EffectName::ALL
            .into_iter()
            .find(|effect| effect.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReelError::InvalidParameter(format!("unknown transition '{s}'")))
    }
}

impl fmt::Display for EffectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The effect a transition runs inside its window.
pub enum TransitionKind {
    /// Pass on whichever frame is not a test card.
    Switch,
    /// Crossfade the audio.
    Mix,
    /// Lay B over A.
    Composite,
    /// Wipe from A to B along a luma map, dissolving without one.
    Luma(LumaState),
    Custom(Box<dyn TransitionProcess>),
}

impl fmt::Debug for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Switch => f.write_str("Switch"),
            TransitionKind::Mix => f.write_str("Mix"),
            TransitionKind::Composite => f.write_str("Composite"),
            TransitionKind::Luma(state) => f.debug_tuple("Luma").field(state).finish(),
            TransitionKind::Custom(_) => f.write_str("Custom"),
        }
    }
}

pub struct Transition {
    properties: Properties,
    kind: TransitionKind,
    producer: Option<Box<dyn Service>>,
    a_frame: Option<Frame>,
    b_frame: Option<Frame>,
    /// Tracks already requested in the current cycle.
    a_served: bool,
    b_served: bool,
    context: Arc<Context>,
}

impl Transition {
    pub fn new(context: &Arc<Context>, kind: TransitionKind) -> Self {
        let mut properties = Properties::new();
        properties.set(keys::SERVICE, "transition");
        properties.set_timecode(keys::IN, 0.0);
        properties.set_timecode(keys::OUT, 0.0);
        properties.set_int(keys::A_TRACK, 0);
        properties.set_int(keys::B_TRACK, 1);
        Self {
            properties,
            kind,
            producer: None,
            a_frame: None,
            b_frame: None,
            a_served: false,
            b_served: false,
            context: Arc::clone(context),
        }
    }

    pub fn switch(context: &Arc<Context>) -> Self {
        Self::new(context, TransitionKind::Switch)
    }

    /// Audio crossfade. A negative `level` fades across the window; `None`
    /// leaves the level to whatever the B frame carries.
    pub fn mix(context: &Arc<Context>, level: Option<f64>) -> Self {
        let mut transition = Self::new(context, TransitionKind::Mix);
        if let Some(level) = level {
            transition.properties.set_double(keys::MIX, level);
        }
        transition
    }

    pub fn composite(context: &Arc<Context>) -> Self {
        Self::new(context, TransitionKind::Composite)
    }

    pub fn luma(context: &Arc<Context>, map: Option<LumaMap>) -> Self {
        Self::new(context, TransitionKind::Luma(LumaState::new(map)))
    }

    pub fn custom(context: &Arc<Context>, process: Box<dyn TransitionProcess>) -> Self {
        Self::new(context, TransitionKind::Custom(process))
    }

    /// Build a built-in effect by name.
    pub fn with_effect(context: &Arc<Context>, effect: EffectName) -> Self {
        match effect {
            EffectName::Switch => Self::switch(context),
            EffectName::Mix => Self::mix(context, Some(-1.0)),
            EffectName::Composite => Self::composite(context),
            EffectName::Luma => Self::luma(context, None),
        }
    }

    pub fn kind(&self) -> &TransitionKind {
        &self.kind
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Pull frames from `producer`, running the effect between `a_track` and
    /// `b_track`.
    pub fn connect(&mut self, producer: Box<dyn Service>, a_track: usize, b_track: usize) {
        self.producer = Some(producer);
        self.properties.set_int(keys::A_TRACK, a_track as i32);
        self.properties.set_int(keys::B_TRACK, b_track as i32);
    }

    /// Detach and return the upstream service, closing any held frames.
    pub fn disconnect(&mut self) -> Option<Box<dyn Service>> {
        self.close_held();
        self.producer.take()
    }

    pub fn set_in_and_out(&mut self, in_point: Timecode, out_point: Timecode) {
        self.properties.set_timecode(keys::IN, in_point);
        self.properties.set_timecode(keys::OUT, out_point);
    }

    pub fn a_track(&self) -> usize {
        self.properties.get_int(keys::A_TRACK).max(0) as usize
    }

    pub fn b_track(&self) -> usize {
        self.properties.get_int(keys::B_TRACK).max(0) as usize
    }

    pub fn in_point(&self) -> Timecode {
        self.properties.get_timecode(keys::IN)
    }

    pub fn out_point(&self) -> Timecode {
        self.properties.get_timecode(keys::OUT)
    }

    fn in_window(&self, timecode: Timecode) -> bool {
        timecode >= self.in_point() && timecode < self.out_point()
    }

    /// Whether a cycle is in progress with a frame still held.
    pub fn is_holding(&self) -> bool {
        self.a_frame.is_some() || self.b_frame.is_some()
    }

    /// Hand out the frame for track `index` (see the module docs).
    pub fn get_frame(&mut self, index: usize) -> Frame {
        let (a_track, b_track) = (self.a_track(), self.b_track());

        let Some(producer) = self.producer.as_mut() else {
            debug!(index, "transition not connected, using test card");
            return Frame::new(&self.context);
        };

        if index != a_track && index != b_track {
            return producer.get_frame(index);
        }

        if !self.a_served && !self.b_served {
            self.a_frame = Some(producer.get_frame(a_track));
            self.b_frame = Some(producer.get_frame(b_track));
        }

        let frame = if index == a_track {
            self.serve_a()
        } else {
            self.serve_b()
        };
        if self.a_served && (self.b_served || a_track == b_track) {
            self.close_held();
        }
        frame
    }

    fn serve_a(&mut self) -> Frame {
        if self.a_served {
            let index = self.a_track();
            warn!(index, "A track requested twice in one cycle, using test card");
            return Frame::new(&self.context);
        }
        self.a_served = true;
        let Some(a_frame) = self.a_frame.take() else {
            return Frame::new(&self.context);
        };
        let timecode = a_frame.timecode();
        if !self.in_window(timecode) {
            return a_frame;
        }
        let b_frame = self.b_frame.take().unwrap_or_else(|| {
            warn!(timecode, "B frame already handed on, processing against a test card");
            Frame::new(&self.context)
        });
        debug!(timecode, kind = ?self.kind, "running transition");
        self.process(a_frame, b_frame)
    }

    fn serve_b(&mut self) -> Frame {
        if self.b_served {
            let index = self.b_track();
            warn!(index, "B track requested twice in one cycle, using test card");
            return Frame::new(&self.context);
        }
        self.b_served = true;
        match self.b_frame.take() {
            None => Frame::new(&self.context),
            Some(b_frame) if self.in_window(b_frame.timecode()) => {
                self.b_frame = Some(b_frame);
                Frame::new(&self.context)
            }
            Some(b_frame) => b_frame,
        }
    }

    fn process(&mut self, a_frame: Frame, b_frame: Frame) -> Frame {
        let properties = &self.properties;
        match &mut self.kind {
            TransitionKind::Switch => switch(a_frame, b_frame),
            TransitionKind::Mix => mix::process(properties, a_frame, b_frame),
            TransitionKind::Composite => composite::process(properties, a_frame, b_frame),
            TransitionKind::Luma(state) => luma::process(state, properties, a_frame, b_frame),
            TransitionKind::Custom(process) => process.process(properties, a_frame, b_frame),
        }
    }

    /// Close held frames and start a fresh cycle.
    fn close_held(&mut self) {
        self.a_served = false;
        self.b_served = false;
        if let Some(frame) = self.a_frame.take() {
            frame.close();
        }
        if let Some(frame) = self.b_frame.take() {
            frame.close();
        }
    }

    /// Close the transition, its held frames and its property store.
    pub fn close(mut self) {
        self.close_held();
        self.properties.close();
    }
}

/// Keep the frame that carries a real picture, closing the other.
fn switch(a_frame: Frame, b_frame: Frame) -> Frame {
    if !a_frame.is_test_card() {
        b_frame.close();
        a_frame
    } else {
        a_frame.close();
        b_frame
    }
}

impl Service for Transition {
    fn get_frame(&mut self, index: usize) -> Frame {
        Transition::get_frame(self, index)
    }

    fn track_count(&self) -> usize {
        let tracks = self.a_track().max(self.b_track()) + 1;
        self.producer
            .as_ref()
            .map_or(tracks, |producer| producer.track_count().max(tracks))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("kind", &self.kind)
            .field("a_track", &self.a_track())
            .field("b_track", &self.b_track())
            .field("in", &self.in_point())
            .field("out", &self.out_point())
            .field("holding", &self.is_holding())
            .finish()
    }
}
