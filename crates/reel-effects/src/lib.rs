//! Reel Effects - two-track transitions
//!
//! A [`Transition`] sits between a multitrack and whatever pulls from it,
//! gathering the A and B track frames once per cycle and running its effect
//! while the A frame falls inside the transition window.
//!
//! Built-in effects: switch (passthrough), audio mix, composite, luma wipe.

pub mod transition;
pub mod transitions;

pub use transition::{EffectName, Transition, TransitionKind, TransitionProcess};
pub use transitions::{LumaMap, LumaState};
