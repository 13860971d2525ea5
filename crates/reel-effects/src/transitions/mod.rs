//! Built-in transition effects.

pub(crate) mod composite;
pub(crate) mod luma;
pub(crate) mod mix;

pub use luma::{LumaMap, LumaState};
