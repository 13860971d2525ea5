//! Built-in producer computations.

pub(crate) mod colour;
mod ppm;
pub(crate) mod tone;

pub use ppm::PpmSource;
