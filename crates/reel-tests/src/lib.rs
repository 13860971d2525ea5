//! Integration test crate for Reel.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every reel crate to verify they work together.

#[cfg(test)]
mod properties;

#[cfg(test)]
mod frame;

#[cfg(test)]
mod producer;

#[cfg(test)]
mod transition;

#[cfg(test)]
mod end_to_end;
