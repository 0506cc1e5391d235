//! Sun position and threshold evaluation.
//!
//! Everything in here is pure: given a time, a location, and the configured
//! windows, the answer is always the same.

pub mod evaluator;
pub mod position;
pub mod window;

pub use evaluator::{evaluate, window_contains};
pub use position::{Coordinates, SunObservation, observe};
pub use window::{AltitudeWindow, AzimuthWindow};
