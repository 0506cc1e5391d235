//! Sun Azimuth Sensor library.
//!
//! Virtual contact sensors that open while the sun stands inside a
//! configured azimuth and altitude window, optionally gated by current
//! weather conditions.

pub mod config;
pub mod error;
pub mod output;
pub mod platform;
pub mod scheduler;
pub mod sensors;
pub mod sun;
pub mod weather;
