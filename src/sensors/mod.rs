//! Sensor state management.
//!
//! All sensors implement the [`Sensor`] trait which provides version tracking
//! for change detection. Sensors that push changes to sinks also implement
//! [`NotifiableSensor`].

pub mod contact_sensor;
pub mod notifier;
pub mod sun_azimuth;

pub use contact_sensor::ContactSensor;
pub use notifier::{StateChange, StateNotifier};
pub use sun_azimuth::SunAzimuthSensor;

/// Trait for sensors with change detection.
///
/// The version number is incremented each time the sensor value changes.
pub trait Sensor: Send + Sync {
    fn version(&self) -> u32;
}

/// Trait for sensors that push their changes to a [`StateNotifier`].
pub trait NotifiableSensor: Sensor {
    fn set_notifier(&self, notifier: StateNotifier);
}
