//! Contact sensor state.
//!
//! Provides thread-safe shared state for a binary contact sensor that is
//! written by the poll task and read by sinks and the CLI.
//!
//! `true` means open (sun inside the window), `false` means closed.

use super::{NotifiableSensor, Sensor, StateNotifier};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Thread-safe contact sensor state.
///
/// Implements the [`Sensor`] trait for change detection - the version
/// is incremented each time the value changes via `set()`.
pub struct ContactSensor {
    state: AtomicBool,
    version: AtomicU32,
    notifier: RwLock<Option<StateNotifier>>,
    /// Whether the current notifier has been sent a state yet.
    announced: AtomicBool,
}

impl ContactSensor {
    /// Create a new contact sensor with the given initial state.
    pub fn new(initial: bool) -> Self {
        Self {
            state: AtomicBool::new(initial),
            version: AtomicU32::new(0),
            notifier: RwLock::new(None),
            announced: AtomicBool::new(false),
        }
    }

    /// Get the current sensor state.
    pub fn get(&self) -> bool {
        self.state.load(Ordering::SeqCst)
    }

    /// Set the sensor state. Increments version if value changed.
    ///
    /// If a notifier is configured, the change is pushed to it. The first
    /// value a notifier sees is always pushed, so a sink that retains state
    /// is corrected even when nothing changed locally.
    /// Returns `true` when the value changed.
    pub fn set(&self, value: bool) -> bool {
        let changed = self.state.swap(value, Ordering::SeqCst) != value;
        if changed {
            self.version.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(notifier) = self.notifier.read().as_ref() {
            let first = !self.announced.swap(true, Ordering::SeqCst);
            if changed || first {
                notifier.notify(value);
            }
        }
        changed
    }
}

impl Default for ContactSensor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl NotifiableSensor for ContactSensor {
    fn set_notifier(&self, notifier: StateNotifier) {
        let mut slot = self.notifier.write();
        *slot = Some(notifier);
        self.announced.store(false, Ordering::SeqCst);
    }
}

impl Sensor for ContactSensor {
    fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}
