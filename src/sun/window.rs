//! Threshold windows a sensor compares the sun position against.

use std::ops::RangeInclusive;

/// Range every azimuth threshold must fall into.
///
/// Bounds below 0 or above 360 describe windows that wrap through north.
pub const AZIMUTH_THRESHOLD_RANGE: RangeInclusive<f64> = -360.0..=720.0;

/// Altitude window applied when a sensor configures none.
pub const FULL_ALTITUDE: AltitudeWindow = AltitudeWindow {
    lower: -90.0,
    upper: 90.0,
};

/// Inclusive azimuth window in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzimuthWindow {
    pub lower: f64,
    pub upper: f64,
}

impl AzimuthWindow {
    /// Build a window from configuration values.
    ///
    /// Both thresholds must be present and within [`AZIMUTH_THRESHOLD_RANGE`].
    /// They may be given in either order.
    pub fn from_config(lower: Option<f64>, upper: Option<f64>) -> Result<Self, String> {
        let (Some(lower), Some(upper)) = (lower, upper) else {
            return Err("lowerThreshold and upperThreshold must both be numbers".to_string());
        };
        for (label, value) in [("lowerThreshold", lower), ("upperThreshold", upper)] {
            if !value.is_finite() || !AZIMUTH_THRESHOLD_RANGE.contains(&value) {
                return Err(format!("{label} {value} is outside [-360, 720]"));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Same window with `lower <= upper`.
    pub fn normalized(self) -> Self {
        if self.lower > self.upper {
            Self {
                lower: self.upper,
                upper: self.lower,
            }
        } else {
            self
        }
    }

    pub fn contains(&self, azimuth: f64) -> bool {
        azimuth >= self.lower && azimuth <= self.upper
    }
}

/// Inclusive altitude window in degrees. Never reordered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeWindow {
    pub lower: f64,
    pub upper: f64,
}

impl AltitudeWindow {
    /// Build a window from configuration values.
    ///
    /// A missing bound leaves that side of [`FULL_ALTITUDE`] in place.
    pub fn from_config(lower: Option<f64>, upper: Option<f64>) -> Result<Self, String> {
        let bounds = [
            ("lowerAltitudeThreshold", lower),
            ("upperAltitudeThreshold", upper),
        ];
        for (label, value) in bounds {
            if let Some(v) = value
                && !v.is_finite()
            {
                return Err(format!("{label} must be a finite number"));
            }
        }
        Ok(Self {
            lower: lower.unwrap_or(FULL_ALTITUDE.lower),
            upper: upper.unwrap_or(FULL_ALTITUDE.upper),
        })
    }

    pub fn contains(&self, altitude: f64) -> bool {
        altitude >= self.lower && altitude <= self.upper
    }
}

impl Default for AltitudeWindow {
    fn default() -> Self {
        FULL_ALTITUDE
    }
}
