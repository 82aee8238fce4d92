//! Sensor bus data model.
//!
//! Providers turn instrument sentences into [`SensorEvent`]s. The adjuster
//! keeps the most recent value of each quantity in [`LatestReadings`] and
//! samples it on a fixed cadence.

use serde::{Deserialize, Serialize};

/// A single structured reading published by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SensorEvent {
    /// Apparent wind relative to the bow. Angle in degrees (0..360,
    /// clockwise), speed in knots.
    ApparentWind { angle: f64, speed: f64 },

    /// Speed through water in knots, with the true heading when the
    /// instrument reports one.
    #[serde(rename_all = "camelCase")]
    BoatSpeed {
        knots: f64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        heading_true: Option<f64>,
    },

    /// Battery current in amperes, positive when charging.
    Current { instance: String, current: f64 },

    /// Stored battery charge counter in amp hours.
    #[serde(rename_all = "camelCase")]
    Energy { instance: String, amp_hours: f64 },
}

/// A complete apparent wind + boat speed sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindReading {
    /// Apparent wind angle, degrees 0..360.
    pub awa: f64,
    /// Apparent wind speed, knots.
    pub aws: f64,
    /// Boat speed through water, knots.
    pub bts: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub heading_true: Option<f64>,
}

impl WindReading {
    /// Apparent wind angle folded onto 0..=180, port and starboard alike.
    pub fn angle_off_bow(&self) -> f64 {
        let awa = normalize_angle(self.awa);
        if awa > 180.0 {
            360.0 - awa
        } else {
            awa
        }
    }
}

/// Most recent value of each quantity seen on the bus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestReadings {
    awa: Option<f64>,
    aws: Option<f64>,
    bts: Option<f64>,
    heading_true: Option<f64>,
}

impl LatestReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, replacing older values of the same quantity.
    /// Electrical events are not part of a wind sample and are ignored.
    pub fn apply(&mut self, event: &SensorEvent) {
        match *event {
            SensorEvent::ApparentWind { angle, speed } => {
                self.awa = Some(angle);
                self.aws = Some(speed);
            }
            SensorEvent::BoatSpeed {
                knots,
                heading_true,
            } => {
                self.bts = Some(knots);
                self.heading_true = heading_true;
            }
            SensorEvent::Current { .. } | SensorEvent::Energy { .. } => {}
        }
    }

    /// The current sample, once wind and boat speed have both been seen.
    pub fn snapshot(&self) -> Option<WindReading> {
        Some(WindReading {
            awa: self.awa?,
            aws: self.aws?,
            bts: self.bts?,
            heading_true: self.heading_true,
        })
    }
}

/// Wrap an angle in degrees onto `[0, 360)`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
