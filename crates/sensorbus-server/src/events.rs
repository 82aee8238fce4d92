//! Correction events published on the bus.

use serde::Serialize;
use tracing::debug;

use sensorbus_core::{LookupError, PolarTable, Target, TrueWind, WindCalibration, WindReading};

/// Calibration result for one sample of the latest readings.
///
/// Serialized as camelCase JSON:
///
/// ```json
/// {
///   "timestamp": "2024-01-17T10:30:00.000Z",
///   "reading": { "awa": 45.0, "aws": 12.3, "bts": 5.6 },
///   "twsCorrection": -0.4,
///   "twdCorrection": 2.1,
///   "trueWind": { "speed": 8.9, "angle": 69.2 },
///   "correctedWind": { "speed": 8.5, "angle": 71.3 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionEvent {
    /// ISO 8601 timestamp (UTC) of the sample.
    pub timestamp: String,

    /// The readings the corrections were computed from.
    pub reading: WindReading,

    /// True wind speed correction, knots.
    pub tws_correction: f64,

    /// True wind direction correction, degrees.
    pub twd_correction: f64,

    /// True wind before calibration.
    pub true_wind: TrueWind,

    /// True wind with both corrections applied.
    pub corrected_wind: TrueWind,

    /// Polar target for the corrected wind, when a polar is loaded and
    /// covers it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

impl CorrectionEvent {
    /// Look up corrections for `reading`.
    ///
    /// Tables are indexed by angle off the bow, so port side readings use
    /// the mirrored starboard angle.
    pub fn from_reading(
        calibration: &WindCalibration,
        polar: Option<&PolarTable>,
        reading: WindReading,
        timestamp: String,
    ) -> Result<Self, LookupError> {
        let angle = reading.angle_off_bow();
        let tws_correction = calibration.tws_correction(angle, reading.aws, reading.bts)?;
        let twd_correction = calibration.twd_correction(angle, reading.aws, reading.bts)?;

        let true_wind = TrueWind::from_reading(&reading);
        let corrected_wind = true_wind.corrected(tws_correction, twd_correction);

        let target = polar.and_then(|polar| {
            polar
                .target(corrected_wind.speed, corrected_wind.angle)
                .map_err(|e| debug!("No polar target: {}", e))
                .ok()
        });

        Ok(Self {
            timestamp,
            reading,
            tws_correction,
            twd_correction,
            true_wind,
            corrected_wind,
            target,
        })
    }
}

/// Current time in the format used for event timestamps.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
