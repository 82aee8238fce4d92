//! NMEA 0183 sentence decoding.
//!
//! Framing, checksum verification and field parsing are done by the `nmea`
//! crate. This module maps the sentences the wind adjuster needs onto
//! sensor events:
//! - `MWV` (relative reference) → [`SensorEvent::ApparentWind`]
//! - `VHW` → [`SensorEvent::BoatSpeed`]
//!
//! Everything else parses to `Ok(None)`.

use nmea::sentences::mwv::{MwvReference, MwvWindSpeedUnits};
use nmea::sentences::{MwvData, VhwData};
use nmea::ParseResult;
use sensorbus_core::SensorEvent;
use thiserror::Error;
use tracing::trace;

const KNOTS_PER_METER_PER_SECOND: f64 = 1.943_844;
const KILOMETERS_PER_NAUTICAL_MILE: f64 = 1.852;
const KNOTS_PER_STATUTE_MPH: f64 = 0.868_976;

/// Errors that can occur while parsing a sentence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NmeaError {
    /// The line starts with `$` but is not a well-formed sentence.
    #[error("Malformed sentence: {0}")]
    Malformed(String),

    /// The transmitted checksum does not match the sentence content.
    #[error("Checksum mismatch: sentence says {expected:02X}, computed {computed:02X}")]
    Checksum { expected: u8, computed: u8 },
}

impl From<nmea::Error<'_>> for NmeaError {
    fn from(err: nmea::Error<'_>) -> Self {
        match err {
            nmea::Error::ChecksumMismatch { calculated, found } => NmeaError::Checksum {
                expected: found,
                computed: calculated,
            },
            other => NmeaError::Malformed(other.to_string()),
        }
    }
}

/// Parse one line of instrument output.
///
/// Lines that are not sentences (no leading `$`) are ignored, as are
/// sentence types without a matching event.
pub fn parse_line(line: &str) -> Result<Option<SensorEvent>, NmeaError> {
    let line = line.trim();
    if !line.starts_with('$') {
        return Ok(None);
    }

    match nmea::parse_str(line)? {
        ParseResult::MWV(data) => Ok(wind_event(&data)),
        ParseResult::VHW(data) => Ok(water_speed_event(&data)),
        _ => Ok(None),
    }
}

fn wind_event(data: &MwvData) -> Option<SensorEvent> {
    if !matches!(data.reference, Some(MwvReference::Relative)) {
        trace!("Skipping MWV with reference {:?}", data.reference);
        return None;
    }
    if !data.data_valid {
        trace!("Skipping MWV flagged invalid");
        return None;
    }

    let angle = f64::from(data.wind_direction?);
    let speed = f64::from(data.wind_speed?);
    let speed = match data.wind_speed_units {
        None | Some(MwvWindSpeedUnits::Knots) => speed,
        Some(MwvWindSpeedUnits::MetersPerSecond) => speed * KNOTS_PER_METER_PER_SECOND,
        Some(MwvWindSpeedUnits::KilometersPerHour) => speed / KILOMETERS_PER_NAUTICAL_MILE,
        Some(MwvWindSpeedUnits::MilesPerHour) => speed * KNOTS_PER_STATUTE_MPH,
    };

    Some(SensorEvent::ApparentWind { angle, speed })
}

/// Knots when present, otherwise km/h converted to knots.
fn water_speed_event(data: &VhwData) -> Option<SensorEvent> {
    let knots = match data.relative_speed_knots {
        Some(knots) => f64::from(knots),
        None => f64::from(data.relative_speed_kmph?) / KILOMETERS_PER_NAUTICAL_MILE,
    };

    Some(SensorEvent::BoatSpeed {
        knots,
        heading_true: data.heading_true.map(f64::from),
    })
}
