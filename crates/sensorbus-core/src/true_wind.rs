//! True wind derived from apparent wind and boat speed.

use serde::{Deserialize, Serialize};

use crate::model::{normalize_angle, WindReading};

/// True wind relative to the boat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueWind {
    /// True wind speed, knots.
    pub speed: f64,
    /// True wind angle, degrees 0..360 clockwise from the bow.
    pub angle: f64,
    /// True wind direction, degrees from north, when heading is known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub direction: Option<f64>,
}

impl TrueWind {
    /// Remove the boat's own motion from the apparent wind.
    ///
    /// Leeway and current are ignored; boat speed is taken as straight ahead.
    pub fn from_reading(reading: &WindReading) -> Self {
        let awa = reading.awa.to_radians();
        let u = reading.aws * awa.cos() - reading.bts;
        let v = reading.aws * awa.sin();

        let speed = u.hypot(v);
        let angle = if speed == 0.0 {
            0.0
        } else {
            normalize_angle(v.atan2(u).to_degrees())
        };

        Self {
            speed,
            angle,
            direction: reading.heading_true.map(|h| normalize_angle(h + angle)),
        }
    }

    /// Apply calibration corrections: speed is offset by `tws_correction`
    /// knots, angle and direction by `twd_correction` degrees.
    pub fn corrected(&self, tws_correction: f64, twd_correction: f64) -> Self {
        Self {
            speed: self.speed + tws_correction,
            angle: normalize_angle(self.angle + twd_correction),
            direction: self.direction.map(|d| normalize_angle(d + twd_correction)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(awa: f64, aws: f64, bts: f64) -> WindReading {
        WindReading {
            awa,
            aws,
            bts,
            heading_true: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_head_wind() {
        let wind = TrueWind::from_reading(&reading(0.0, 10.0, 4.0));
        assert_close(wind.speed, 6.0);
        assert_close(wind.angle, 0.0);
    }

    #[test]
    fn test_beam_reach() {
        let wind = TrueWind::from_reading(&reading(90.0, 10.0, 10.0));
        assert_close(wind.speed, 200.0_f64.sqrt());
        assert_close(wind.angle, 135.0);
    }

    #[test]
    fn test_port_side() {
        let wind = TrueWind::from_reading(&reading(270.0, 10.0, 10.0));
        assert_close(wind.angle, 225.0);
    }

    #[test]
    fn test_stationary_boat() {
        let wind = TrueWind::from_reading(&reading(60.0, 8.0, 0.0));
        assert_close(wind.speed, 8.0);
        assert_close(wind.angle, 60.0);
    }

    #[test]
    fn test_direction_from_heading() {
        let mut r = reading(90.0, 10.0, 10.0);
        r.heading_true = Some(300.0);
        let wind = TrueWind::from_reading(&r);
        assert_close(wind.direction.unwrap(), 75.0);
    }

    #[test]
    fn test_corrected() {
        let wind = TrueWind {
            speed: 12.0,
            angle: 359.0,
            direction: Some(10.0),
        };
        let corrected = wind.corrected(-1.5, 2.0);
        assert_close(corrected.speed, 10.5);
        assert_close(corrected.angle, 1.0);
        assert_close(corrected.direction.unwrap(), 12.0);
    }
}
