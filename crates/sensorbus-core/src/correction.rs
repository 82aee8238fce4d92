//! Correction lookups against dense correction tables.
//!
//! A query locates the grid cell around `(awa, bts)` and interpolates the
//! four corner values. Queries are pure: a table can be shared between any
//! number of callers without locking.

use crate::interpolate::{
    check_range, interpolate, round_to_tenth, Axis, Bracket, Corners, LookupError,
};
use crate::table::{CorrectionTable, ANGLE_STEP};

impl CorrectionTable {
    /// Correction at apparent wind angle `awa` (degrees) and boat speed
    /// through water `bts` (knots), rounded to 0.1.
    ///
    /// `aws` is not used by the lookup; it is accepted so that callers do not
    /// change when tables gain a wind speed dimension.
    ///
    /// Inputs outside the table (including NaN) return
    /// [`LookupError::OutOfRange`]; they are never clamped.
    pub fn correction(&self, awa: f64, aws: f64, bts: f64) -> Result<f64, LookupError> {
        check_range(Axis::ApparentWindAngle, awa, 0.0, self.max_angle())?;
        check_range(Axis::BoatSpeed, bts, 0.0, self.max_speed())?;

        let awa1 = (awa / ANGLE_STEP).floor() * ANGLE_STEP;
        let awa2 = (awa / ANGLE_STEP).ceil() * ANGLE_STEP;
        let bts1 = bts.floor();
        let bts2 = bts.ceil();

        let row1 = (awa1 / ANGLE_STEP) as usize;
        let row2 = (awa2 / ANGLE_STEP) as usize;
        let col1 = bts1 as usize;
        let col2 = bts2 as usize;

        let corners = Corners {
            x1y1: self.value(row1, col1),
            x2y1: self.value(row1, col2),
            x1y2: self.value(row2, col1),
            x2y2: self.value(row2, col2),
        };

        let value = interpolate(
            &corners,
            Bracket::new(bts, bts1, bts2),
            Bracket::new(awa, awa1, awa2),
        );
        Ok(round_to_tenth(value))
    }
}

/// Wind speed and wind direction correction tables, loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct WindCalibration {
    tws: CorrectionTable,
    twd: CorrectionTable,
}

impl WindCalibration {
    pub fn new(tws: CorrectionTable, twd: CorrectionTable) -> Self {
        Self { tws, twd }
    }

    /// True wind speed correction for a reading.
    pub fn tws_correction(&self, awa: f64, aws: f64, bts: f64) -> Result<f64, LookupError> {
        self.tws.correction(awa, aws, bts)
    }

    /// True wind direction correction for a reading.
    pub fn twd_correction(&self, awa: f64, aws: f64, bts: f64) -> Result<f64, LookupError> {
        self.twd.correction(awa, aws, bts)
    }

    pub fn tws_table(&self) -> &CorrectionTable {
        &self.tws
    }

    pub fn twd_table(&self) -> &CorrectionTable {
        &self.twd
    }
}
