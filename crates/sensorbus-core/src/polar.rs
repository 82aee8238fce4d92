//! Polar table and target boat speed.
//!
//! A polar table gives the expected boat speed for a true wind speed (columns)
//! and true wind angle (rows). Unlike correction tables the axes are explicit
//! and unevenly spaced, so they are stored alongside the speeds:
//!
//! ```text
//! twa/tws, 6, 8, 10, 12
//! 52, 5.1, 5.9, 6.4, 6.7
//! 60, 5.4, 6.2, 6.6, 6.9
//! ```

use serde::Serialize;

use crate::interpolate::{interpolate, round_to_tenth, Axis, Bracket, Corners, LookupError};
use crate::table::{data_rows, TableError};

/// Boat speed polar indexed by true wind angle and true wind speed.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarTable {
    tws: Vec<f64>,
    twa: Vec<f64>,
    speeds: Vec<Vec<f64>>,
}

/// Target boat speed for a true wind condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub tws: f64,
    /// True wind angle off the bow, 0..=180.
    pub twa: f64,
    pub target_speed: f64,
}

impl PolarTable {
    /// Parse polar text. The first data row is the TWS header; its first cell
    /// is a label and is ignored.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut rows = data_rows(text)?.into_iter();
        let (header_line, header) = rows.next().ok_or(TableError::Empty)?;
        let tws = header
            .iter()
            .enumerate()
            .skip(1)
            .map(|(column, cell)| parse_number(cell, header_line, column))
            .collect::<Result<Vec<_>, _>>()?;
        if tws.is_empty() {
            return Err(TableError::Empty);
        }

        let mut twa = Vec::new();
        let mut speeds = Vec::new();
        for (index, (line, cells)) in rows.enumerate() {
            if cells.len() != header.len() {
                return Err(TableError::Malformed {
                    row: index + 1,
                    expected: header.len(),
                    found: cells.len(),
                });
            }
            let values = cells
                .iter()
                .enumerate()
                .map(|(column, cell)| parse_number(cell, line, column))
                .collect::<Result<Vec<_>, _>>()?;
            twa.push(values[0]);
            speeds.push(values[1..].to_vec());
        }
        if twa.is_empty() {
            return Err(TableError::Empty);
        }

        Ok(Self { tws, twa, speeds })
    }

    /// True wind speed header values.
    pub fn wind_speeds(&self) -> &[f64] {
        &self.tws
    }

    /// True wind angle row values.
    pub fn wind_angles(&self) -> &[f64] {
        &self.twa
    }

    /// Target boat speed at `tws` and `twa` (degrees, 0..360).
    ///
    /// Angles past 180 are mirrored to the other tack.
    pub fn target(&self, tws: f64, twa: f64) -> Result<Target, LookupError> {
        let used_twa = round_to_tenth(if twa > 180.0 { 360.0 - twa } else { twa });

        let (c1, c2) = bracket_indices(&self.tws, tws, Axis::TrueWindSpeed)?;
        let (r1, r2) = bracket_indices(&self.twa, used_twa, Axis::TrueWindAngle)?;

        let corners = Corners {
            x1y1: self.speeds[r1][c1],
            x2y1: self.speeds[r1][c2],
            x1y2: self.speeds[r2][c1],
            x2y2: self.speeds[r2][c2],
        };
        let speed = interpolate(
            &corners,
            Bracket::new(tws, self.tws[c1], self.tws[c2]),
            Bracket::new(used_twa, self.twa[r1], self.twa[r2]),
        );

        Ok(Target {
            tws,
            twa: used_twa,
            target_speed: round_to_tenth(speed),
        })
    }
}

fn parse_number(text: &str, line: usize, column: usize) -> Result<f64, TableError> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(TableError::InvalidCell {
            line,
            column,
            text: text.to_string(),
        }),
    }
}

/// Indices of the last axis value below `value` and the first above it.
/// An exact match returns the same index twice.
fn bracket_indices(axis: &[f64], value: f64, which: Axis) -> Result<(usize, usize), LookupError> {
    let out_of_range = || LookupError::OutOfRange {
        axis: which,
        value,
        min: axis.first().copied().unwrap_or(f64::NAN),
        max: axis.last().copied().unwrap_or(f64::NAN),
    };

    if let Some(exact) = axis.iter().position(|v| *v == value) {
        return Ok((exact, exact));
    }
    let lower = axis.iter().rposition(|v| *v < value).ok_or_else(out_of_range)?;
    let upper = axis.iter().position(|v| *v > value).ok_or_else(out_of_range)?;
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POLAR: &str = "\
# Main & jib
twa/tws, 6, 8, 10
40, 4.0, 5.0, 5.5
60, 5.0, 6.0, 6.5
90, 5.5, 6.6, 7.2
";

    fn polar() -> PolarTable {
        PolarTable::parse(POLAR).unwrap()
    }

    #[test]
    fn test_parse_axes() {
        let polar = polar();
        assert_eq!(polar.wind_speeds(), &[6.0, 8.0, 10.0]);
        assert_eq!(polar.wind_angles(), &[40.0, 60.0, 90.0]);
    }

    #[test]
    fn test_exact_grid_point() {
        let target = polar().target(8.0, 60.0).unwrap();
        assert_eq!(
            target,
            Target {
                tws: 8.0,
                twa: 60.0,
                target_speed: 6.0
            }
        );
    }

    #[test]
    fn test_interpolates_between_speeds() {
        let target = polar().target(7.0, 40.0).unwrap();
        assert_eq!(target.target_speed, 4.5);
    }

    #[test]
    fn test_interpolates_between_angles() {
        let target = polar().target(10.0, 50.0).unwrap();
        assert_eq!(target.target_speed, 6.0);
    }

    #[test]
    fn test_bilinear() {
        // r1 = 4.5, r2 = 5.5
        let target = polar().target(7.0, 50.0).unwrap();
        assert_eq!(target.target_speed, 5.0);
    }

    #[test]
    fn test_mirrors_port_tack() {
        let starboard = polar().target(9.0, 75.0).unwrap();
        let port = polar().target(9.0, 285.0).unwrap();
        assert_eq!(port.twa, 75.0);
        assert_eq!(port.target_speed, starboard.target_speed);
    }

    #[test]
    fn test_out_of_range() {
        let polar = polar();
        assert!(matches!(
            polar.target(5.0, 60.0),
            Err(LookupError::OutOfRange {
                axis: Axis::TrueWindSpeed,
                ..
            })
        ));
        assert!(matches!(
            polar.target(8.0, 120.0),
            Err(LookupError::OutOfRange {
                axis: Axis::TrueWindAngle,
                ..
            })
        ));
        assert!(polar.target(f64::NAN, 60.0).is_err());
    }

    #[test]
    fn test_parse_quoted_cells() {
        let polar = PolarTable::parse("\"twa/tws\",\"6\",\"8\"\n\"40\",\"4.0\",\"5.0\"\n").unwrap();
        assert_eq!(polar.wind_speeds(), &[6.0, 8.0]);
        assert_eq!(polar.target(6.0, 40.0).unwrap().target_speed, 4.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PolarTable::parse("x, 6, 8\n40, 4.0\n").unwrap_err(),
            TableError::Malformed { .. }
        ));
        assert!(matches!(
            PolarTable::parse("x, 6, 8\n40, 4.0, fast\n").unwrap_err(),
            TableError::InvalidCell { .. }
        ));
        assert!(matches!(
            PolarTable::parse("x, 6, 8\n").unwrap_err(),
            TableError::Empty
        ));
    }
}
