//! Correction table loading and gap filling.
//!
//! Correction tables are measured by sailing at known conditions, so some
//! cells are never measured. The source file marks those cells with `-`.
//! Loading parses the file into a [`RawTable`] and fills every missing cell
//! with an inverse-distance-weighted average of the measured cells around
//! it, producing a dense [`CorrectionTable`].
//!
//! File format (comma separated, one row per 10° of apparent wind angle,
//! one column per knot of boat speed):
//!
//! ```text
//! # AWA \ BTS  0   1   2   3 ...
//! 5, 5, -, 8
//! 6, 6, 7, -
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::interpolate::round_to_tenth;

/// Cell content marking "not measured".
pub const NA_TABLE_VALUE: &str = "-";

/// Lines starting with this character are ignored.
pub const COMMENT_MARKER: char = '#';

/// Degrees of apparent wind angle between two table rows.
pub const ANGLE_STEP: f64 = 10.0;

/// Measured cells further than this (in grid cells) do not affect a fill.
pub const AFFECTING_DISTANCE: f64 = 8.0;

/// Errors that can occur while loading a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The table file could not be read.
    #[error("Failed to read table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input contains no data rows.
    #[error("Table has no data rows")]
    Empty,

    /// Rows have inconsistent column counts.
    #[error("Malformed table: row {row} has {found} columns, expected {expected}")]
    Malformed {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The text is not readable as comma separated values.
    #[error("Failed to read table: {0}")]
    Csv(#[from] csv::Error),

    /// A cell is neither a number nor the missing marker.
    #[error("Invalid cell {text:?} at line {line}, column {column}")]
    InvalidCell {
        line: usize,
        column: usize,
        text: String,
    },

    /// A measured value is NaN or infinite.
    #[error("Non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },
}

/// A single cell of a table as read from the source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Measured(f64),
    Missing,
}

impl Cell {
    /// Parse trimmed cell text. Returns `None` for unparsable content.
    pub fn parse(text: &str) -> Option<Self> {
        if text == NA_TABLE_VALUE {
            return Some(Cell::Missing);
        }
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Cell::Measured(value)),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Cell::Measured(value) => Some(*value),
            Cell::Missing => None,
        }
    }
}

/// Read comma separated text into trimmed data rows.
///
/// Returns `(line_number, cells)` with 1-based line numbers, skipping blank
/// lines and comment lines. Quoted cells are unquoted.
pub(crate) fn data_rows(text: &str) -> Result<Vec<(usize, Vec<String>)>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(COMMENT_MARKER as u8))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let blank = record.iter().all(str::is_empty);
        // Comments indented with whitespace reach the reader as data
        let comment = record
            .get(0)
            .is_some_and(|first| first.starts_with(COMMENT_MARKER));
        if blank || comment {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);
        rows.push((line, record.iter().map(String::from).collect()));
    }
    Ok(rows)
}

/// A rectangular, possibly sparse table as read from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    rows: Vec<Vec<Cell>>,
    columns: usize,
}

impl RawTable {
    /// Build a table from rows, rejecting empty, ragged or non-finite input.
    pub fn new(rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let columns = rows.first().map(Vec::len).ok_or(TableError::Empty)?;
        if columns == 0 {
            return Err(TableError::Empty);
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(TableError::Malformed {
                row,
                expected: columns,
                found,
            });
        }
        for (row, cells) in rows.iter().enumerate() {
            for (column, cell) in cells.iter().enumerate() {
                if matches!(cell, Cell::Measured(value) if !value.is_finite()) {
                    return Err(TableError::NonFinite { row, column });
                }
            }
        }
        Ok(Self { rows, columns })
    }

    /// Parse comma separated table text.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut rows = Vec::new();
        for (line, cells) in data_rows(text)? {
            let row = cells
                .iter()
                .enumerate()
                .map(|(column, text)| {
                    Cell::parse(text).ok_or_else(|| TableError::InvalidCell {
                        line,
                        column,
                        text: text.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::new(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Number of cells marked as not measured.
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| **c == Cell::Missing)
            .count()
    }

    /// Fill missing cells using the default affecting distance.
    pub fn fill(&self) -> CorrectionTable {
        self.fill_with(AFFECTING_DISTANCE)
    }

    /// Fill missing cells, only weighting measured cells within
    /// `affecting_distance` grid cells.
    ///
    /// Fills read the sparse table only, never other fills, so the result
    /// does not depend on iteration order.
    pub fn fill_with(&self, affecting_distance: f64) -> CorrectionTable {
        let values = self
            .rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| match cell {
                        Cell::Measured(value) => *value,
                        Cell::Missing => self.weighted_average(r, c, affecting_distance),
                    })
                    .collect()
            })
            .collect();

        CorrectionTable {
            values,
            columns: self.columns,
        }
    }

    /// Inverse-distance-weighted (1/d²) average of measured cells around
    /// `(row, column)`. Yields 0 when nothing is within range.
    fn weighted_average(&self, row: usize, column: usize, affecting_distance: f64) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for (r, cells) in self.rows.iter().enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                let Cell::Measured(value) = cell else {
                    continue;
                };
                let d = grid_distance(row, column, r, c);
                if d <= affecting_distance {
                    let weight = 1.0 / (d * d);
                    numerator += weight * value;
                    denominator += weight;
                }
            }
        }

        if denominator == 0.0 {
            0.0
        } else {
            round_to_tenth(numerator / denominator)
        }
    }
}

fn grid_distance(r1: usize, c1: usize, r2: usize, c2: usize) -> f64 {
    let dr = r1.abs_diff(r2) as f64;
    let dc = c1.abs_diff(c2) as f64;
    (dr * dr + dc * dc).sqrt()
}

/// A dense correction table indexed by `[angle / 10][boat speed]`.
///
/// Every cell holds either a measured value or a fill. The table is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionTable {
    values: Vec<Vec<f64>>,
    columns: usize,
}

impl CorrectionTable {
    /// Build a dense table directly from rows of values.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, TableError> {
        let raw = RawTable::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::Measured).collect())
                .collect(),
        )?;
        Ok(raw.fill())
    }

    /// Parse table text and fill its gaps.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        Ok(RawTable::parse(text)?.fill())
    }

    /// Load a table file and fill its gaps with the default affecting distance.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        Self::load_with(path, AFFECTING_DISTANCE)
    }

    /// Load a table file and fill its gaps.
    pub fn load_with(path: impl AsRef<Path>, affecting_distance: f64) -> Result<Self, TableError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text, &path.display().to_string(), affecting_distance)
    }

    /// Parse and fill table text, logging the result under `name`.
    pub fn from_text(text: &str, name: &str, affecting_distance: f64) -> Result<Self, TableError> {
        let raw = RawTable::parse(text)?;
        let table = raw.fill_with(affecting_distance);
        info!(
            "Loaded table {} ({} rows x {} columns, {} cells interpolated)",
            name,
            table.rows(),
            table.columns(),
            raw.missing_count()
        );
        debug!("{}:\n{}", name, table);
        Ok(table)
    }

    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Value at a row (angle bucket) and column (speed bucket).
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Largest angle covered by the table, in degrees.
    pub fn max_angle(&self) -> f64 {
        (self.rows() - 1) as f64 * ANGLE_STEP
    }

    /// Largest boat speed covered by the table, in knots.
    pub fn max_speed(&self) -> f64 {
        (self.columns - 1) as f64
    }

    pub(crate) fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row][column]
    }
}

impl fmt::Display for CorrectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}", "")?;
        for column in 0..self.columns {
            write!(f, " {:>7}", format!("{} kts", column))?;
        }
        for (row, values) in self.values.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{:>5}", row * ANGLE_STEP as usize)?;
            for value in values {
                write!(f, " {:>7}", value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPARSE: &str = "\
# AWA rows, BTS columns
5, 5, -, 8
6, 6, 7, -
";

    #[test]
    fn test_parse_cells() {
        let raw = RawTable::parse(SPARSE).unwrap();
        assert_eq!(raw.rows(), 2);
        assert_eq!(raw.columns(), 4);
        assert_eq!(raw.cell(0, 0), Some(Cell::Measured(5.0)));
        assert_eq!(raw.cell(0, 2), Some(Cell::Missing));
        assert_eq!(raw.cell(1, 3), Some(Cell::Missing));
        assert_eq!(raw.missing_count(), 2);
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let raw = RawTable::parse("# header\n\n1,2\n  # indented comment\n3,4\n").unwrap();
        assert_eq!(raw.rows(), 2);
        assert_eq!(raw.cell(1, 1), Some(Cell::Measured(4.0)));
    }

    #[test]
    fn test_parse_quoted_cells() {
        let table = CorrectionTable::parse("\"5\",\"5\",\"-\",\"8\"\n6,6,7,\"-\"\n").unwrap();
        assert_eq!(table, CorrectionTable::parse(SPARSE).unwrap());
    }

    #[test]
    fn test_parse_decimal_and_negative_cells() {
        let raw = RawTable::parse("-1.5, 0.3, -").unwrap();
        assert_eq!(raw.cell(0, 0), Some(Cell::Measured(-1.5)));
        assert_eq!(raw.cell(0, 1), Some(Cell::Measured(0.3)));
        assert_eq!(raw.cell(0, 2), Some(Cell::Missing));
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = RawTable::parse("1,2,3\n4,5\n").unwrap_err();
        match err {
            TableError::Malformed {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 1);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_cell() {
        let err = RawTable::parse("# comment\n1,2\n3,abc\n").unwrap_err();
        match err {
            TableError::InvalidCell { line, column, text } => {
                assert_eq!(line, 3);
                assert_eq!(column, 1);
                assert_eq!(text, "abc");
            }
            other => panic!("Expected InvalidCell, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_finite_cell() {
        assert!(matches!(
            RawTable::parse("1,NaN").unwrap_err(),
            TableError::InvalidCell { .. }
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(RawTable::parse("# nothing\n").unwrap_err(), TableError::Empty));
        assert!(matches!(RawTable::new(vec![]).unwrap_err(), TableError::Empty));
    }

    #[test]
    fn test_fill_keeps_measured_cells() {
        let table = CorrectionTable::parse(SPARSE).unwrap();
        assert_eq!(table.get(0, 0), Some(5.0));
        assert_eq!(table.get(0, 3), Some(8.0));
        assert_eq!(table.get(1, 2), Some(7.0));
    }

    #[test]
    fn test_fill_inverse_distance_weighted() {
        let table = CorrectionTable::parse(SPARSE).unwrap();
        // (0,2): 25.45 / 3.95 = 6.443...
        assert_eq!(table.get(0, 2), Some(6.4));
        // (1,3): 18.666... / 2.661... = 7.014...
        assert_eq!(table.get(1, 3), Some(7.0));
    }

    #[test]
    fn test_fill_symmetry() {
        let raw = RawTable::new(vec![vec![
            Cell::Measured(10.0),
            Cell::Missing,
            Cell::Measured(20.0),
        ]])
        .unwrap();
        assert_eq!(raw.fill().get(0, 1), Some(15.0));
    }

    #[test]
    fn test_fill_zero_fallback() {
        let mut row = vec![Cell::Missing; 10];
        row[0] = Cell::Measured(4.0);
        let table = RawTable::new(vec![row]).unwrap().fill();
        // Column 8 is exactly at the affecting distance, column 9 beyond it
        assert_eq!(table.get(0, 8), Some(4.0));
        assert_eq!(table.get(0, 9), Some(0.0));
    }

    #[test]
    fn test_fill_zero_fallback_diagonal() {
        let mut rows = vec![vec![Cell::Missing; 7]; 7];
        rows[0][0] = Cell::Measured(4.0);
        let table = RawTable::new(rows).unwrap().fill();
        // (5,6) is sqrt(61) from the measured corner, (6,6) is sqrt(72)
        assert_eq!(table.get(5, 6), Some(4.0));
        assert_eq!(table.get(6, 6), Some(0.0));
    }

    #[test]
    fn test_fill_all_missing() {
        let table = RawTable::parse("-,-\n-,-").unwrap().fill();
        assert_eq!(table.get(1, 1), Some(0.0));
    }

    #[test]
    fn test_fill_with_shorter_distance() {
        let raw = RawTable::parse("1,-,-,-").unwrap();
        let table = raw.fill_with(2.0);
        assert_eq!(table.get(0, 2), Some(1.0));
        assert_eq!(table.get(0, 3), Some(0.0));
    }

    #[test]
    fn test_fill_ignores_other_fills() {
        // If (0,1) read the fill at (0,2) it would be pulled towards 9.
        let raw = RawTable::parse("1,-,-,9,9").unwrap();
        let once = raw.fill();
        let twice = raw.fill();
        assert_eq!(once, twice);
        // (0,1): (1*1 + 1/4*9 + 1/9*9) / (1 + 1/4 + 1/9)
        assert_eq!(once.get(0, 1), Some(3.1));
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("sensorbus-table-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tws.csv");
        std::fs::write(&path, SPARSE).unwrap();

        let first = CorrectionTable::load(&path).unwrap();
        let second = CorrectionTable::load(&path).unwrap();
        assert_eq!(first, second);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let err = CorrectionTable::load("/nonexistent/tws_correction_table.csv").unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(err.to_string().contains("tws_correction_table.csv"));
    }

    #[test]
    fn test_from_rows() {
        let table = CorrectionTable::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(table.rows(), 2);
        assert_eq!(table.columns(), 2);
        assert_eq!(table.max_angle(), 10.0);
        assert_eq!(table.max_speed(), 1.0);
        assert_eq!(table.get(2, 0), None);
    }

    #[test]
    fn test_from_rows_rejects_non_finite() {
        let err =
            CorrectionTable::from_rows(vec![vec![f64::NAN, 1.0], vec![1.0, 1.0]]).unwrap_err();
        assert!(matches!(err, TableError::NonFinite { row: 0, column: 0 }));

        let err =
            CorrectionTable::from_rows(vec![vec![1.0, 1.0], vec![1.0, f64::INFINITY]]).unwrap_err();
        assert!(matches!(err, TableError::NonFinite { row: 1, column: 1 }));
    }

    #[test]
    fn test_display() {
        let table = CorrectionTable::from_rows(vec![vec![1.0, 2.5], vec![3.0, 4.0]]).unwrap();
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("0 kts"));
        assert!(lines[0].contains("1 kts"));
        assert!(lines[1].trim_start().starts_with('0'));
        assert!(lines[1].ends_with("2.5"));
        assert!(lines[2].trim_start().starts_with("10"));
    }
}
