//! # sensorbus-core
//!
//! Wind calibration engine and sensor data model.
//!
//! This crate provides:
//! - Correction table loading with inverse-distance-weighted gap filling
//! - Bilinear correction lookups against the filled tables
//! - Polar target boat speed
//! - True wind derivation from apparent wind and boat speed
//! - Battery amp hour counters integrated from current measurements
//! - Sensor events and latest-reading state (without I/O)
//!
//! This crate is intentionally runtime-agnostic and contains no async code.
//! Tables are immutable once loaded and can be shared freely between threads.

pub mod config;
pub mod correction;
pub mod energy;
pub mod interpolate;
pub mod model;
pub mod polar;
pub mod table;
pub mod true_wind;

pub use config::{AdjusterSettings, ConfigError};
pub use correction::WindCalibration;
pub use energy::{EnergyAccumulator, EnergyReading};
pub use interpolate::{Axis, LookupError};
pub use model::*;
pub use polar::{PolarTable, Target};
pub use table::{Cell, CorrectionTable, RawTable, TableError};
pub use true_wind::TrueWind;
