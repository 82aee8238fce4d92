//! # sensorbus-server
//!
//! Wind adjuster service with pluggable async runtime.
//!
//! The adjuster collects [`SensorEvent`]s from providers, samples the latest
//! readings on a fixed cadence, looks up calibration corrections and
//! publishes a [`CorrectionEvent`] per sample on a broadcast bus.
//!
//! Enable features based on target platform:
//! - `tokio-runtime` (default) - For Linux/desktop

pub mod events;

#[cfg(feature = "tokio-runtime")]
pub mod adjuster;
#[cfg(feature = "tokio-runtime")]
pub mod loader;

pub use events::CorrectionEvent;
pub use sensorbus_core::{AdjusterSettings, PolarTable, SensorEvent, WindCalibration};

#[cfg(feature = "tokio-runtime")]
pub use adjuster::{AdjusterConfig, AdjusterError, WindAdjuster};
#[cfg(feature = "tokio-runtime")]
pub use loader::{load_calibration, load_polar};
