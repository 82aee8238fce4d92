//! # sensorbus-providers
//!
//! Data providers for the sensor bus.
//!
//! This crate turns raw instrument output into [`SensorEvent`]s:
//! - NMEA 0183 (`MWV` apparent wind, `VHW` water speed and heading)
//!
//! Transports (serial ports, network streams) are left to the caller, which
//! feeds complete lines into [`nmea0183::parse_line`].
//!
//! [`SensorEvent`]: sensorbus_core::SensorEvent

pub mod nmea0183;

pub use nmea0183::{parse_line, NmeaError};
