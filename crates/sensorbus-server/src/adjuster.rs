//! Wind adjuster service.
//!
//! This module provides the service loop that:
//! - Receives sensor events from providers
//! - Keeps the latest apparent wind and boat speed
//! - Samples them on a fixed interval and looks up corrections
//! - Broadcasts a correction event per sample to all subscribers
//! - Integrates battery current into amp hour counters

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use sensorbus_core::{
    AdjusterSettings, ConfigError, EnergyAccumulator, EnergyReading, LatestReadings, PolarTable,
    SensorEvent, TableError, WindCalibration,
};

use crate::events::{now_timestamp, CorrectionEvent};
use crate::loader::{load_calibration, load_polar};

/// Configuration for the adjuster loop.
#[derive(Debug, Clone)]
pub struct AdjusterConfig {
    /// How often the latest readings are sampled.
    pub poll_interval: Duration,
    /// Capacity of the event inbox and the correction bus.
    pub channel_capacity: usize,
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            channel_capacity: 1024,
        }
    }
}

impl From<&AdjusterSettings> for AdjusterConfig {
    fn from(settings: &AdjusterSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            channel_capacity: settings.channel_capacity,
        }
    }
}

/// Errors that can occur while setting up an adjuster.
#[derive(Debug, Error)]
pub enum AdjusterError {
    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Applies calibration tables to live readings.
pub struct WindAdjuster {
    config: AdjusterConfig,
    calibration: Arc<WindCalibration>,
    polar: Option<Arc<PolarTable>>,
    /// Channel for broadcasting corrections to subscribers.
    correction_tx: broadcast::Sender<CorrectionEvent>,
    /// Channel for broadcasting battery counters to subscribers.
    energy_tx: broadcast::Sender<EnergyReading>,
    /// Channel for receiving events from providers.
    event_tx: mpsc::Sender<SensorEvent>,
    event_rx: mpsc::Receiver<SensorEvent>,
}

impl WindAdjuster {
    /// Create an adjuster around an already loaded calibration.
    pub fn new(config: AdjusterConfig, calibration: Arc<WindCalibration>) -> Self {
        let (correction_tx, _) = broadcast::channel(config.channel_capacity);
        let (energy_tx, _) = broadcast::channel(config.channel_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);

        Self {
            config,
            calibration,
            polar: None,
            correction_tx,
            energy_tx,
            event_tx,
            event_rx,
        }
    }

    /// Also compute polar target speeds.
    pub fn with_polar(mut self, polar: Arc<PolarTable>) -> Self {
        self.polar = Some(polar);
        self
    }

    /// Validate settings and load every table they name.
    pub async fn from_settings(settings: &AdjusterSettings) -> Result<Self, AdjusterError> {
        settings.validate()?;

        let calibration = load_calibration(settings).await?;
        let mut adjuster = Self::new(settings.into(), Arc::new(calibration));
        if let Some(path) = &settings.polar_table {
            adjuster = adjuster.with_polar(Arc::new(load_polar(path).await?));
        }
        Ok(adjuster)
    }

    /// Get a sender for submitting sensor events.
    pub fn event_sender(&self) -> mpsc::Sender<SensorEvent> {
        self.event_tx.clone()
    }

    /// Subscribe to correction events.
    pub fn subscribe(&self) -> broadcast::Receiver<CorrectionEvent> {
        self.correction_tx.subscribe()
    }

    /// Subscribe to battery amp hour counters.
    pub fn subscribe_energy(&self) -> broadcast::Receiver<EnergyReading> {
        self.energy_tx.subscribe()
    }

    pub fn calibration(&self) -> &Arc<WindCalibration> {
        &self.calibration
    }

    /// Run until every event sender has been dropped.
    pub async fn run(self) {
        let Self {
            config,
            calibration,
            polar,
            correction_tx,
            energy_tx,
            event_tx,
            mut event_rx,
        } = self;
        // Only external senders keep the loop alive
        drop(event_tx);

        let mut readings = LatestReadings::new();
        let mut energy = EnergyAccumulator::new();
        let mut in_range = true;
        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Wind adjuster running, sampling every {:?}",
            config.poll_interval
        );

        let sampler = Sampler {
            calibration: &calibration,
            polar: polar.as_deref(),
            correction_tx: &correction_tx,
        };

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(SensorEvent::Current { instance, current }) => {
                            let now = chrono::Utc::now();
                            let _ = energy_tx.send(energy.apply_current(&instance, current, now));
                        }
                        Some(SensorEvent::Energy { instance, amp_hours }) => {
                            energy.record_energy(&instance, amp_hours);
                        }
                        Some(event) => readings.apply(&event),
                        None => {
                            // Readings that arrived since the last tick still get published
                            sampler.sample(&readings, &mut in_range);
                            info!("Sensor event channel closed, stopping adjuster");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => sampler.sample(&readings, &mut in_range),
            }
        }
    }
}

struct Sampler<'a> {
    calibration: &'a WindCalibration,
    polar: Option<&'a PolarTable>,
    correction_tx: &'a broadcast::Sender<CorrectionEvent>,
}

impl Sampler<'_> {
    /// Publish corrections for the latest readings, if they are complete.
    fn sample(&self, readings: &LatestReadings, in_range: &mut bool) {
        let Some(reading) = readings.snapshot() else {
            return;
        };

        let event =
            CorrectionEvent::from_reading(self.calibration, self.polar, reading, now_timestamp());
        match event {
            Ok(event) => {
                *in_range = true;
                debug!(
                    "AWA: {}, AWS: {}, BTS: {}, TWS correction: {}, TWD correction: {}",
                    reading.awa,
                    reading.aws,
                    reading.bts,
                    event.tws_correction,
                    event.twd_correction
                );
                // No subscribers is not an error
                let _ = self.correction_tx.send(event);
            }
            Err(e) if *in_range => {
                *in_range = false;
                warn!("Skipping corrections: {}", e);
            }
            Err(e) => debug!("Skipping corrections: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = AdjusterSettings {
            poll_interval_ms: 50,
            channel_capacity: 16,
            ..Default::default()
        };
        let config = AdjusterConfig::from(&settings);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.channel_capacity, 16);
    }

    #[tokio::test]
    async fn test_from_settings_rejects_invalid() {
        let settings = AdjusterSettings {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            WindAdjuster::from_settings(&settings).await,
            Err(AdjusterError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_from_settings_missing_tables() {
        let settings = AdjusterSettings {
            tws_correction_table: "/nonexistent/tws.csv".into(),
            ..Default::default()
        };
        assert!(matches!(
            WindAdjuster::from_settings(&settings).await,
            Err(AdjusterError::Table(TableError::Io { .. }))
        ));
    }
}
