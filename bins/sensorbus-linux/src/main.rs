use std::path::PathBuf;

use sensorbus_core::AdjusterSettings;
use sensorbus_providers::parse_line;
use sensorbus_server::{SensorEvent, WindAdjuster};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout carries the corrections
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sensorbus_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Wind adjuster starting...");

    // Configuration
    let settings = match config_path() {
        Some(path) => {
            tracing::info!("Loading settings from {}", path.display());
            AdjusterSettings::load(&path)?
        }
        None => {
            tracing::info!("No settings file given, using defaults");
            AdjusterSettings::default()
        }
    };

    // Tables are fully loaded before any reading is processed
    let adjuster = WindAdjuster::from_settings(&settings).await?;
    let event_tx = adjuster.event_sender();
    let corrections = adjuster.subscribe();

    let adjuster_handle = tokio::spawn(adjuster.run());

    let reader_handle = tokio::spawn(async move {
        if let Err(e) = read_nmea(event_tx).await {
            tracing::error!("Input error: {}", e);
        }
    });

    let writer_handle = tokio::spawn(async move {
        if let Err(e) = write_corrections(corrections).await {
            tracing::error!("Output error: {}", e);
        }
    });

    // End of input drops the last event sender. The adjuster then publishes
    // a final sample and closes the bus, which lets the writer drain and stop.
    let drained = async {
        let _ = reader_handle.await;
        tracing::info!("End of input");
        let _ = adjuster_handle.await;
        let _ = writer_handle.await;
    };

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = drained => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Settings file from the first argument or `SENSORBUS_CONFIG`.
fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("SENSORBUS_CONFIG").map(PathBuf::from))
}

/// Feed NMEA lines from stdin to the adjuster.
async fn read_nmea(event_tx: mpsc::Sender<SensorEvent>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(event)) => {
                if event_tx.send(event).await.is_err() {
                    tracing::error!("Failed to send sensor event - adjuster may have stopped");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("Ignoring line: {}", e),
        }
    }

    Ok(())
}

/// Write each correction as one JSON line on stdout.
async fn write_corrections(
    mut corrections: broadcast::Receiver<sensorbus_server::CorrectionEvent>,
) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();

    loop {
        match corrections.recv().await {
            Ok(event) => {
                let mut line = serde_json::to_vec(&event)?;
                line.push(b'\n');
                stdout.write_all(&line).await?;
                stdout.flush().await?;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Output lagged {} corrections", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    Ok(())
}
