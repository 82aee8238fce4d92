//! Async table loading.
//!
//! Files are read on the tokio runtime; parsing and gap filling happen once
//! the text is in memory. The returned values are complete, so an adjuster
//! built from them never sees a partially loaded table.

use std::path::Path;

use sensorbus_core::{AdjusterSettings, CorrectionTable, PolarTable, TableError, WindCalibration};

async fn read_table(path: &Path) -> Result<String, TableError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load and gap-fill both correction tables named in `settings`.
pub async fn load_calibration(settings: &AdjusterSettings) -> Result<WindCalibration, TableError> {
    let tws_text = read_table(&settings.tws_correction_table).await?;
    let tws = CorrectionTable::from_text(
        &tws_text,
        "TWS correction table",
        settings.affecting_distance,
    )?;

    let twd_text = read_table(&settings.twd_correction_table).await?;
    let twd = CorrectionTable::from_text(
        &twd_text,
        "TWD correction table",
        settings.affecting_distance,
    )?;

    Ok(WindCalibration::new(tws, twd))
}

/// Load a boat speed polar.
pub async fn load_polar(path: &Path) -> Result<PolarTable, TableError> {
    let text = read_table(path).await?;
    let polar = PolarTable::parse(&text)?;
    tracing::info!(
        "Loaded polar table {} ({} angles x {} wind speeds)",
        path.display(),
        polar.wind_angles().len(),
        polar.wind_speeds().len()
    );
    Ok(polar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sensorbus-loader-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_calibration() {
        let dir = temp_dir("ok");
        std::fs::write(dir.join("tws.csv"), "# tws\n5, 5, -, 8\n6, 6, 7, -\n").unwrap();
        std::fs::write(dir.join("twd.csv"), "1, 2\n3, 4\n").unwrap();

        let settings = AdjusterSettings {
            tws_correction_table: dir.join("tws.csv"),
            twd_correction_table: dir.join("twd.csv"),
            ..Default::default()
        };
        let calibration = load_calibration(&settings).await.unwrap();

        assert_eq!(calibration.tws_table().get(0, 2), Some(6.4));
        assert_eq!(calibration.twd_correction(5.0, 0.0, 0.5).unwrap(), 2.5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_twd_table_fails_whole_load() {
        let dir = temp_dir("missing");
        std::fs::write(dir.join("tws.csv"), "1, 2\n3, 4\n").unwrap();

        let settings = AdjusterSettings {
            tws_correction_table: dir.join("tws.csv"),
            twd_correction_table: dir.join("twd.csv"),
            ..Default::default()
        };
        let err = load_calibration(&settings).await.unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_load_polar() {
        let dir = temp_dir("polar");
        let path = dir.join("polars.csv");
        std::fs::write(&path, "twa/tws, 6, 8\n40, 4.0, 5.0\n60, 5.0, 6.0\n").unwrap();

        let polar = load_polar(&path).await.unwrap();
        assert_eq!(polar.wind_speeds(), &[6.0, 8.0]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
