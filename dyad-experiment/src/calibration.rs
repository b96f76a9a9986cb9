use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-subject result of the pre-session titration procedure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Titration {
    /// Stimulus intensity at the subject's detection threshold.
    pub threshold: f64,
}

/// Path of the titration file written by the calibration run
/// for one chamber of a pair.
pub fn chamber_file(data_dir: &Path, pair_id: u32, chamber: u8) -> PathBuf {
    data_dir
        .join(pair_id.to_string())
        .join(format!("data_chamber{chamber}.json"))
}

/// Loads the titration result for one chamber.
///
/// A missing file means the pair was never calibrated; the session
/// must not start in that case, so the error names the chamber.
pub fn load_titration(
    data_dir: &Path,
    pair_id: u32,
    chamber: u8,
) -> Result<Titration, CalibrationError> {
    let path = chamber_file(data_dir, pair_id, chamber);
    let raw = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            CalibrationError::NotCalibrated { chamber, path: path.clone() }
        } else {
            CalibrationError::Unreadable { path: path.clone(), source }
        }
    })?;
    serde_json::from_str(&raw).map_err(|source| CalibrationError::Malformed { path, source })
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("no titration found for chamber {chamber}; run the calibration first (expected {path})")]
    NotCalibrated {
        chamber: u8,
        path: PathBuf,
    },
    #[error("cannot read titration file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: io::Error,
    },
    #[error("titration file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn chamber_file_layout() {
        let path = chamber_file(Path::new("data"), 12, 2);
        assert_eq!(path, Path::new("data/12/data_chamber2.json"));
    }

    #[test]
    fn loads_a_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let pair_dir = dir.path().join("7");
        fs::create_dir_all(&pair_dir).unwrap();
        fs::write(pair_dir.join("data_chamber1.json"), r#"{"threshold": 0.42}"#).unwrap();

        let titration = load_titration(dir.path(), 7, 1).unwrap();
        assert_eq!(titration.threshold, 0.42);
    }

    #[test]
    fn missing_file_names_the_chamber() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_titration(dir.path(), 7, 2).unwrap_err();
        assert!(matches!(err, CalibrationError::NotCalibrated { chamber: 2, .. }));
        assert!(err.to_string().contains("chamber 2"));
    }

    #[test]
    fn garbage_json_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let pair_dir = dir.path().join("7");
        fs::create_dir_all(&pair_dir).unwrap();
        fs::write(pair_dir.join("data_chamber1.json"), "not json").unwrap();

        let err = load_titration(dir.path(), 7, 1).unwrap_err();
        assert!(matches!(err, CalibrationError::Malformed { .. }));
    }
}
