use haulplan_engine::{HosRules, RulesError, RulesSource};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesFileError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rules file {path} rejected: {source}")]
    Rules {
        path: PathBuf,
        #[source]
        source: RulesError,
    },
}

/// JSON rules overlay read from disk.
#[derive(Debug, Clone)]
pub struct RulesFile {
    path: PathBuf,
}

impl RulesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RulesSource for RulesFile {
    type Error = RulesFileError;

    fn load_rules(&self) -> Result<HosRules, Self::Error> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| RulesFileError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("loaded rules overlay from {}", self.path.display());
        HosRules::from_json(&json).map_err(|source| RulesFileError::Rules {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haulplan_engine::{DutyStatus, Planner};

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "haulplan-rules-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn loads_overlay_from_disk() {
        let path = temp_path("ok");
        std::fs::write(&path, r#"{"reset_status": "sleeper", "fuel_interval_mi": 800}"#).unwrap();
        let rules = RulesFile::new(&path).load_rules().unwrap();
        assert_eq!(rules.reset_status, DutyStatus::Sleeper);
        assert!((rules.fuel_interval_mi - 800.0).abs() < f64::EPSILON);
        assert!(Planner::from_source(&RulesFile::new(&path)).is_ok());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RulesFile::new(temp_path("missing")).load_rules().unwrap_err();
        assert!(matches!(err, RulesFileError::Io { .. }));
    }

    #[test]
    fn invalid_rules_name_the_file() {
        let path = temp_path("bad");
        std::fs::write(&path, r#"{"max_driving_hrs": 20}"#).unwrap();
        let err = RulesFile::new(&path).load_rules().unwrap_err();
        assert!(matches!(err, RulesFileError::Rules { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
        let _ = std::fs::remove_file(path);
    }
}
