use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::artifacts::DEFAULT_KEEP_COUNT;
use crate::error::ConfigError;
use crate::ocr::default_languages;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub interval_secs: f64,
    pub click_delay_secs: f64,
    /// Targets separated by `;`.
    pub search: String,
    pub image: Option<PathBuf>,
    pub languages: Vec<String>,
    pub placeholder_on_failure: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            click_delay_secs: 0.5,
            search: String::new(),
            image: None,
            languages: default_languages(),
            placeholder_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    pub interval_minutes: f64,
    /// Literal key sequence; random movement when absent.
    pub sequence: Option<String>,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 15.0,
            sequence: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    pub dir: Option<PathBuf>,
    pub keep: usize,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            dir: None,
            keep: DEFAULT_KEEP_COUNT,
        }
    }
}

/// Optional JSON profile. Read once at startup; never written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanSettings,
    pub actions: ActionSettings,
    pub artifacts: ArtifactSettings,
}

impl AppConfig {
    /// Defaults when `path` is `None`; a missing or malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

/// Parses a user-entered number, rejecting anything that is not finite.
pub(crate) fn parse_number(field: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ConfigError::NotANumber {
            field,
            value: value.to_string(),
        }),
    }
}

pub(crate) fn positive_duration(
    field: &'static str,
    value: f64,
    unit: Duration,
) -> Result<Duration, ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::NotANumber {
            field,
            value: value.to_string(),
        });
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    // Below one nanosecond the value rounds to zero.
    match to_duration(field, value, unit)? {
        duration if duration.is_zero() => Err(ConfigError::OutOfRange { field, value }),
        duration => Ok(duration),
    }
}

pub(crate) fn non_negative_duration(
    field: &'static str,
    value: f64,
    unit: Duration,
) -> Result<Duration, ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::NotANumber {
            field,
            value: value.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    to_duration(field, value, unit)
}

fn to_duration(field: &'static str, value: f64, unit: Duration) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value * unit.as_secs_f64())
        .map_err(|_| ConfigError::OutOfRange { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_profile_path_gives_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.scan.interval_secs, 1.0);
        assert_eq!(config.scan.click_delay_secs, 0.5);
        assert_eq!(config.scan.languages, vec!["zh-Hans", "en-US"]);
        assert_eq!(config.actions.interval_minutes, 15.0);
        assert_eq!(config.artifacts.keep, 5);
    }

    #[test]
    fn test_partial_profile_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macaux.json");
        fs::write(
            &path,
            r#"{ "scan": { "search": "确定;开始", "interval_secs": 3 }, "artifacts": { "keep": 2 } }"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.scan.search, "确定;开始");
        assert_eq!(config.scan.interval_secs, 3.0);
        assert_eq!(config.scan.click_delay_secs, 0.5);
        assert_eq!(config.artifacts.keep, 2);
        assert!(config.actions.sequence.is_none());
    }

    #[test]
    fn test_malformed_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ scan: ").unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn test_parse_number_rejects_text_and_infinity() {
        assert_eq!(parse_number("interval", " 2.5 "), Ok(2.5));
        assert!(matches!(
            parse_number("interval", "abc"),
            Err(ConfigError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_number("interval", "inf"),
            Err(ConfigError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_number("interval", ""),
            Err(ConfigError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_duration_bounds() {
        let secs = Duration::from_secs(1);
        assert_eq!(
            positive_duration("interval", 0.0, secs),
            Err(ConfigError::NotPositive {
                field: "interval",
                value: 0.0
            })
        );
        assert_eq!(
            non_negative_duration("delay", -0.1, secs),
            Err(ConfigError::Negative {
                field: "delay",
                value: -0.1
            })
        );
        assert_eq!(non_negative_duration("delay", 0.0, secs), Ok(Duration::ZERO));
        assert!(matches!(
            positive_duration("interval", 1e300, Duration::from_secs(60)),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert_eq!(
            positive_duration("interval", 1.5, Duration::from_secs(60)),
            Ok(Duration::from_secs(90))
        );
    }

    #[test]
    fn test_positive_value_rounding_to_zero_is_rejected() {
        assert_eq!(
            positive_duration("interval", 1e-10, Duration::from_secs(1)),
            Err(ConfigError::OutOfRange {
                field: "interval",
                value: 1e-10
            })
        );
        assert_eq!(
            positive_duration("interval", 0.001, Duration::from_secs(1)),
            Ok(Duration::from_millis(1))
        );
    }
}
