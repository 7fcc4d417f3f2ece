use std::path::PathBuf;
use std::time::Duration;

use crate::config::{non_negative_duration, parse_number, positive_duration};
use crate::error::ConfigError;
use crate::ocr::default_languages;

/// Where search targets come from besides the explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    Screen,
    /// Texts recognized in this image become extra targets; matching still
    /// runs against the live screen.
    StaticImage(PathBuf),
}

/// Validated settings for one scan loop. Immutable once built; replacing it
/// means stopping and restarting the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanCycleConfig {
    interval: Duration,
    click_delay: Duration,
    source: SourceMode,
    search: Vec<String>,
    languages: Vec<String>,
    placeholder_on_failure: bool,
}

impl ScanCycleConfig {
    pub fn new(
        interval_secs: f64,
        click_delay_secs: f64,
        source: SourceMode,
        search: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let second = Duration::from_secs(1);
        let interval = positive_duration("scan interval", interval_secs, second)?;
        let click_delay = non_negative_duration("click delay", click_delay_secs, second)?;

        let search: Vec<String> = search
            .into_iter()
            .map(|needle| needle.trim().to_string())
            .filter(|needle| !needle.is_empty())
            .collect();
        if search.is_empty() && source == SourceMode::Screen {
            return Err(ConfigError::NothingToSearch);
        }

        Ok(Self {
            interval,
            click_delay,
            source,
            search,
            languages: default_languages(),
            placeholder_on_failure: false,
        })
    }

    /// Builds from raw text fields; `search` is a `;`-separated list.
    pub fn parse(
        interval: &str,
        click_delay: &str,
        source: SourceMode,
        search: &str,
    ) -> Result<Self, ConfigError> {
        Self::new(
            parse_number("scan interval", interval)?,
            parse_number("click delay", click_delay)?,
            source,
            parse_search(search),
        )
    }

    /// An empty list keeps the defaults.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        if !languages.is_empty() {
            self.languages = languages;
        }
        self
    }

    pub fn with_placeholder_fallback(mut self, enabled: bool) -> Self {
        self.placeholder_on_failure = enabled;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn click_delay(&self) -> Duration {
        self.click_delay
    }

    pub fn source(&self) -> &SourceMode {
        &self.source
    }

    pub fn search(&self) -> &[String] {
        &self.search
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn placeholder_on_failure(&self) -> bool {
        self.placeholder_on_failure
    }
}

/// Splits `"确定; 开始;;继续"` into trimmed, non-empty targets.
pub fn parse_search(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_trims_and_drops_empties() {
        assert_eq!(parse_search("确定; 开始;;继续 "), vec!["确定", "开始", "继续"]);
        assert!(parse_search(" ; ").is_empty());
    }

    #[test]
    fn test_parse_valid_config() {
        let config = ScanCycleConfig::parse("2", "0.5", SourceMode::Screen, "OK;Next").unwrap();
        assert_eq!(config.interval(), Duration::from_secs(2));
        assert_eq!(config.click_delay(), Duration::from_millis(500));
        assert_eq!(config.search(), ["OK", "Next"]);
        assert_eq!(config.languages(), ["zh-Hans", "en-US"]);
        assert!(!config.placeholder_on_failure());
    }

    #[test]
    fn test_rejects_non_numeric_interval() {
        let err = ScanCycleConfig::parse("fast", "0.5", SourceMode::Screen, "OK").unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotANumber {
                field: "scan interval",
                value: "fast".into()
            }
        );
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        for interval in ["0", "-1"] {
            let err = ScanCycleConfig::parse(interval, "0.5", SourceMode::Screen, "OK").unwrap_err();
            assert!(matches!(err, ConfigError::NotPositive { .. }), "{interval}");
        }
    }

    #[test]
    fn test_rejects_interval_too_small_to_tick() {
        let err = ScanCycleConfig::parse("1e-10", "0", SourceMode::Screen, "OK").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "scan interval",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_negative_click_delay() {
        let err = ScanCycleConfig::parse("1", "-0.5", SourceMode::Screen, "OK").unwrap_err();
        assert!(matches!(err, ConfigError::Negative { .. }));
    }

    #[test]
    fn test_screen_mode_needs_search_text() {
        let err = ScanCycleConfig::parse("1", "0.5", SourceMode::Screen, " ; ").unwrap_err();
        assert_eq!(err, ConfigError::NothingToSearch);
    }

    #[test]
    fn test_static_image_mode_may_omit_search_text() {
        let source = SourceMode::StaticImage(PathBuf::from("/tmp/reference.png"));
        let config = ScanCycleConfig::parse("1", "0", source.clone(), "").unwrap();
        assert_eq!(config.source(), &source);
        assert!(config.search().is_empty());
    }

    #[test]
    fn test_empty_language_list_keeps_defaults() {
        let config = ScanCycleConfig::parse("1", "0", SourceMode::Screen, "OK")
            .unwrap()
            .with_languages(Vec::new());
        assert_eq!(config.languages(), ["zh-Hans", "en-US"]);

        let config = config.with_languages(vec!["en-US".into()]);
        assert_eq!(config.languages(), ["en-US"]);
    }
}
