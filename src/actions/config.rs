use std::time::Duration;

use crate::config::{parse_number, positive_duration};
use crate::error::ConfigError;

use super::keys::{tokenize, ActionMode};
use super::loop_worker::JITTER_HIGH;

const MINUTE: Duration = Duration::from_secs(60);

/// Validated settings for the action loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfig {
    base_minutes: f64,
    base_interval: Duration,
    mode: ActionMode,
}

impl ActionConfig {
    pub fn new(base_minutes: f64, mode: ActionMode) -> Result<Self, ConfigError> {
        let base_interval = positive_duration("action interval", base_minutes, MINUTE)?;
        // The longest jittered delay must still be a valid Duration.
        if Duration::try_from_secs_f64(base_interval.as_secs_f64() * JITTER_HIGH).is_err() {
            return Err(ConfigError::OutOfRange {
                field: "action interval",
                value: base_minutes,
            });
        }
        if let ActionMode::Literal(keys) = &mode {
            if keys.is_empty() {
                return Err(ConfigError::EmptyKeySequence);
            }
        }
        Ok(Self {
            base_minutes,
            base_interval,
            mode,
        })
    }

    /// `sequence` of `None` selects random movement.
    pub fn parse(minutes: &str, sequence: Option<&str>) -> Result<Self, ConfigError> {
        let base_minutes = parse_number("action interval", minutes)?;
        let mode = match sequence {
            None => ActionMode::Random,
            Some(sequence) if sequence.trim().is_empty() => {
                return Err(ConfigError::EmptyKeySequence)
            }
            Some(sequence) => ActionMode::Literal(tokenize(sequence.trim())),
        };
        Self::new(base_minutes, mode)
    }

    pub fn base_minutes(&self) -> f64 {
        self.base_minutes
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn mode(&self) -> &ActionMode {
        &self.mode
    }
}
