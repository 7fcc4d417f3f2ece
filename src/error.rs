use std::path::PathBuf;

use thiserror::Error;

/// Why a screen capture produced no usable frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Null backend result or a zero-sized frame. Both are what macOS hands
    /// back when screen recording permission is missing.
    #[error("screen capture denied or unavailable: {0}")]
    PermissionOrSystemDenied(String),

    #[error("capture buffer of {actual} bytes does not match a {width}x{height} frame")]
    MalformedFrame {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// A configuration value rejected before any scheduler starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} is out of range, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("nothing to search for: give search text or a reference image")]
    NothingToSearch,

    #[error("key sequence is empty")]
    EmptyKeySequence,

    #[error("artifact keep count must be at least 1")]
    ZeroKeepCount,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no writable artifact directory among {0:?}")]
    NoWritableDirectory(Vec<PathBuf>),

    #[error("artifact I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode artifact {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
