//! Screen capture for the scan loop.
//!
//! This module provides:
//! - The [`CaptureProvider`] seam and its macOS implementation
//! - Frame validation that turns null / zero-sized frames into errors
//! - A tagged placeholder frame for diagnostics when capture fails

pub mod placeholder;

use image::RgbaImage;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::CaptureError;
use crate::geometry::ScreenSize;

/// Where a frame came from. Placeholder frames exist only to keep the
/// pipeline exercised and must never drive clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOrigin {
    Screen,
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct Capture {
    pub image: RgbaImage,
    pub origin: CaptureOrigin,
}

impl Capture {
    pub fn is_genuine(&self) -> bool {
        self.origin == CaptureOrigin::Screen
    }
}

pub trait CaptureProvider: Send + Sync {
    /// Captures the primary display. Read-only.
    fn capture_screen(&self) -> Result<RgbaImage, CaptureError>;

    /// Primary display size in points; used for coordinate mapping.
    fn screen_size(&self) -> ScreenSize;
}

/// Rejects frames that a permission-denied capture produces.
pub fn validate_frame(width: u32, height: u32) -> Result<(), CaptureError> {
    if width == 0 || height == 0 {
        return Err(CaptureError::PermissionOrSystemDenied(format!(
            "captured frame is {width}x{height}; grant Screen Recording in System Settings > Privacy & Security"
        )));
    }
    Ok(())
}

/// Builds an image from a raw RGBA8 buffer after the dimension check.
pub fn frame_from_raw(width: u32, height: u32, rgba: Vec<u8>) -> Result<RgbaImage, CaptureError> {
    validate_frame(width, height)?;
    let actual = rgba.len();
    RgbaImage::from_raw(width, height, rgba).ok_or(CaptureError::MalformedFrame {
        width,
        height,
        actual,
    })
}

/// Captures the screen, falling back to a placeholder only when asked to.
///
/// Returns the error when the fallback is disabled so the caller can report it.
pub fn capture_or_placeholder(
    provider: &dyn CaptureProvider,
    allow_placeholder: bool,
) -> Result<Capture, CaptureError> {
    match provider.capture_screen() {
        Ok(image) => Ok(Capture {
            image,
            origin: CaptureOrigin::Screen,
        }),
        Err(err) if allow_placeholder => {
            log::warn!("screen capture failed ({err}); using placeholder frame");
            let screen = provider.screen_size();
            Ok(Capture {
                image: placeholder::render(screen.width as u32, screen.height as u32),
                origin: CaptureOrigin::Placeholder,
            })
        }
        Err(err) => Err(err),
    }
}

/// Loads a reference image for static-image search mode.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load reference image {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Main-display capture through the Swift plugin.
#[cfg(target_os = "macos")]
pub struct ScreenCapture;

#[cfg(target_os = "macos")]
impl CaptureProvider for ScreenCapture {
    fn capture_screen(&self) -> Result<RgbaImage, CaptureError> {
        let frame = crate::macos_bridge::capture_main_screen().ok_or_else(|| {
            CaptureError::PermissionOrSystemDenied("capture backend returned no image".into())
        })?;
        frame_from_raw(frame.width, frame.height, frame.rgba)
    }

    fn screen_size(&self) -> ScreenSize {
        let bounds = core_graphics::display::CGDisplay::main().bounds();
        ScreenSize::new(bounds.size.width, bounds.size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCapture;

    #[test]
    fn test_zero_sized_frame_is_permission_error() {
        for (w, h) in [(0, 0), (0, 1080), (1920, 0)] {
            let err = frame_from_raw(w, h, Vec::new()).unwrap_err();
            assert!(matches!(err, CaptureError::PermissionOrSystemDenied(_)));
        }
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let err = frame_from_raw(2, 2, vec![0; 8]).unwrap_err();
        assert_eq!(
            err,
            CaptureError::MalformedFrame {
                width: 2,
                height: 2,
                actual: 8
            }
        );
    }

    #[test]
    fn test_valid_buffer_builds_image() {
        let image = frame_from_raw(2, 1, vec![255; 8]).unwrap();
        assert_eq!(image.dimensions(), (2, 1));
    }

    #[test]
    fn test_failure_without_fallback_is_reported() {
        let capture = FakeCapture::failing();
        let err = capture_or_placeholder(&capture, false).unwrap_err();
        assert!(matches!(err, CaptureError::PermissionOrSystemDenied(_)));
    }

    #[test]
    fn test_failure_with_fallback_is_tagged_placeholder() {
        let capture = FakeCapture::failing();
        let frame = capture_or_placeholder(&capture, true).unwrap();
        assert_eq!(frame.origin, CaptureOrigin::Placeholder);
        assert!(!frame.is_genuine());
        assert_eq!(frame.image.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_success_is_genuine() {
        let capture = FakeCapture::new(64, 32);
        let frame = capture_or_placeholder(&capture, true).unwrap();
        assert!(frame.is_genuine());
        assert_eq!(frame.image.dimensions(), (64, 32));
    }

    #[test]
    fn test_load_image_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("missing.png")).unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }
}
