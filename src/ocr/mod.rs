//! Text recognition over captured bitmaps.
//!
//! Recognizers return boxes in the backend's native, normalized
//! bottom-left-origin form; conversion to screen space happens in
//! [`map_observations`] through [`crate::geometry::to_screen_rect`].

use anyhow::Result;
use image::RgbaImage;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::geometry::{to_screen_rect, NormalizedBox, Rect, ScreenSize};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_LANGUAGES: [&str; 2] = ["zh-Hans", "en-US"];

/// One raw recognizer hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub text: String,
    pub normalized: NormalizedBox,
    pub confidence: f32,
}

/// A recognized string placed in absolute screen coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct RecognizedText {
    pub id: Uuid,
    pub text: String,
    pub bounds: Rect,
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, bounds: Rect, confidence: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            bounds,
            confidence,
        }
    }
}

/// An OCR backend. Implementations may block; callers go through
/// [`recognize_async`] to keep them off the scheduling tasks.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbaImage, languages: &[String]) -> Result<Vec<Observation>>;
}

/// Runs `recognizer` on the blocking pool.
///
/// Recognition failure is never fatal: backend errors and worker panics are
/// logged and reported as "nothing found".
pub async fn recognize_async(
    recognizer: Arc<dyn TextRecognizer>,
    image: Arc<RgbaImage>,
    languages: Arc<[String]>,
) -> Vec<Observation> {
    let started = std::time::Instant::now();
    let joined =
        tokio::task::spawn_blocking(move || recognizer.recognize(&image, &languages)).await;

    match joined {
        Ok(Ok(observations)) => {
            log_debug!(
                "recognized {} text regions in {}ms",
                observations.len(),
                started.elapsed().as_millis()
            );
            observations
        }
        Ok(Err(err)) => {
            log_warn!("text recognition failed: {err:#}");
            Vec::new()
        }
        Err(err) => {
            log_warn!("text recognition worker join failed: {err}");
            Vec::new()
        }
    }
}

/// Converts recognizer output into screen-space results, keeping recognizer
/// order.
pub fn map_observations(observations: &[Observation], screen: ScreenSize) -> Vec<RecognizedText> {
    observations
        .iter()
        .map(|observation| {
            RecognizedText::new(
                observation.text.clone(),
                to_screen_rect(&observation.normalized, screen),
                observation.confidence,
            )
        })
        .collect()
}

pub fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|lang| lang.to_string()).collect()
}

/// Apple Vision through the Swift plugin.
#[cfg(target_os = "macos")]
pub struct VisionRecognizer;

#[cfg(target_os = "macos")]
impl TextRecognizer for VisionRecognizer {
    fn recognize(&self, image: &RgbaImage, languages: &[String]) -> Result<Vec<Observation>> {
        let observations = crate::macos_bridge::recognize_text(
            image.as_raw(),
            image.width(),
            image.height(),
            languages,
        )?;

        Ok(observations
            .into_iter()
            .map(|observation| Observation {
                text: observation.text,
                normalized: NormalizedBox {
                    x: observation.x,
                    y: observation.y,
                    width: observation.width,
                    height: observation.height,
                },
                confidence: observation.confidence.clamp(0.0, 1.0) as f32,
            })
            .collect())
    }
}
