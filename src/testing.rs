//! Test doubles for the capture, recognizer and input seams.

use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::capture::CaptureProvider;
use crate::error::CaptureError;
use crate::geometry::{NormalizedBox, Point, ScreenSize};
use crate::input::keycodes::KeyCode;
use crate::input::{InputEvent, InputSink};
use crate::ocr::{Observation, TextRecognizer};

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<InputEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Mouse-down events, i.e. one per click.
    pub fn clicks(&self) -> Vec<Point> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                InputEvent::Mouse {
                    point, down: true, ..
                } => Some(point),
                _ => None,
            })
            .collect()
    }

    pub fn moves(&self) -> Vec<Point> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                InputEvent::MouseMove { point } => Some(point),
                _ => None,
            })
            .collect()
    }

    pub fn key_downs(&self) -> Vec<KeyCode> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                InputEvent::Key { code, down: true } => Some(code),
                _ => None,
            })
            .collect()
    }
}

impl InputSink for RecordingSink {
    fn key(&self, code: KeyCode, down: bool) {
        self.events
            .lock()
            .unwrap()
            .push(InputEvent::Key { code, down });
    }

    fn mouse_button(&self, point: Point, left: bool, down: bool) {
        self.events
            .lock()
            .unwrap()
            .push(InputEvent::Mouse { point, left, down });
    }

    fn mouse_move(&self, point: Point) {
        self.events
            .lock()
            .unwrap()
            .push(InputEvent::MouseMove { point });
    }
}

/// Returns a blank frame of a fixed size, or fails like a denied capture.
pub struct FakeCapture {
    frame: Option<(u32, u32)>,
    screen: ScreenSize,
    calls: AtomicUsize,
}

impl FakeCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Some((width, height)),
            screen: ScreenSize::new(1920.0, 1080.0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            frame: None,
            screen: ScreenSize::new(1920.0, 1080.0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CaptureProvider for FakeCapture {
    fn capture_screen(&self) -> Result<RgbaImage, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.frame {
            Some((width, height)) => Ok(RgbaImage::new(width, height)),
            None => Err(CaptureError::PermissionOrSystemDenied(
                "test capture denied".into(),
            )),
        }
    }

    fn screen_size(&self) -> ScreenSize {
        self.screen
    }
}

/// Returns canned observations, optionally chosen by image width and
/// optionally after a delay.
#[derive(Default)]
pub struct ScriptedRecognizer {
    default: Vec<Observation>,
    by_width: HashMap<u32, Vec<Observation>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            default: observations,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn for_width(mut self, width: u32, observations: Vec<Observation>) -> Self {
        self.by_width.insert(width, observations);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A 0.1 x 0.05 box with its bottom-left corner at (`x`, `y`).
    pub fn observation(text: &str, x: f64, y: f64) -> Observation {
        Observation {
            text: text.to_string(),
            normalized: NormalizedBox {
                x,
                y,
                width: 0.1,
                height: 0.05,
            },
            confidence: 0.9,
        }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, image: &RgbaImage, _languages: &[String]) -> Result<Vec<Observation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self
            .by_width
            .get(&image.width())
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}
