//! Synthesized keyboard and mouse input.
//!
//! This module provides:
//! - The [`InputSink`] seam that both loops post events through
//! - A CoreGraphics-backed sink for macOS
//! - Key name to virtual key code mapping (`keycodes`)
//! - Timed key-press sequences (`keyboard`)

pub mod keyboard;
pub mod keycodes;

use crate::geometry::Point;
use keycodes::KeyCode;

/// One synthesized event, as seen by a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { code: KeyCode, down: bool },
    Mouse { point: Point, left: bool, down: bool },
    MouseMove { point: Point },
}

/// Accepts input events. Fire-and-forget: sinks log delivery failures
/// rather than reporting them.
pub trait InputSink: Send + Sync {
    fn key(&self, code: KeyCode, down: bool);

    fn mouse_button(&self, point: Point, left: bool, down: bool);

    /// Moves the cursor without pressing anything.
    fn mouse_move(&self, point: Point);
}

/// One left-button press/release pair at `point`.
pub fn click_at(sink: &dyn InputSink, point: Point) {
    sink.mouse_button(point, true, true);
    sink.mouse_button(point, true, false);
    log::info!("clicked at ({:.1}, {:.1})", point.x, point.y);
}

pub fn move_to(sink: &dyn InputSink, point: Point) {
    sink.mouse_move(point);
    log::info!("moved cursor to ({:.1}, {:.1})", point.x, point.y);
}

/// Posts CoreGraphics events: keys to the session tap with cleared flags,
/// mouse buttons to the HID tap.
#[cfg(target_os = "macos")]
pub struct CgEventSink;

#[cfg(target_os = "macos")]
impl InputSink for CgEventSink {
    fn key(&self, code: KeyCode, down: bool) {
        use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
        use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

        let Ok(source) = CGEventSource::new(CGEventSourceStateID::HIDSystemState) else {
            log::error!("failed to create keyboard event source");
            return;
        };
        match CGEvent::new_keyboard_event(source, code, down) {
            Ok(event) => {
                event.set_flags(CGEventFlags::empty());
                event.post(CGEventTapLocation::Session);
            }
            Err(()) => log::error!("failed to create key event for code {code:#04x}"),
        }
    }

    fn mouse_button(&self, point: Point, left: bool, down: bool) {
        use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
        use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
        use core_graphics::geometry::CGPoint;

        let (event_type, button) = match (left, down) {
            (true, true) => (CGEventType::LeftMouseDown, CGMouseButton::Left),
            (true, false) => (CGEventType::LeftMouseUp, CGMouseButton::Left),
            (false, true) => (CGEventType::RightMouseDown, CGMouseButton::Right),
            (false, false) => (CGEventType::RightMouseUp, CGMouseButton::Right),
        };

        let Ok(source) = CGEventSource::new(CGEventSourceStateID::HIDSystemState) else {
            log::error!("failed to create mouse event source");
            return;
        };
        match CGEvent::new_mouse_event(source, event_type, CGPoint::new(point.x, point.y), button)
        {
            Ok(event) => event.post(CGEventTapLocation::HID),
            Err(()) => log::error!("failed to create mouse event at ({}, {})", point.x, point.y),
        }
    }

    fn mouse_move(&self, point: Point) {
        use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
        use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
        use core_graphics::geometry::CGPoint;

        let Ok(source) = CGEventSource::new(CGEventSourceStateID::HIDSystemState) else {
            log::error!("failed to create mouse event source");
            return;
        };
        match CGEvent::new_mouse_event(
            source,
            CGEventType::MouseMoved,
            CGPoint::new(point.x, point.y),
            CGMouseButton::Left,
        ) {
            Ok(event) => event.post(CGEventTapLocation::HID),
            Err(()) => log::error!("failed to create move event to ({}, {})", point.x, point.y),
        }
    }
}
