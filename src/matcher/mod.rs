//! Picks targets out of a recognized set and clicks them.
//!
//! A sequence acts on the snapshot it is handed. Nothing is re-scanned between
//! needles, so a target that moves mid-sequence is clicked at its old
//! location.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::geometry::Rect;
use crate::input::{click_at, move_to, InputSink};
use crate::ocr::RecognizedText;

/// Granularity of the cancellable pause between needles.
const CANCEL_POLL: Duration = Duration::from_millis(10);

/// Result of one multi-target pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceOutcome {
    pub clicked: usize,
    pub total: usize,
}

impl SequenceOutcome {
    pub fn all_clicked(&self) -> bool {
        self.clicked == self.total
    }
}

/// Case-sensitive substring matches, in recognizer order.
pub fn find_text<'a>(snapshot: &'a [RecognizedText], needle: &str) -> Vec<&'a RecognizedText> {
    snapshot
        .iter()
        .filter(|item| item.text.contains(needle))
        .collect()
}

#[derive(Clone)]
pub struct ClickEngine {
    sink: Arc<dyn InputSink>,
}

impl ClickEngine {
    pub fn new(sink: Arc<dyn InputSink>) -> Self {
        Self { sink }
    }

    pub fn click_center(&self, rect: &Rect) {
        click_at(self.sink.as_ref(), rect.center());
    }

    pub fn move_to_center(&self, rect: &Rect) {
        move_to(self.sink.as_ref(), rect.center());
    }

    /// Moves the cursor onto the first match for `needle` without clicking.
    pub fn find_and_hover(&self, snapshot: &[RecognizedText], needle: &str) -> bool {
        match find_text(snapshot, needle).first() {
            Some(hit) => {
                log::info!("hovering {:?} for {needle:?}", hit.text);
                self.move_to_center(&hit.bounds);
                true
            }
            None => {
                log::debug!("no match for {needle:?}");
                false
            }
        }
    }

    /// Clicks the first match for `needle`. No match is `false`, not an error.
    pub fn find_and_click(&self, snapshot: &[RecognizedText], needle: &str) -> bool {
        match find_text(snapshot, needle).first() {
            Some(hit) => {
                log::info!("clicking {:?} for {needle:?}", hit.text);
                self.click_center(&hit.bounds);
                true
            }
            None => {
                log::debug!("no match for {needle:?}");
                false
            }
        }
    }

    /// Tries every needle once, in order, sleeping `delay` between needles.
    /// Misses do not stop the sequence.
    pub fn find_and_click_sequence(
        &self,
        snapshot: &[RecognizedText],
        needles: &[String],
        delay: Duration,
    ) -> SequenceOutcome {
        self.find_and_click_sequence_until(snapshot, needles, delay, &CancellationToken::new())
    }

    /// Like [`Self::find_and_click_sequence`], but stops before the next
    /// needle once `cancel` fires, cutting the pause short.
    pub fn find_and_click_sequence_until(
        &self,
        snapshot: &[RecognizedText],
        needles: &[String],
        delay: Duration,
        cancel: &CancellationToken,
    ) -> SequenceOutcome {
        let mut clicked = 0;

        for (index, needle) in needles.iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("click sequence cancelled at needle {}/{}", index + 1, needles.len());
                break;
            }
            if self.find_and_click(snapshot, needle) {
                clicked += 1;
            }
            if index + 1 < needles.len() && !delay.is_zero() {
                pause(delay, cancel);
            }
        }

        let outcome = SequenceOutcome {
            clicked,
            total: needles.len(),
        };
        log::info!("click sequence done: {}/{}", outcome.clicked, outcome.total);
        outcome
    }
}

/// Blocks for up to `delay`, returning early once `cancel` fires.
fn pause(delay: Duration, cancel: &CancellationToken) {
    let started = Instant::now();
    while !cancel.is_cancelled() {
        let remaining = delay.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        std::thread::sleep(remaining.min(CANCEL_POLL));
    }
}
