use rand::Rng;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::keycodes::key_code;
use super::InputSink;

/// Hold and pacing for one key sequence. Ranges are sampled uniformly per
/// key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyTiming {
    pub hold: (Duration, Duration),
    pub after_release: Duration,
    pub gap: (Duration, Duration),
}

impl KeyTiming {
    /// Human-like movement: each key held about a second.
    pub fn movement() -> Self {
        Self {
            hold: (Duration::from_millis(900), Duration::from_millis(1100)),
            after_release: Duration::ZERO,
            gap: (Duration::from_millis(100), Duration::from_millis(300)),
        }
    }

    /// Literal sequences: short taps, half a second apart.
    pub fn literal() -> Self {
        Self {
            hold: (Duration::from_millis(50), Duration::from_millis(50)),
            after_release: Duration::from_millis(50),
            gap: (Duration::from_millis(500), Duration::from_millis(500)),
        }
    }

    pub fn instant() -> Self {
        Self {
            hold: (Duration::ZERO, Duration::ZERO),
            after_release: Duration::ZERO,
            gap: (Duration::ZERO, Duration::ZERO),
        }
    }
}

fn sample<R: Rng + ?Sized>(range: (Duration, Duration), rng: &mut R) -> Duration {
    let (low, high) = range;
    if high <= low {
        return low;
    }
    Duration::from_secs_f64(rng.gen_range(low.as_secs_f64()..=high.as_secs_f64()))
}

/// Presses `keys` strictly in order, blocking for holds and gaps.
///
/// Unknown keys are skipped with a warning. Once `cancel` fires, the key in
/// flight is released and the rest are skipped. Returns how many keys were
/// pressed.
pub fn press_keys<R: Rng + ?Sized>(
    sink: &dyn InputSink,
    keys: &[String],
    timing: &KeyTiming,
    rng: &mut R,
    cancel: &CancellationToken,
) -> usize {
    let mut pressed = 0;

    for (index, key) in keys.iter().enumerate() {
        if cancel.is_cancelled() {
            log::info!("key sequence cancelled after {pressed} keys");
            break;
        }

        let Some(code) = key_code(key) else {
            log::warn!("unsupported key {key:?}, skipping");
            continue;
        };

        sink.key(code, true);
        sleep(sample(timing.hold, rng));
        sink.key(code, false);
        sleep(timing.after_release);
        pressed += 1;
        log::debug!("pressed {}", key.to_uppercase());

        if index + 1 < keys.len() {
            sleep(sample(timing.gap, rng));
        }
    }

    pressed
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
