use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::input::keyboard::press_keys;
use crate::input::InputSink;

use super::keys::ActionPlan;
use super::{ActionConfig, ActionScheduleState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub(super) const JITTER_LOW: f64 = 0.8;
pub(super) const JITTER_HIGH: f64 = 1.2;

/// `base` scaled by a fresh factor in `[0.8, 1.2]`, saturating at
/// `Duration::MAX`.
pub fn jittered_delay<R: Rng + ?Sized>(base: Duration, rng: &mut R) -> Duration {
    let factor = rng.gen_range(JITTER_LOW..=JITTER_HIGH);
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Sleeps a jittered delay, fires one action, repeats. Each delay is drawn
/// after the previous action finishes, so timing never drifts into a fixed
/// rhythm.
pub(super) async fn action_loop(
    sink: Arc<dyn InputSink>,
    config: ActionConfig,
    state_tx: Arc<watch::Sender<ActionScheduleState>>,
    cancel_token: CancellationToken,
) {
    let mut rng = StdRng::from_entropy();

    loop {
        let delay = jittered_delay(config.base_interval(), &mut rng);
        let next_fire_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|delay| Utc::now().checked_add_signed(delay));
        publish(&state_tx, &cancel_token, |state| {
            state.next_fire_at = next_fire_at;
        });
        log_info!("next action in {:.1}s", delay.as_secs_f64());

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        if cancel_token.is_cancelled() {
            break;
        }

        let plan = ActionPlan::draw(config.mode(), &mut rng);
        log_info!("firing action: {}", plan.description);
        publish(&state_tx, &cancel_token, |state| {
            state.execution_count += 1;
            state.last_action = Some(plan.description.clone());
            state.next_fire_at = None;
        });

        let worker_sink = Arc::clone(&sink);
        let worker_token = cancel_token.clone();
        let mut key_rng = StdRng::seed_from_u64(rng.gen());
        let pressed = tokio::task::spawn_blocking(move || {
            press_keys(
                worker_sink.as_ref(),
                &plan.keys,
                &plan.timing,
                &mut key_rng,
                &worker_token,
            )
        })
        .await;

        match pressed {
            Ok(count) => log_info!("action finished, {count} keys pressed"),
            Err(err) => log_error!("action worker join failed: {err}"),
        }
    }

    log_info!("action loop shutting down");
}

fn publish(
    state_tx: &watch::Sender<ActionScheduleState>,
    cancel_token: &CancellationToken,
    update: impl FnOnce(&mut ActionScheduleState),
) {
    state_tx.send_if_modified(|state| {
        if !state.is_running || cancel_token.is_cancelled() {
            return false;
        }
        update(state);
        true
    });
}
