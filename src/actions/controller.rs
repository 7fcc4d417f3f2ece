use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::input::InputSink;
use crate::power::SleepGuard;

use super::loop_worker::action_loop;
use super::{ActionConfig, ActionScheduleState};

#[derive(Default)]
struct ActionWorker {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    sleep_guard: Option<SleepGuard>,
}

/// Owns the jittered keyboard loop.
#[derive(Clone)]
pub struct ActionController {
    sink: Arc<dyn InputSink>,
    prevent_sleep: bool,
    worker: Arc<Mutex<ActionWorker>>,
    state_tx: Arc<watch::Sender<ActionScheduleState>>,
}

impl ActionController {
    pub fn new(sink: Arc<dyn InputSink>) -> Self {
        let (state_tx, _) = watch::channel(ActionScheduleState::default());
        Self {
            sink,
            prevent_sleep: false,
            worker: Arc::new(Mutex::new(ActionWorker::default())),
            state_tx: Arc::new(state_tx),
        }
    }

    /// Hold a display-sleep assertion while the loop runs.
    pub fn with_sleep_prevention(mut self, enabled: bool) -> Self {
        self.prevent_sleep = enabled;
        self
    }

    /// Returns `Ok(false)` when the loop is already running.
    pub async fn start(&self, config: ActionConfig) -> Result<bool> {
        let mut worker = self.worker.lock().await;
        if worker.handle.is_some() {
            info!("action loop already running; ignoring start request");
            return Ok(false);
        }

        self.state_tx.send_modify(|state| {
            *state = ActionScheduleState {
                base_interval_minutes: config.base_minutes(),
                is_running: true,
                ..ActionScheduleState::default()
            };
        });

        if self.prevent_sleep {
            worker.sleep_guard = SleepGuard::acquire();
        }

        info!(
            "starting action loop every ~{} minutes ({:?})",
            config.base_minutes(),
            config.mode()
        );
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(action_loop(
            Arc::clone(&self.sink),
            config,
            Arc::clone(&self.state_tx),
            cancel_token.clone(),
        ));

        worker.handle = Some(handle);
        worker.cancel_token = Some(cancel_token);
        Ok(true)
    }

    /// Idempotent. A key already held is released normally; the rest of the
    /// action is skipped.
    pub async fn stop(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;

        self.state_tx.send_if_modified(|state| {
            let was_running = std::mem::replace(&mut state.is_running, false);
            state.next_fire_at = None;
            was_running
        });

        if let Some(token) = worker.cancel_token.take() {
            token.cancel();
        }
        worker.sleep_guard = None;

        if let Some(handle) = worker.handle.take() {
            handle.await.context("action loop task failed to join")?;
            info!(
                "action loop stopped after {} executions",
                self.state_tx.borrow().execution_count
            );
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.worker.lock().await.handle.is_some()
    }

    pub fn snapshot(&self) -> ActionScheduleState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionScheduleState> {
        self.state_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionMode;
    use crate::testing::RecordingSink;
    use std::time::Duration;

    fn controller() -> (Arc<RecordingSink>, ActionController) {
        let sink = Arc::new(RecordingSink::default());
        let controller = ActionController::new(sink.clone());
        (sink, controller)
    }

    fn literal(minutes: f64, keys: &[&str]) -> ActionConfig {
        let keys = keys.iter().map(|key| key.to_string()).collect();
        ActionConfig::new(minutes, ActionMode::Literal(keys)).unwrap()
    }

    #[tokio::test]
    async fn test_stop_before_first_fire_sends_nothing() {
        let (sink, controller) = controller();

        assert!(controller.start(literal(1.0, &["a"])).await.unwrap());
        let state = controller.snapshot();
        assert!(state.is_running);
        assert_eq!(state.base_interval_minutes, 1.0);

        controller.stop().await.unwrap();

        let state = controller.snapshot();
        assert!(!state.is_running);
        assert_eq!(state.execution_count, 0);
        assert!(state.next_fire_at.is_none());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_next_fire_time_is_published() {
        let (_sink, controller) = controller();
        let mut rx = controller.subscribe();

        controller.start(literal(10.0, &["a"])).await.unwrap();
        let next = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|state| state.next_fire_at.is_some()),
        )
        .await
        .expect("timed out")
        .expect("channel closed")
        .next_fire_at
        .unwrap();
        controller.stop().await.unwrap();

        let remaining = (next - chrono::Utc::now()).num_seconds();
        assert!((470..=720).contains(&remaining), "{remaining}");
    }

    #[tokio::test]
    async fn test_short_interval_fires_keys_in_order() {
        let (sink, controller) = controller();
        let mut rx = controller.subscribe();

        // 0.001 minutes is 60ms before jitter.
        controller.start(literal(0.001, &["a", "b"])).await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(10),
            rx.wait_for(|state| state.execution_count >= 2),
        )
        .await
        .expect("timed out")
        .expect("channel closed");
        controller.stop().await.unwrap();

        let downs = sink.key_downs();
        assert!(downs.len() >= 2);
        assert_eq!(downs[..2], [0x00u16, 0x0B]);
        assert_eq!(
            controller.snapshot().last_action.as_deref(),
            Some("sequence A-B")
        );
    }

    #[tokio::test]
    async fn test_second_start_is_a_no_op() {
        let (_sink, controller) = controller();

        assert!(controller.start(literal(5.0, &["a"])).await.unwrap());
        assert!(!controller.start(literal(1.0, &["b"])).await.unwrap());
        assert_eq!(controller.snapshot().base_interval_minutes, 5.0);

        controller.stop().await.unwrap();
        controller.stop().await.unwrap();
        assert!(!controller.is_running().await);
    }
}
