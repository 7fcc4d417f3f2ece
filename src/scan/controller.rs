use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::artifacts::ArtifactStore;
use crate::capture::CaptureProvider;
use crate::matcher::ClickEngine;
use crate::ocr::{map_observations, recognize_async, RecognizedText, TextRecognizer};

use super::loop_worker::{resolve_needles, save_artifact, scan_loop, ScanContext};
use super::{ScanCycleConfig, ScanRunState};

#[derive(Default)]
struct ScanWorker {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// Owns the scan loop: at most one runs at a time.
#[derive(Clone)]
pub struct ScanController {
    ctx: ScanContext,
    worker: Arc<Mutex<ScanWorker>>,
}

impl ScanController {
    pub fn new(
        capture: Arc<dyn CaptureProvider>,
        recognizer: Arc<dyn TextRecognizer>,
        clicker: ClickEngine,
        artifacts: Option<ArtifactStore>,
    ) -> Self {
        let initial = ScanRunState {
            artifact_dir: artifacts.as_ref().map(|store| store.dir().to_path_buf()),
            ..ScanRunState::default()
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            ctx: ScanContext {
                capture,
                recognizer,
                clicker,
                artifacts,
                state_tx: Arc::new(state_tx),
            },
            worker: Arc::new(Mutex::new(ScanWorker::default())),
        }
    }

    /// Starts the loop and runs the first cycle immediately.
    ///
    /// Returns `Ok(false)` without touching the running loop when one is
    /// already active.
    pub async fn start(&self, config: ScanCycleConfig) -> Result<bool> {
        let mut worker = self.worker.lock().await;
        if worker.handle.is_some() {
            info!("scan already running; ignoring start request");
            return Ok(false);
        }

        let needles: Arc<[String]> = resolve_needles(&config, &self.ctx.recognizer)
            .await?
            .into();
        info!(
            "starting scan every {:?} for {} targets",
            config.interval(),
            needles.len()
        );

        self.ctx.state_tx.send_modify(|state| {
            state.is_scanning = true;
            state.cycle_count = 0;
            state.last_click = None;
        });

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(scan_loop(
            self.ctx.clone(),
            config,
            needles,
            cancel_token.clone(),
        ));

        worker.handle = Some(handle);
        worker.cancel_token = Some(cancel_token);
        Ok(true)
    }

    /// Idempotent. Waits for an in-flight cycle to wind down; its results are
    /// discarded. Published state is reset even when the loop task died.
    pub async fn stop(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;

        self.ctx
            .state_tx
            .send_if_modified(|state| std::mem::replace(&mut state.is_scanning, false));

        if let Some(token) = worker.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = worker.handle.take() {
            handle.await.context("scan loop task failed to join")?;
            info!("scan stopped");
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.worker.lock().await.handle.is_some()
    }

    pub fn snapshot(&self) -> ScanRunState {
        self.ctx.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanRunState> {
        self.ctx.state_tx.subscribe()
    }

    /// A single capture and recognition pass with an artifact and no clicks.
    /// Refused while the loop runs.
    pub async fn recognize_now(&self, languages: &[String]) -> Result<Vec<RecognizedText>> {
        let worker = self.worker.lock().await;
        if worker.handle.is_some() {
            bail!("scan loop is running; stop it before a one-off recognition");
        }

        let provider = Arc::clone(&self.ctx.capture);
        let image = tokio::task::spawn_blocking(move || provider.capture_screen())
            .await
            .context("capture worker join failed")?
            .context("screen capture failed")?;

        let screen = self.ctx.capture.screen_size();
        let image = Arc::new(image);
        let observations = recognize_async(
            Arc::clone(&self.ctx.recognizer),
            Arc::clone(&image),
            languages.into(),
        )
        .await;
        let results = map_observations(&observations, screen);

        let artifact = save_artifact(
            self.ctx.artifacts.as_ref(),
            image,
            &results,
            screen,
            false,
            &CancellationToken::new(),
        )
        .await;

        self.ctx.state_tx.send_modify(|state| {
            state.record_results(results.clone());
            if artifact.is_some() {
                state.last_artifact = artifact;
            }
        });
        drop(worker);

        info!("one-off recognition found {} text regions", results.len());
        Ok(results)
    }
}
