use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::artifacts::{annotate::annotate, ArtifactStore};
use crate::capture::{capture_or_placeholder, load_image, CaptureProvider};
use crate::error::ConfigError;
use crate::geometry::ScreenSize;
use crate::matcher::ClickEngine;
use crate::ocr::{map_observations, recognize_async, Observation, RecognizedText, TextRecognizer};

use super::{ScanCycleConfig, ScanRunState, SourceMode};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Everything a cycle needs besides its configuration.
#[derive(Clone)]
pub(super) struct ScanContext {
    pub capture: Arc<dyn CaptureProvider>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub clicker: ClickEngine,
    pub artifacts: Option<ArtifactStore>,
    pub state_tx: Arc<watch::Sender<ScanRunState>>,
}

pub(super) async fn scan_loop(
    ctx: ScanContext,
    config: ScanCycleConfig,
    needles: Arc<[String]>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let languages: Arc<[String]> = config.languages().into();

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("scan loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = run_cycle(&ctx, &config, &needles, &languages, &cancel_token).await {
                    log_error!("scan cycle failed: {err:?}");
                }
            }
        }
    }
}

/// One capture, recognize, publish, click pass. Failures stay inside the
/// cycle; the next tick runs regardless.
async fn run_cycle(
    ctx: &ScanContext,
    config: &ScanCycleConfig,
    needles: &Arc<[String]>,
    languages: &Arc<[String]>,
    cancel_token: &CancellationToken,
) -> Result<()> {
    let cycle_start = Instant::now();

    let capture = {
        let provider = Arc::clone(&ctx.capture);
        let allow_placeholder = config.placeholder_on_failure();
        tokio::task::spawn_blocking(move || {
            capture_or_placeholder(provider.as_ref(), allow_placeholder)
        })
        .await
        .context("capture worker join failed")?
    };

    let capture = match capture {
        Ok(capture) => capture,
        Err(err) => {
            log_warn!("screen capture failed: {err}");
            publish(&ctx.state_tx, cancel_token, |state| {
                state.cycle_count += 1;
                state.last_results.clear();
                state.last_summary = format!("capture failed: {err}");
            });
            return Ok(());
        }
    };

    let genuine = capture.is_genuine();
    let screen = ctx.capture.screen_size();
    let image = Arc::new(capture.image);

    let observations = recognize_async(
        Arc::clone(&ctx.recognizer),
        Arc::clone(&image),
        Arc::clone(languages),
    )
    .await;

    if cancel_token.is_cancelled() {
        log_info!("discarding recognition result delivered after stop");
        return Ok(());
    }

    let results = map_observations(&observations, screen);
    let artifact = save_artifact(
        ctx.artifacts.as_ref(),
        image,
        &results,
        screen,
        !genuine,
        cancel_token,
    )
    .await;

    let published = publish(&ctx.state_tx, cancel_token, |state| {
        state.cycle_count += 1;
        state.record_results(results.clone());
        if artifact.is_some() {
            state.last_artifact = artifact;
        }
    });
    if !published {
        return Ok(());
    }

    if !genuine {
        log_warn!("placeholder frame; skipping clicks");
        return Ok(());
    }
    if needles.is_empty() {
        return Ok(());
    }

    let outcome = {
        let clicker = ctx.clicker.clone();
        let needles = Arc::clone(needles);
        let delay = config.click_delay();
        let token = cancel_token.clone();
        tokio::task::spawn_blocking(move || {
            clicker.find_and_click_sequence_until(&results, &needles, delay, &token)
        })
        .await
        .context("click worker join failed")?
    };

    publish(&ctx.state_tx, cancel_token, |state| {
        state.last_click = Some(outcome);
    });

    log_debug!(
        "scan cycle finished in {}ms, clicked {}/{}",
        cycle_start.elapsed().as_millis(),
        outcome.clicked,
        outcome.total
    );
    Ok(())
}

/// Applies `update` only while the loop is still live. Stop flips
/// `is_scanning` under the same channel lock, so a late cycle can never
/// overwrite the stopped state.
fn publish(
    state_tx: &watch::Sender<ScanRunState>,
    cancel_token: &CancellationToken,
    update: impl FnOnce(&mut ScanRunState),
) -> bool {
    state_tx.send_if_modified(|state| {
        if !state.is_scanning || cancel_token.is_cancelled() {
            return false;
        }
        update(state);
        true
    })
}

/// Annotates and writes one artifact on the blocking pool. Failures are
/// logged and yield `None`, as does a stop that lands before the write.
pub(super) async fn save_artifact(
    store: Option<&ArtifactStore>,
    image: Arc<RgbaImage>,
    results: &[RecognizedText],
    screen: ScreenSize,
    placeholder: bool,
    cancel_token: &CancellationToken,
) -> Option<PathBuf> {
    let store = store?.clone();
    let results = results.to_vec();
    let token = cancel_token.clone();

    let saved = tokio::task::spawn_blocking(move || {
        let annotated = annotate(&image, &results, screen);
        if token.is_cancelled() {
            return None;
        }
        Some(store.save(&annotated, placeholder))
    })
    .await;

    match saved {
        Ok(None) => {
            log_info!("cycle stopped; artifact not written");
            None
        }
        Ok(Some(Ok(path))) => Some(path),
        Ok(Some(Err(err))) => {
            log_warn!("failed to save artifact: {err}");
            None
        }
        Err(err) => {
            log_warn!("artifact worker join failed: {err}");
            None
        }
    }
}

/// Explicit targets followed by the reference image's texts, if any.
pub(super) async fn resolve_needles(
    config: &ScanCycleConfig,
    recognizer: &Arc<dyn TextRecognizer>,
) -> Result<Vec<String>> {
    let mut needles = config.search().to_vec();

    if let SourceMode::StaticImage(path) = config.source() {
        let path = path.clone();
        let image = tokio::task::spawn_blocking(move || load_image(&path))
            .await
            .context("reference image worker join failed")??;

        let observations = recognize_async(
            Arc::clone(recognizer),
            Arc::new(image),
            config.languages().into(),
        )
        .await;

        let reference = reference_texts(&observations);
        log_info!("reference image yielded {} search texts", reference.len());
        for text in reference {
            if !needles.contains(&text) {
                needles.push(text);
            }
        }
    }

    if needles.is_empty() {
        return Err(ConfigError::NothingToSearch.into());
    }
    Ok(needles)
}

/// Trimmed, de-duplicated texts in recognizer order.
fn reference_texts(observations: &[Observation]) -> Vec<String> {
    let mut texts: Vec<String> = Vec::new();
    for observation in observations {
        let text = observation.text.trim();
        if !text.is_empty() && !texts.iter().any(|seen| seen == text) {
            texts.push(text.to_string());
        }
    }
    texts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRecognizer;

    #[test]
    fn test_reference_texts_dedupe_in_order() {
        let observations = vec![
            ScriptedRecognizer::observation("继续", 0.1, 0.1),
            ScriptedRecognizer::observation(" 确定 ", 0.2, 0.2),
            ScriptedRecognizer::observation("继续", 0.3, 0.3),
            ScriptedRecognizer::observation("  ", 0.4, 0.4),
        ];
        assert_eq!(reference_texts(&observations), vec!["继续", "确定"]);
    }

    #[test]
    fn test_publish_is_refused_when_not_scanning() {
        let (tx, rx) = watch::channel(ScanRunState::default());
        let token = CancellationToken::new();

        assert!(!publish(&tx, &token, |state| state.cycle_count += 1));
        assert_eq!(rx.borrow().cycle_count, 0);

        tx.send_modify(|state| state.is_scanning = true);
        assert!(publish(&tx, &token, |state| state.cycle_count += 1));
        assert_eq!(rx.borrow().cycle_count, 1);

        token.cancel();
        assert!(!publish(&tx, &token, |state| state.cycle_count += 1));
        assert_eq!(rx.borrow().cycle_count, 1);
    }

    #[tokio::test]
    async fn test_stopped_cycle_writes_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf(), 5).unwrap();
        let image = Arc::new(RgbaImage::new(16, 16));
        let screen = ScreenSize::new(16.0, 16.0);
        let token = CancellationToken::new();
        token.cancel();

        let saved = save_artifact(Some(&store), Arc::clone(&image), &[], screen, false, &token).await;
        assert!(saved.is_none());
        assert!(store.list().unwrap().is_empty());

        let saved = save_artifact(
            Some(&store),
            image,
            &[],
            screen,
            false,
            &CancellationToken::new(),
        )
        .await;
        assert!(saved.is_some());
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
