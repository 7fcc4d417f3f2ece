pub mod actions;
pub mod artifacts;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
#[cfg(target_os = "macos")]
mod macos_bridge;
pub mod matcher;
pub mod ocr;
pub mod power;
pub mod scan;
mod utils;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use actions::{ActionConfig, ActionController};
use artifacts::{default_candidates, ArtifactStore};
use capture::CaptureProvider;
use cli::{Cli, Command};
use config::AppConfig;
use input::InputSink;
use matcher::ClickEngine;
use ocr::TextRecognizer;
use scan::{ScanController, ScanCycleConfig};

/// Platform backends the controllers drive.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
struct Platform {
    capture: Arc<dyn CaptureProvider>,
    recognizer: Arc<dyn TextRecognizer>,
    sink: Arc<dyn InputSink>,
}

#[cfg(target_os = "macos")]
fn platform() -> Result<Platform> {
    Ok(Platform {
        capture: Arc::new(capture::ScreenCapture),
        recognizer: Arc::new(ocr::VisionRecognizer),
        sink: Arc::new(input::CgEventSink),
    })
}

#[cfg(not(target_os = "macos"))]
fn platform() -> Result<Platform> {
    anyhow::bail!("macaux needs macOS for screen capture, text recognition and input events")
}

fn init_logging() {
    let debug_mode = std::env::var("MACAUX_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // RUST_LOG, when set, wins over the default level.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    log::info!("macaux starting up...");

    let config = AppConfig::load(cli.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(execute(cli, config))
}

async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
    let (artifact_dir, keep) = cli::artifact_settings(&cli, &config)?;

    match &cli.command {
        Command::Scan(args) => {
            let scan_config = cli::scan_config(&config.scan, args)?;
            let platform = platform()?;
            let artifacts = open_artifacts(artifact_dir, keep);
            run_scan(platform, artifacts, scan_config).await
        }
        Command::Keys(args) => {
            let action_config = cli::action_config(&config.actions, args)?;
            let platform = platform()?;
            run_keys(platform, action_config).await
        }
        Command::Snapshot(args) => {
            let languages = if args.languages.is_empty() {
                config.scan.languages.clone()
            } else {
                args.languages.clone()
            };
            let platform = platform()?;
            let artifacts = open_artifacts(artifact_dir, keep);
            run_snapshot(platform, artifacts, &languages).await
        }
    }
}

/// Artifacts are diagnostics: without a writable directory the loop runs
/// without them.
fn open_artifacts(override_dir: Option<PathBuf>, keep: usize) -> Option<ArtifactStore> {
    let candidates = default_candidates(override_dir.as_deref());
    match ArtifactStore::resolve(&candidates, keep) {
        Ok(store) => Some(store),
        Err(err) => {
            log::warn!("artifacts disabled: {err:#}");
            None
        }
    }
}

async fn run_scan(
    platform: Platform,
    artifacts: Option<ArtifactStore>,
    config: ScanCycleConfig,
) -> Result<()> {
    let controller = ScanController::new(
        platform.capture,
        platform.recognizer,
        ClickEngine::new(platform.sink),
        artifacts,
    );
    let mut state_rx = controller.subscribe();

    controller.start(config).await?;
    log::info!("scanning; press Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_cycle = 0;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                if state.cycle_count != last_cycle {
                    last_cycle = state.cycle_count;
                    log::info!("cycle {}: {}", state.cycle_count, state.last_summary);
                }
                if let Some(outcome) = state.last_click {
                    log::debug!("last click pass: {}/{}", outcome.clicked, outcome.total);
                }
            }
        }
    }

    controller.stop().await?;
    log::info!("scan finished after {} cycles", controller.snapshot().cycle_count);
    Ok(())
}

async fn run_keys(platform: Platform, config: ActionConfig) -> Result<()> {
    let controller = ActionController::new(platform.sink).with_sleep_prevention(true);
    let mut state_rx = controller.subscribe();

    controller.start(config).await?;
    log::info!("key loop running; press Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                log::info!("{}", state.status_line(chrono::Utc::now()));
                if let Some(action) = &state.last_action {
                    log::debug!("last action: {action}");
                }
            }
        }
    }

    controller.stop().await?;
    log::info!("{}", controller.snapshot().status_line(chrono::Utc::now()));
    Ok(())
}

async fn run_snapshot(
    platform: Platform,
    artifacts: Option<ArtifactStore>,
    languages: &[String],
) -> Result<()> {
    let controller = ScanController::new(
        platform.capture,
        platform.recognizer,
        ClickEngine::new(platform.sink),
        artifacts,
    );

    let results = controller.recognize_now(languages).await?;
    let rendered =
        serde_json::to_string_pretty(&results).context("Failed to serialize recognized text")?;
    println!("{rendered}");

    if let Some(path) = controller.snapshot().last_artifact {
        log::info!("annotated screenshot: {}", path.display());
    }
    Ok(())
}

