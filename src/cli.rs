//! Command line front end.
//!
//! Usage:
//!   macaux scan --interval 1 --click-delay 0.5 --search "确定;开始"
//!   macaux scan --image reference.png
//!   macaux keys --minutes 15
//!   macaux keys --minutes 0.5 --sequence wwspace1
//!   macaux snapshot

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::actions::ActionConfig;
use crate::config::{ActionSettings, AppConfig, ScanSettings};
use crate::error::ConfigError;
use crate::scan::{ScanCycleConfig, SourceMode};

#[derive(Parser, Debug)]
#[command(name = "macaux")]
#[command(about = "Timed key sequences and OCR-driven clicking on macOS")]
pub struct Cli {
    /// JSON profile with `scan`, `actions` and `artifacts` sections
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for annotated screenshots (tried before the built-in fallbacks)
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// How many screenshots to keep
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture, recognize and click on a timer until Ctrl-C
    Scan(ScanArgs),
    /// Press keys on a jittered timer until Ctrl-C
    Keys(KeysArgs),
    /// Recognize the screen once and print what was found
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Seconds between cycles
    #[arg(long)]
    pub interval: Option<String>,

    /// Seconds between clicks within one cycle
    #[arg(long)]
    pub click_delay: Option<String>,

    /// Targets to click, separated by `;`
    #[arg(long)]
    pub search: Option<String>,

    /// Reference image whose texts are added to the targets
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Recognition language, repeatable (default zh-Hans, en-US)
    #[arg(long = "lang", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Keep the pipeline running on a placeholder frame when capture fails
    #[arg(long)]
    pub placeholder: bool,
}

#[derive(Args, Debug, Default)]
pub struct KeysArgs {
    /// Base minutes between actions (jittered by 20%)
    #[arg(long)]
    pub minutes: Option<String>,

    /// Literal key sequence, e.g. `wwspace1`
    #[arg(long, conflicts_with = "random")]
    pub sequence: Option<String>,

    /// Random movement even when the profile sets a sequence
    #[arg(long)]
    pub random: bool,
}

#[derive(Args, Debug, Default)]
pub struct SnapshotArgs {
    /// Recognition language, repeatable
    #[arg(long = "lang", value_name = "LANG")]
    pub languages: Vec<String>,
}

/// Profile values with command line overrides applied, validated.
pub fn scan_config(settings: &ScanSettings, args: &ScanArgs) -> Result<ScanCycleConfig, ConfigError> {
    let interval = args
        .interval
        .clone()
        .unwrap_or_else(|| settings.interval_secs.to_string());
    let click_delay = args
        .click_delay
        .clone()
        .unwrap_or_else(|| settings.click_delay_secs.to_string());
    let search = args.search.as_deref().unwrap_or(&settings.search);
    let source = match args.image.as_ref().or(settings.image.as_ref()) {
        Some(path) => SourceMode::StaticImage(path.clone()),
        None => SourceMode::Screen,
    };
    let languages = if args.languages.is_empty() {
        settings.languages.clone()
    } else {
        args.languages.clone()
    };

    Ok(ScanCycleConfig::parse(&interval, &click_delay, source, search)?
        .with_languages(languages)
        .with_placeholder_fallback(args.placeholder || settings.placeholder_on_failure))
}

pub fn action_config(settings: &ActionSettings, args: &KeysArgs) -> Result<ActionConfig, ConfigError> {
    let minutes = args
        .minutes
        .clone()
        .unwrap_or_else(|| settings.interval_minutes.to_string());
    let sequence = if args.random {
        None
    } else {
        args.sequence.as_deref().or(settings.sequence.as_deref())
    };
    ActionConfig::parse(&minutes, sequence)
}

/// Artifact directory override and keep count.
pub fn artifact_settings(cli: &Cli, config: &AppConfig) -> Result<(Option<PathBuf>, usize), ConfigError> {
    let keep = cli.keep.unwrap_or(config.artifacts.keep);
    if keep == 0 {
        return Err(ConfigError::ZeroKeepCount);
    }
    let dir = cli
        .artifacts_dir
        .clone()
        .or_else(|| config.artifacts.dir.clone());
    Ok((dir, keep))
}
