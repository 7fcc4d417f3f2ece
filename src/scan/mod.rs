//! Repeating capture, recognize and click loop.
//!
//! `Idle -> Scanning -> Idle`. Cycles run one after another inside a single
//! task, so they never overlap; [`ScanRunState::is_scanning`] decides whether
//! a finished cycle may publish or click.

mod config;
mod controller;
mod loop_worker;
mod state;

pub use config::{parse_search, ScanCycleConfig, SourceMode};
pub use controller::ScanController;
pub use state::{summarize, ScanRunState};
