//! Jittered keyboard automation.
//!
//! This module provides:
//! - Validated loop settings (`ActionConfig`)
//! - Key string tokenizing and random movement plans (`keys`)
//! - The self-rescheduling loop and its controller

mod config;
mod controller;
pub mod keys;
mod loop_worker;
mod state;

pub use config::ActionConfig;
pub use controller::ActionController;
pub use keys::{tokenize, ActionMode, ActionPlan};
pub use loop_worker::jittered_delay;
pub use state::ActionScheduleState;
