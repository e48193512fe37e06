//! Exam Session Controller
//!
//! Top-level state machine for one proctored exam:
//! - Idle: frames pass through untouched
//! - Calibrating: pose samples feed the gaze calibrator only
//! - Monitoring: every active modality is analyzed and scored
//!
//! The controller owns all per-session state and clears it whenever a session
//! ends or restarts.

mod controller;
mod report;

pub use controller::SessionController;
pub use report::{SessionState, TickReport};

use proctor_core::ConfigError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
