//! Gaze Baseline Calibration
//!
//! Captures the candidate's natural "straight ahead" head pose before an exam:
//! - Averages a fixed number of in-bounds pose samples per axis
//! - Rejects samples beyond the allowed offset (anti-cheat) without aborting
//! - Subtracts the fixed baseline from every later reading

mod calibrator;
mod state;

pub use calibrator::{GazeCalibrator, LOOK_STRAIGHT_WARNING};
pub use state::{CalibrationFeedback, CalibrationPhase, CalibrationState};
