//! Calibration state tracking

use serde::{Deserialize, Serialize};

/// Calibration lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalibrationPhase {
    #[default]
    Idle,
    Calibrating,
    Calibrated,
}

/// Accumulated calibration state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub phase: CalibrationPhase,

    /// In-bounds samples accumulated so far
    pub frames_accumulated: u32,

    /// Samples required to fix the baseline
    pub target_frames: u32,

    pub sum_yaw: f64,
    pub sum_pitch: f64,

    pub baseline_yaw: f32,
    pub baseline_pitch: f32,

    /// User-facing warning while a sample is rejected
    pub warning: Option<String>,

    /// Fraction of target reached (0-1)
    pub progress: f32,
}

impl CalibrationState {
    pub fn new(target_frames: u32) -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            frames_accumulated: 0,
            target_frames,
            sum_yaw: 0.0,
            sum_pitch: 0.0,
            baseline_yaw: 0.0,
            baseline_pitch: 0.0,
            warning: None,
            progress: 0.0,
        }
    }

    /// Clear accumulators and feedback, keeping phase and baseline
    pub fn reset_accumulators(&mut self) {
        self.frames_accumulated = 0;
        self.sum_yaw = 0.0;
        self.sum_pitch = 0.0;
        self.warning = None;
        self.progress = 0.0;
    }

    /// Back to an uncalibrated idle state with zero offset
    pub fn reset(&mut self) {
        *self = Self::new(self.target_frames);
    }

    /// Snapshot for the caller's progress display
    pub fn feedback(&self) -> CalibrationFeedback {
        CalibrationFeedback {
            progress: self.progress,
            warning: self.warning.clone(),
            frames_accumulated: self.frames_accumulated,
            target_frames: self.target_frames,
        }
    }
}

/// Progress report shown while calibrating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFeedback {
    pub progress: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub frames_accumulated: u32,
    pub target_frames: u32,
}
