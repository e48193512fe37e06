//! Gaze calibrator implementation

use proctor_core::observation::DEGREES_PER_UNIT;
use proctor_core::{CalibrationConfig, ConfigError};
use tracing::{debug, info};

use crate::state::{CalibrationFeedback, CalibrationPhase, CalibrationState};

/// Warning shown while a calibration sample is rejected
pub const LOOK_STRAIGHT_WARNING: &str = "Look straight to continue";

/// Per-axis baseline calibrator
#[derive(Debug, Clone)]
pub struct GazeCalibrator {
    max_offset_degrees: f32,
    state: CalibrationState,
}

impl GazeCalibrator {
    /// Create a new calibrator with configuration
    pub fn new(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            max_offset_degrees: config.max_offset_degrees,
            state: CalibrationState::new(config.target_frames),
        })
    }

    /// Start or restart calibration
    pub fn start(&mut self) {
        self.state.phase = CalibrationPhase::Calibrating;
        self.state.reset_accumulators();
        info!(
            "Gaze calibration started (target {} frames)",
            self.state.target_frames
        );
    }

    /// Abort calibration
    pub fn stop(&mut self) {
        if self.state.phase == CalibrationPhase::Calibrating {
            info!(
                "Gaze calibration aborted after {}/{} frames",
                self.state.frames_accumulated, self.state.target_frames
            );
        }
        self.reset();
    }

    /// Return to idle with a zero baseline
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Process one raw pose reading
    ///
    /// While calibrating the raw values are returned unchanged; otherwise the
    /// baseline offset is subtracted.
    pub fn update(&mut self, raw_yaw: f32, raw_pitch: f32) -> (f32, f32) {
        if self.state.phase != CalibrationPhase::Calibrating {
            return (
                raw_yaw - self.state.baseline_yaw,
                raw_pitch - self.state.baseline_pitch,
            );
        }

        if self.is_out_of_bounds(raw_yaw, raw_pitch) {
            debug!(
                "Calibration paused: sample ({:.3}, {:.3}) outside {} degrees",
                raw_yaw, raw_pitch, self.max_offset_degrees
            );
            self.state.warning = Some(LOOK_STRAIGHT_WARNING.to_string());
            return (raw_yaw, raw_pitch);
        }

        let state = &mut self.state;
        state.warning = None;
        state.sum_yaw += raw_yaw as f64;
        state.sum_pitch += raw_pitch as f64;
        state.frames_accumulated += 1;
        state.progress = (state.frames_accumulated as f32 / state.target_frames as f32).min(1.0);

        if state.frames_accumulated >= state.target_frames {
            let target = state.target_frames as f64;
            state.baseline_yaw = (state.sum_yaw / target) as f32;
            state.baseline_pitch = (state.sum_pitch / target) as f32;
            state.phase = CalibrationPhase::Calibrated;
            info!(
                "Gaze calibration complete: baseline yaw={:.4} pitch={:.4}",
                state.baseline_yaw, state.baseline_pitch
            );
        }

        (raw_yaw, raw_pitch)
    }

    fn is_out_of_bounds(&self, raw_yaw: f32, raw_pitch: f32) -> bool {
        let deg_yaw = (raw_yaw * DEGREES_PER_UNIT).abs();
        let deg_pitch = (raw_pitch * DEGREES_PER_UNIT).abs();

        // NaN fails every comparison, so check finiteness explicitly
        !deg_yaw.is_finite()
            || !deg_pitch.is_finite()
            || deg_yaw > self.max_offset_degrees
            || deg_pitch > self.max_offset_degrees
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.state.phase
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.phase == CalibrationPhase::Calibrated
    }

    /// Current (yaw, pitch) baseline
    pub fn baseline(&self) -> (f32, f32) {
        (self.state.baseline_yaw, self.state.baseline_pitch)
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn feedback(&self) -> CalibrationFeedback {
        self.state.feedback()
    }
}
