//! Session states and per-tick reports

use gaze_calibration::CalibrationFeedback;
use proctor_core::{AnalysisSignal, RiskEvent, RiskLevel, Timestamp};
use serde::{Deserialize, Serialize};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Calibrating,
    Monitoring,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Calibrating => "calibrating",
            SessionState::Monitoring => "monitoring",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotated outcome of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// State after the tick
    pub state: SessionState,
    pub frame_id: u64,
    pub timestamp: Timestamp,

    /// Calibration progress (calibrating ticks only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationFeedback>,

    /// Pose shown to the user: raw while calibrating, baseline-corrected while monitoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<(f32, f32)>,

    pub risk_level: RiskLevel,
    pub score: f32,
    pub signals: Vec<AnalysisSignal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<RiskEvent>,
}

impl TickReport {
    /// Report with no annotations
    pub fn passthrough(state: SessionState, frame_id: u64, timestamp: Timestamp) -> Self {
        Self {
            state,
            frame_id,
            timestamp,
            calibration: None,
            pose: None,
            risk_level: RiskLevel::Low,
            score: 0.0,
            signals: Vec::new(),
            event: None,
        }
    }

    pub fn has_event(&self) -> bool {
        self.event.is_some()
    }
}
