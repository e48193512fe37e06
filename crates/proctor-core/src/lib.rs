//! Proctoring Core Types
//!
//! Shared vocabulary for the exam-monitoring pipeline:
//! - Per-frame observations (head pose, object detections, audio level)
//! - Modality-tagged results consumed by the behavior analyzer
//! - Analysis signals and risk events
//! - Validated, immutable session configuration

pub mod config;
pub mod error;
pub mod observation;
pub mod signal;

pub use config::{
    AudioConfig, CalibrationConfig, DebounceConfig, GazeConfig, ObjectConfig, ProctorConfig,
    RiskConfig,
};
pub use error::ConfigError;
pub use observation::{
    AudioResult, DetectionResult, Modality, ModalityResult, ModalityResults, Observation,
    PoseSample,
};
pub use signal::{AnalysisSignal, BehaviorType, Finding, RiskEvent, RiskLevel};

/// Timestamp type used across the pipeline
pub type Timestamp = chrono::DateTime<chrono::Utc>;
