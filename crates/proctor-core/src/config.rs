//! Proctoring session configuration
//!
//! One immutable value, built before a session starts and shared by reference
//! with every pipeline stage. [`ProctorConfig::validate`] rejects bad values up
//! front so nothing is discovered mid-session.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::observation::Modality;
use crate::signal::BehaviorType;

/// Environment variable prefix for overrides (e.g. `PROCTOR_GAZE__YAW_THRESHOLD`)
pub const ENV_PREFIX: &str = "PROCTOR";

/// Head pose thresholds (normalized units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Left/right deviation before a frame counts as looking away
    pub yaw_threshold: f32,
    /// Up/down deviation before a frame counts as a pitch violation
    pub pitch_threshold: f32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: 0.20,
            pitch_threshold: 0.20,
        }
    }
}

/// Consecutive-frame limits before a condition becomes a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub max_frames_missing_face: u32,
    pub max_frames_looking_away: u32,
    pub max_frames_pitch_violation: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            max_frames_missing_face: 30, // ~1s at 30fps
            max_frames_looking_away: 3,
            max_frames_pitch_violation: 5,
        }
    }
}

/// Risk scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Minimum seconds between two emitted risk events
    pub alert_cooldown_seconds: f64,
    /// Score contributed by each signal of a behavior type
    pub weights: BTreeMap<BehaviorType, f32>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let weights = BTreeMap::from([
            (BehaviorType::PhoneDetected, 1.0),
            (BehaviorType::PersonLimitViolation, 0.8),
            (BehaviorType::FaceNotVisible, 0.6),
            (BehaviorType::LookingAway, 0.5),
            (BehaviorType::PitchViolation, 0.5),
            (BehaviorType::AudioDetected, 0.7),
            (BehaviorType::HeadphoneDetected, 0.9),
            (BehaviorType::ObjectDetected, 0.9),
        ]);

        Self {
            alert_cooldown_seconds: 2.0,
            weights,
        }
    }
}

impl RiskConfig {
    /// Weight of a behavior type (0.0 when not in the table)
    pub fn weight(&self, behavior: BehaviorType) -> f32 {
        self.weights.get(&behavior).copied().unwrap_or(0.0)
    }
}

/// Object detection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    /// Labels that raise a high-severity signal (matched case-insensitively)
    pub forbidden_objects: BTreeSet<String>,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            forbidden_objects: ["cell phone", "mobile phone", "headphone", "headset"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ObjectConfig {
    pub fn is_forbidden(&self, label: &str) -> bool {
        self.forbidden_objects
            .iter()
            .any(|forbidden| forbidden.eq_ignore_ascii_case(label.trim()))
    }
}

/// Gaze baseline calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// In-bounds samples required to fix the baseline
    pub target_frames: u32,
    /// Largest head offset (degrees, either axis) accepted as a sample
    pub max_offset_degrees: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            target_frames: 60,
            max_offset_degrees: 20.0,
        }
    }
}

/// Audio level detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// RMS amplitude above which a chunk counts as speech
    pub threshold_rms: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { threshold_rms: 0.01 }
    }
}

/// Complete proctoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    /// Sources consulted each tick
    pub active_modalities: BTreeSet<Modality>,
    pub gaze: GazeConfig,
    pub debounce: DebounceConfig,
    pub risk: RiskConfig,
    pub objects: ObjectConfig,
    pub calibration: CalibrationConfig,
    pub audio: AudioConfig,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            active_modalities: Modality::ALL.into_iter().collect(),
            gaze: GazeConfig::default(),
            debounce: DebounceConfig::default(),
            risk: RiskConfig::default(),
            objects: ObjectConfig::default(),
            calibration: CalibrationConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl ProctorConfig {
    /// Create strict config (lower thresholds, shorter debounce)
    pub fn strict() -> Self {
        Self {
            gaze: GazeConfig {
                yaw_threshold: 0.15,
                pitch_threshold: 0.15,
            },
            debounce: DebounceConfig {
                max_frames_missing_face: 15,
                max_frames_looking_away: 2,
                max_frames_pitch_violation: 3,
            },
            risk: RiskConfig {
                alert_cooldown_seconds: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds, longer debounce)
    pub fn lenient() -> Self {
        Self {
            gaze: GazeConfig {
                yaw_threshold: 0.30,
                pitch_threshold: 0.30,
            },
            debounce: DebounceConfig {
                max_frames_missing_face: 60,
                max_frames_looking_away: 8,
                max_frames_pitch_violation: 10,
            },
            risk: RiskConfig {
                alert_cooldown_seconds: 5.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load defaults, then an optional file, then `PROCTOR_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!("Reading configuration file {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        loaded.validate()?;

        info!("Loaded proctoring configuration: {:?}", loaded);
        Ok(loaded)
    }

    pub fn is_active(&self, modality: Modality) -> bool {
        self.active_modalities.contains(&modality)
    }

    /// Reject values that would make a session misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_modalities.is_empty() {
            return Err(ConfigError::NoActiveModalities);
        }

        self.gaze.validate()?;
        self.risk.validate()?;
        self.calibration.validate()?;
        self.audio.validate()
    }
}

impl GazeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("gaze.yaw_threshold", self.yaw_threshold as f64)?;
        non_negative("gaze.pitch_threshold", self.pitch_threshold as f64)
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("risk.alert_cooldown_seconds", self.alert_cooldown_seconds)?;

        if self.weights.is_empty() {
            return Err(ConfigError::EmptyWeightTable);
        }
        for weight in self.weights.values() {
            non_negative("risk.weights", *weight as f64)?;
        }
        Ok(())
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_frames == 0 {
            return Err(ConfigError::InvalidValue {
                field: "calibration.target_frames",
                value: 0.0,
                reason: "must be greater than zero",
            });
        }

        let offset = self.max_offset_degrees as f64;
        if !offset.is_finite() || offset <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "calibration.max_offset_degrees",
                value: offset,
                reason: "must be a positive number of degrees",
            });
        }
        Ok(())
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("audio.threshold_rms", self.threshold_rms as f64)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        Err(ConfigError::InvalidValue {
            field,
            value,
            reason: "must be a finite, non-negative number",
        })
    } else {
        Ok(())
    }
}
