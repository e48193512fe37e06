//! Per-frame observations and modality-tagged results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Timestamp;

/// Degrees represented by a normalized pose value of 1.0
pub const DEGREES_PER_UNIT: f32 = 90.0;

/// Sensing channel
///
/// Ordering is the fixed polling order of a tick: pose, object, audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Pose,
    Object,
    Audio,
}

impl Modality {
    pub const COUNT: usize = 3;

    /// All modalities in polling order
    pub const ALL: [Modality; Self::COUNT] = [Modality::Pose, Modality::Object, Modality::Audio];

    /// Position in the polling order
    pub fn index(self) -> usize {
        match self {
            Modality::Pose => 0,
            Modality::Object => 1,
            Modality::Audio => 2,
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Modality::Pose => "pose",
            Modality::Object => "object",
            Modality::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Normalized head pose (0 = straight ahead, +/-1 = 90 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseSample {
    /// Whether a face was found in the frame
    pub present: bool,
    /// Left/right rotation
    #[serde(default)]
    pub yaw: Option<f32>,
    /// Up/down tilt
    #[serde(default)]
    pub pitch: Option<f32>,
}

impl PoseSample {
    /// Face present with the given normalized angles
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            present: true,
            yaw: Some(yaw),
            pitch: Some(pitch),
        }
    }

    /// No face in frame
    pub fn absent() -> Self {
        Self::default()
    }

    /// Build from Euler angles in degrees, clamped to the normalized range
    pub fn from_degrees(yaw_deg: f32, pitch_deg: f32) -> Self {
        Self::new(
            (yaw_deg / DEGREES_PER_UNIT).clamp(-1.0, 1.0),
            (pitch_deg / DEGREES_PER_UNIT).clamp(-1.0, 1.0),
        )
    }

    /// Angles if a face is present; a missing axis reads as centered
    pub fn angles(&self) -> Option<(f32, f32)> {
        if !self.present {
            return None;
        }
        Some((self.yaw.unwrap_or(0.0), self.pitch.unwrap_or(0.0)))
    }

    /// Same sample with the angles replaced
    pub fn with_angles(self, yaw: f32, pitch: f32) -> Self {
        Self {
            yaw: Some(yaw),
            pitch: Some(pitch),
            ..self
        }
    }
}

/// Object detector output for one box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub label: String,
    pub confidence: f32,
    /// Bounding box (x1, y1, x2, y2) in pixels
    #[serde(rename = "box")]
    pub bbox: (i32, i32, i32, i32),
}

impl DetectionResult {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: (i32, i32, i32, i32)) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Audio level over the chunks drained since the last tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioResult {
    pub speech_detected: bool,
    #[serde(default)]
    pub rms_level: f32,
    pub decibels: f32,
}

impl AudioResult {
    /// Decibel floor reported for digital silence
    pub const SILENCE_DB: f32 = -100.0;

    pub fn silence() -> Self {
        Self {
            speech_detected: false,
            rms_level: 0.0,
            decibels: Self::SILENCE_DB,
        }
    }
}

/// Result of one modality for one tick
#[derive(Debug, Clone, PartialEq)]
pub enum ModalityResult {
    Pose(PoseSample),
    Objects(Vec<DetectionResult>),
    Audio(AudioResult),
}

impl ModalityResult {
    /// Modality this result belongs to
    pub fn modality(&self) -> Modality {
        match self {
            ModalityResult::Pose(_) => Modality::Pose,
            ModalityResult::Objects(_) => Modality::Object,
            ModalityResult::Audio(_) => Modality::Audio,
        }
    }
}

/// Results of every modality that produced data this tick
pub type ModalityResults = BTreeMap<Modality, ModalityResult>;

/// Snapshot handed to the session controller each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub frame_id: u64,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub pose: Option<PoseSample>,
    #[serde(default)]
    pub objects: Option<Vec<DetectionResult>>,
    #[serde(default)]
    pub audio: Option<AudioResult>,
}

impl Observation {
    /// Empty observation (no modality produced data)
    pub fn new(frame_id: u64, timestamp: Timestamp) -> Self {
        Self {
            frame_id,
            timestamp,
            pose: None,
            objects: None,
            audio: None,
        }
    }

    pub fn with_pose(mut self, pose: PoseSample) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_objects(mut self, objects: Vec<DetectionResult>) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn with_audio(mut self, audio: AudioResult) -> Self {
        self.audio = Some(audio);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_degrees_clamps() {
        let pose = PoseSample::from_degrees(45.0, -180.0);
        assert_eq!(pose.yaw, Some(0.5));
        assert_eq!(pose.pitch, Some(-1.0));
        assert!(pose.present);
    }

    #[test]
    fn test_absent_has_no_angles() {
        assert_eq!(PoseSample::absent().angles(), None);

        let partial = PoseSample {
            present: true,
            yaw: Some(0.3),
            pitch: None,
        };
        assert_eq!(partial.angles(), Some((0.3, 0.0)));
    }

    #[test]
    fn test_modality_order() {
        let mut results = ModalityResults::new();
        results.insert(Modality::Audio, ModalityResult::Audio(AudioResult::silence()));
        results.insert(Modality::Pose, ModalityResult::Pose(PoseSample::absent()));
        results.insert(Modality::Object, ModalityResult::Objects(Vec::new()));

        let order: Vec<Modality> = results.keys().copied().collect();
        assert_eq!(order, Modality::ALL.to_vec());
    }

    #[test]
    fn test_observation_from_json() {
        let json = r#"{
            "frame_id": 7,
            "timestamp": "2024-05-01T09:00:00Z",
            "pose": {"present": true, "yaw": 0.1, "pitch": -0.05},
            "objects": [{"label": "cell phone", "confidence": 0.9, "box": [1, 2, 3, 4]}]
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();

        assert_eq!(obs.frame_id, 7);
        assert_eq!(obs.pose, Some(PoseSample::new(0.1, -0.05)));
        assert_eq!(obs.objects.as_ref().map(Vec::len), Some(1));
        assert!(obs.audio.is_none());
    }
}
