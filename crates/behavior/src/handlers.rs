//! Per-modality signal handlers

use proctor_core::{
    AudioResult, BehaviorType, DebounceConfig, DetectionResult, Finding, GazeConfig,
    ModalityResult, ObjectConfig, PoseSample,
};
use tracing::debug;

use crate::counters::DebounceCounters;

/// Capability to turn one modality's result into findings
pub trait SignalHandler: Send {
    /// Consume a result, updating the shared debounce counters as needed
    fn handle(&self, result: &ModalityResult, counters: &mut DebounceCounters) -> Vec<Finding>;
}

/// Face presence and head pose
#[derive(Debug, Clone)]
pub struct PoseHandler {
    gaze: GazeConfig,
    debounce: DebounceConfig,
}

impl PoseHandler {
    pub fn new(gaze: GazeConfig, debounce: DebounceConfig) -> Self {
        Self { gaze, debounce }
    }

    fn analyze(&self, pose: &PoseSample, counters: &mut DebounceCounters) -> Vec<Finding> {
        let mut findings = Vec::new();

        let Some((yaw, pitch)) = pose.angles() else {
            let missing = DebounceCounters::track(
                &mut counters.frames_no_face,
                true,
                self.debounce.max_frames_missing_face,
            );
            if missing {
                findings.push(Finding::new(
                    BehaviorType::FaceNotVisible,
                    format!("Face missing for {} frames", counters.frames_no_face),
                ));
            }
            return findings;
        };

        counters.frames_no_face = 0;

        let looking_away = DebounceCounters::track(
            &mut counters.frames_looking_away,
            yaw.abs() > self.gaze.yaw_threshold,
            self.debounce.max_frames_looking_away,
        );
        if looking_away {
            findings.push(Finding::new(
                BehaviorType::LookingAway,
                format!("Looking away (yaw {:.2})", yaw),
            ));
        }

        let pitch_violation = DebounceCounters::track(
            &mut counters.frames_pitch_violation,
            pitch.abs() > self.gaze.pitch_threshold,
            self.debounce.max_frames_pitch_violation,
        );
        if pitch_violation {
            findings.push(Finding::new(
                BehaviorType::PitchViolation,
                format!("Head tilted away (pitch {:.2})", pitch),
            ));
        }

        findings
    }
}

impl SignalHandler for PoseHandler {
    fn handle(&self, result: &ModalityResult, counters: &mut DebounceCounters) -> Vec<Finding> {
        match result {
            ModalityResult::Pose(pose) => self.analyze(pose, counters),
            other => mismatched("pose", other),
        }
    }
}

/// Forbidden objects and person count
#[derive(Debug, Clone)]
pub struct ObjectHandler {
    objects: ObjectConfig,
}

impl ObjectHandler {
    pub fn new(objects: ObjectConfig) -> Self {
        Self { objects }
    }

    fn analyze(&self, detections: &[DetectionResult]) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut person_count = 0;

        for detection in detections {
            if detection.label.trim().eq_ignore_ascii_case("person") {
                person_count += 1;
            }

            if self.objects.is_forbidden(&detection.label) {
                findings.push(Finding::new(
                    BehaviorType::for_object_label(&detection.label),
                    format!("Forbidden object detected: {}", detection.label.trim().to_lowercase()),
                ));
            }
        }

        // The candidate counts as one person
        if person_count > 1 {
            findings.push(Finding::new(
                BehaviorType::PersonLimitViolation,
                format!("Multiple people detected ({})", person_count),
            ));
        }

        findings
    }
}

impl SignalHandler for ObjectHandler {
    fn handle(&self, result: &ModalityResult, _counters: &mut DebounceCounters) -> Vec<Finding> {
        match result {
            ModalityResult::Objects(detections) => self.analyze(detections),
            other => mismatched("object", other),
        }
    }
}

/// Speech detection
#[derive(Debug, Clone, Default)]
pub struct AudioHandler;

impl AudioHandler {
    fn analyze(&self, audio: &AudioResult) -> Vec<Finding> {
        if !audio.speech_detected {
            return Vec::new();
        }
        vec![Finding::new(
            BehaviorType::AudioDetected,
            format!("Speech detected ({:.1} dB)", audio.decibels),
        )]
    }
}

impl SignalHandler for AudioHandler {
    fn handle(&self, result: &ModalityResult, _counters: &mut DebounceCounters) -> Vec<Finding> {
        match result {
            ModalityResult::Audio(audio) => self.analyze(audio),
            other => mismatched("audio", other),
        }
    }
}

fn mismatched(handler: &str, result: &ModalityResult) -> Vec<Finding> {
    debug!("{} handler ignoring {} result", handler, result.modality());
    Vec::new()
}
