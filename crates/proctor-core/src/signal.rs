//! Analysis signals and risk events

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::Timestamp;

/// Risk level / signal severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Level for a single-tick score
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavior categories recognized by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorType {
    /// Head turned left/right
    LookingAway,
    /// Head tilted up/down
    PitchViolation,
    PhoneDetected,
    HeadphoneDetected,
    /// Any other forbidden object
    ObjectDetected,
    /// More than one person in view
    PersonLimitViolation,
    FaceNotVisible,
    /// Speech picked up by the microphone
    AudioDetected,
}

impl BehaviorType {
    /// Fixed severity of signals of this type
    pub fn severity(self) -> RiskLevel {
        match self {
            BehaviorType::LookingAway => RiskLevel::Low,
            BehaviorType::PitchViolation | BehaviorType::FaceNotVisible => RiskLevel::Medium,
            BehaviorType::PhoneDetected
            | BehaviorType::HeadphoneDetected
            | BehaviorType::ObjectDetected
            | BehaviorType::PersonLimitViolation
            | BehaviorType::AudioDetected => RiskLevel::High,
        }
    }

    /// Classify a forbidden object label
    pub fn for_object_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "cell phone" | "mobile phone" | "phone" | "smartphone" => BehaviorType::PhoneDetected,
            "headphone" | "headphones" | "headset" | "earbuds" => BehaviorType::HeadphoneDetected,
            _ => BehaviorType::ObjectDetected,
        }
    }
}

/// Unstamped handler output
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub behavior_type: BehaviorType,
    pub details: String,
}

impl Finding {
    pub fn new(behavior_type: BehaviorType, details: impl Into<String>) -> Self {
        Self {
            behavior_type,
            details: details.into(),
        }
    }

    /// Stamp with the tick timestamp
    pub fn stamp(self, detected_at: Timestamp) -> AnalysisSignal {
        AnalysisSignal {
            behavior_type: self.behavior_type,
            severity: self.behavior_type.severity(),
            details: self.details,
            detected_at,
        }
    }
}

/// Debounced behavior observed during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSignal {
    pub behavior_type: BehaviorType,
    pub severity: RiskLevel,
    pub details: String,
    pub detected_at: Timestamp,
}

/// Cooldown-gated risk notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: Uuid,
    /// Session that produced the event, if one was running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub timestamp: Timestamp,
    pub level: RiskLevel,
    /// Score of the tick that raised the event
    pub score: f32,
    pub reasons: BTreeSet<String>,
}
