//! Risk Engine Implementation

use chrono::Utc;
use proctor_core::{AnalysisSignal, ConfigError, RiskConfig, RiskEvent, RiskLevel, Timestamp};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Single-tick risk scorer
///
/// The live level follows every tick with no smoothing; the cooldown only
/// limits how often a [`RiskEvent`] is raised.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
    current_risk_level: RiskLevel,
    last_alert_time: Option<Timestamp>,
    last_score: f32,
    session_id: Option<Uuid>,
    events_emitted: usize,
}

impl RiskEngine {
    /// Create a new risk engine
    pub fn new(config: &RiskConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Creating risk engine (cooldown {}s, {} weights)",
            config.alert_cooldown_seconds,
            config.weights.len()
        );
        Ok(Self {
            config: config.clone(),
            current_risk_level: RiskLevel::Low,
            last_alert_time: None,
            last_score: 0.0,
            session_id: None,
            events_emitted: 0,
        })
    }

    /// Score this tick's signals at wall-clock time
    pub fn process(&mut self, signals: &[AnalysisSignal]) -> Option<RiskEvent> {
        self.process_at(signals, Utc::now())
    }

    /// Score this tick's signals at `now`
    pub fn process_at(&mut self, signals: &[AnalysisSignal], now: Timestamp) -> Option<RiskEvent> {
        if signals.is_empty() {
            self.current_risk_level = RiskLevel::Low;
            self.last_score = 0.0;
            return None;
        }

        let score = self.score(signals);
        let level = RiskLevel::from_score(score);
        self.current_risk_level = level;
        self.last_score = score;

        if level == RiskLevel::Low {
            return None;
        }

        if !self.cooldown_elapsed(now) {
            debug!("Risk event suppressed: {} in cooldown period", level);
            return None;
        }

        self.last_alert_time = Some(now);
        self.events_emitted += 1;

        let reasons: BTreeSet<String> = signals.iter().map(|s| s.details.clone()).collect();
        warn!("RISK EVENT: {} (score {:.2}) - {:?}", level, score, reasons);

        Some(RiskEvent {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            timestamp: now,
            level,
            score,
            reasons,
        })
    }

    /// Sum of behavior weights; repeated types each count
    fn score(&self, signals: &[AnalysisSignal]) -> f32 {
        signals
            .iter()
            .map(|s| self.config.weight(s.behavior_type))
            .sum()
    }

    fn cooldown_elapsed(&self, now: Timestamp) -> bool {
        match self.last_alert_time {
            None => true,
            Some(last) => {
                let elapsed = now - last;
                let seconds = match elapsed.num_nanoseconds() {
                    Some(nanos) => nanos as f64 / 1e9,
                    None => elapsed.num_milliseconds() as f64 / 1000.0,
                };
                seconds > self.config.alert_cooldown_seconds
            }
        }
    }

    pub fn current_risk_level(&self) -> RiskLevel {
        self.current_risk_level
    }

    /// Score of the most recent tick (0 for a clean tick)
    pub fn last_score(&self) -> f32 {
        self.last_score
    }

    pub fn last_alert_time(&self) -> Option<Timestamp> {
        self.last_alert_time
    }

    /// Number of events raised since the last reset
    pub fn events_emitted(&self) -> usize {
        self.events_emitted
    }

    /// Tag future events with a session
    pub fn set_session_id(&mut self, session_id: Option<Uuid>) {
        self.session_id = session_id;
    }

    /// Clear cooldown and level (session end)
    pub fn reset(&mut self) {
        self.current_risk_level = RiskLevel::Low;
        self.last_alert_time = None;
        self.last_score = 0.0;
        self.session_id = None;
        self.events_emitted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proctor_core::{BehaviorType, Finding};
    use proptest::prelude::*;

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn signal(behavior: BehaviorType, details: &str) -> AnalysisSignal {
        Finding::new(behavior, details).stamp(start())
    }

    fn engine() -> RiskEngine {
        RiskEngine::new(&RiskConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_weights_rejected() {
        let config = RiskConfig {
            weights: Default::default(),
            ..Default::default()
        };
        assert!(RiskEngine::new(&config).is_err());
    }

    #[test]
    fn test_phone_is_high() {
        let mut engine = engine();
        let event = engine.process_at(&[signal(BehaviorType::PhoneDetected, "phone")], start());

        assert_eq!(engine.current_risk_level(), RiskLevel::High);
        let event = event.unwrap();
        assert_eq!(event.level, RiskLevel::High);
        assert_eq!(event.score, 1.0);
        assert_eq!(event.timestamp, start());
    }

    #[test]
    fn test_medium_level() {
        let mut engine = engine();

        // 0.5 alone is medium
        let event = engine.process_at(&[signal(BehaviorType::LookingAway, "away")], start());
        assert_eq!(event.map(|e| e.level), Some(RiskLevel::Medium));
        assert_eq!(engine.current_risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn test_duplicates_sum_but_reasons_dedup() {
        let mut engine = engine();
        let signals = [
            signal(BehaviorType::LookingAway, "away"),
            signal(BehaviorType::LookingAway, "away"),
        ];

        let event = engine.process_at(&signals, start()).unwrap();
        assert_eq!(event.level, RiskLevel::High);
        assert_eq!(event.score, 1.0);
        assert_eq!(event.reasons.len(), 1);
    }

    #[test]
    fn test_cooldown() {
        let mut engine = engine();
        let high = [signal(BehaviorType::PhoneDetected, "phone")];

        assert!(engine.process_at(&high, start()).is_some());
        assert!(engine
            .process_at(&high, start() + Duration::milliseconds(1500))
            .is_none());
        // Level still tracks the tick while the event is suppressed
        assert_eq!(engine.current_risk_level(), RiskLevel::High);

        assert!(engine
            .process_at(&high, start() + Duration::milliseconds(2500))
            .is_some());
        assert_eq!(engine.events_emitted(), 2);
    }

    #[test]
    fn test_cooldown_boundary_is_exclusive() {
        let mut engine = engine();
        let high = [signal(BehaviorType::PhoneDetected, "phone")];

        engine.process_at(&high, start());
        assert!(engine.process_at(&high, start() + Duration::seconds(2)).is_none());
    }

    #[test]
    fn test_cooldown_sub_millisecond_overshoot() {
        let mut engine = engine();
        let high = [signal(BehaviorType::PhoneDetected, "phone")];

        engine.process_at(&high, start());
        assert!(engine
            .process_at(&high, start() + Duration::microseconds(2_000_500))
            .is_some());
    }

    #[test]
    fn test_empty_resets_level() {
        let mut engine = engine();
        engine.process_at(&[signal(BehaviorType::PhoneDetected, "phone")], start());
        assert_eq!(engine.current_risk_level(), RiskLevel::High);

        assert!(engine.process_at(&[], start() + Duration::seconds(10)).is_none());
        assert_eq!(engine.current_risk_level(), RiskLevel::Low);
        assert_eq!(engine.last_score(), 0.0);
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut engine = engine();
        let high = [signal(BehaviorType::PhoneDetected, "phone")];
        engine.set_session_id(Some(Uuid::new_v4()));

        engine.process_at(&high, start());
        engine.reset();

        assert!(engine.last_alert_time().is_none());
        let event = engine.process_at(&high, start()).unwrap();
        assert!(event.session_id.is_none());
    }

    #[test]
    fn test_unweighted_type_scores_zero() {
        let mut config = RiskConfig::default();
        config.weights.remove(&BehaviorType::AudioDetected);
        let mut engine = RiskEngine::new(&config).unwrap();

        assert!(engine
            .process_at(&[signal(BehaviorType::AudioDetected, "talking")], start())
            .is_none());
        assert_eq!(engine.current_risk_level(), RiskLevel::Low);
    }

    proptest! {
        #[test]
        fn prop_no_event_at_low_level(count in 1usize..5, weight in 0.0f32..0.0999) {
            let mut config = RiskConfig::default();
            config.weights.insert(BehaviorType::LookingAway, weight);
            let mut engine = RiskEngine::new(&config).unwrap();

            let signals: Vec<AnalysisSignal> = (0..count)
                .map(|_| signal(BehaviorType::LookingAway, "away"))
                .collect();

            prop_assert!(engine.process_at(&signals, start()).is_none());
            prop_assert_eq!(engine.current_risk_level(), RiskLevel::Low);
            prop_assert!(engine.last_alert_time().is_none());
        }
    }
}
