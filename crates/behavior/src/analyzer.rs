//! Behavior analyzer with modality-keyed handler registry

use proctor_core::{
    AnalysisSignal, ConfigError, Modality, ModalityResults, ProctorConfig, Timestamp,
};
use tracing::{debug, info};

use crate::counters::DebounceCounters;
use crate::handlers::{AudioHandler, ObjectHandler, PoseHandler, SignalHandler};

/// Converts per-modality results into debounced signals
pub struct BehaviorAnalyzer {
    /// One slot per modality, indexed by [`Modality::index`]
    handlers: [Option<Box<dyn SignalHandler>>; Modality::COUNT],
    counters: DebounceCounters,
}

impl BehaviorAnalyzer {
    /// Create an analyzer with the pose, object and audio handlers registered
    pub fn new(config: &ProctorConfig) -> Result<Self, ConfigError> {
        config.gaze.validate()?;

        let mut analyzer = Self::empty();
        analyzer.register_handler(
            Modality::Pose,
            Box::new(PoseHandler::new(config.gaze.clone(), config.debounce.clone())),
        );
        analyzer.register_handler(
            Modality::Object,
            Box::new(ObjectHandler::new(config.objects.clone())),
        );
        analyzer.register_handler(Modality::Audio, Box::new(AudioHandler));

        info!(
            "Behavior analyzer ready (yaw {:.2}, pitch {:.2}, debounce {:?})",
            config.gaze.yaw_threshold, config.gaze.pitch_threshold, config.debounce
        );
        Ok(analyzer)
    }

    /// Create an analyzer with no handlers
    pub fn empty() -> Self {
        Self {
            handlers: Default::default(),
            counters: DebounceCounters::default(),
        }
    }

    /// Register the handler for a modality, returning the one it replaces
    pub fn register_handler(
        &mut self,
        modality: Modality,
        handler: Box<dyn SignalHandler>,
    ) -> Option<Box<dyn SignalHandler>> {
        debug!("Registering {} handler", modality);
        self.handlers[modality.index()].replace(handler)
    }

    pub fn has_handler(&self, modality: Modality) -> bool {
        self.handlers[modality.index()].is_some()
    }

    /// Run every registered handler over the results present this tick
    pub fn analyze(&mut self, timestamp: Timestamp, results: &ModalityResults) -> Vec<AnalysisSignal> {
        let mut signals = Vec::new();

        for (modality, result) in results {
            let Some(handler) = &self.handlers[modality.index()] else {
                continue;
            };
            signals.extend(
                handler
                    .handle(result, &mut self.counters)
                    .into_iter()
                    .map(|finding| finding.stamp(timestamp)),
            );
        }

        signals
    }

    pub fn counters(&self) -> &DebounceCounters {
        &self.counters
    }

    /// Zero all debounce counters (session end)
    pub fn reset(&mut self) {
        self.counters.reset();
    }
}

impl std::fmt::Debug for BehaviorAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<Modality> = Modality::ALL
            .into_iter()
            .filter(|m| self.has_handler(*m))
            .collect();
        f.debug_struct("BehaviorAnalyzer")
            .field("handlers", &registered)
            .field("counters", &self.counters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proctor_core::{
        AudioResult, BehaviorType, DetectionResult, Finding, ModalityResult, PoseSample,
    };
    use proptest::prelude::*;

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn pose(yaw: f32, pitch: f32) -> ModalityResults {
        ModalityResults::from([(Modality::Pose, ModalityResult::Pose(PoseSample::new(yaw, pitch)))])
    }

    #[test]
    fn test_looking_away_debounce() {
        let mut analyzer = BehaviorAnalyzer::new(&ProctorConfig::default()).unwrap();

        let emitted: Vec<usize> = (0..6)
            .map(|_| analyzer.analyze(start(), &pose(0.5, 0.0)).len())
            .collect();
        assert_eq!(emitted, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_signals_stamped_with_tick_time() {
        let mut analyzer = BehaviorAnalyzer::new(&ProctorConfig::default()).unwrap();
        let at = start() + Duration::seconds(42);
        let results = ModalityResults::from([
            (
                Modality::Object,
                ModalityResult::Objects(vec![DetectionResult::new("cell phone", 0.9, (0, 0, 1, 1))]),
            ),
            (
                Modality::Audio,
                ModalityResult::Audio(AudioResult {
                    speech_detected: true,
                    rms_level: 0.1,
                    decibels: -20.0,
                }),
            ),
        ]);

        let signals = analyzer.analyze(at, &results);
        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.detected_at == at));
        assert_eq!(signals[0].behavior_type, BehaviorType::PhoneDetected);
        assert_eq!(signals[1].behavior_type, BehaviorType::AudioDetected);
    }

    #[test]
    fn test_missing_modality_skipped() {
        let mut analyzer = BehaviorAnalyzer::new(&ProctorConfig::default()).unwrap();

        let signals = analyzer.analyze(start(), &ModalityResults::new());
        assert!(signals.is_empty());
        assert!(analyzer.counters().is_clear());
    }

    #[test]
    fn test_unregistered_modality_skipped() {
        let mut analyzer = BehaviorAnalyzer::empty();
        assert!(analyzer.analyze(start(), &pose(0.9, 0.9)).is_empty());
    }

    struct AlwaysAudio;

    impl SignalHandler for AlwaysAudio {
        fn handle(&self, _result: &ModalityResult, _counters: &mut DebounceCounters) -> Vec<Finding> {
            vec![Finding::new(BehaviorType::AudioDetected, "custom")]
        }
    }

    #[test]
    fn test_register_replaces_handler() {
        let mut analyzer = BehaviorAnalyzer::new(&ProctorConfig::default()).unwrap();
        let previous = analyzer.register_handler(Modality::Audio, Box::new(AlwaysAudio));
        assert!(previous.is_some());

        let results = ModalityResults::from([(
            Modality::Audio,
            ModalityResult::Audio(AudioResult::silence()),
        )]);
        let signals = analyzer.analyze(start(), &results);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].details, "custom");
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let mut analyzer = BehaviorAnalyzer::new(&ProctorConfig::default()).unwrap();
        analyzer.analyze(start(), &pose(0.5, 0.5));
        assert!(!analyzer.counters().is_clear());

        analyzer.reset();
        assert!(analyzer.counters().is_clear());
    }

    proptest! {
        #[test]
        fn prop_looking_away_only_after_debounce(k in 1usize..20, max in 0u32..6) {
            let mut config = ProctorConfig::default();
            config.debounce.max_frames_looking_away = max;
            let mut analyzer = BehaviorAnalyzer::new(&config).unwrap();

            for tick in 1..=k {
                let looking_away = analyzer
                    .analyze(start(), &pose(0.5, 0.0))
                    .iter()
                    .filter(|s| s.behavior_type == BehaviorType::LookingAway)
                    .count();
                let expected = usize::from(tick > max as usize);
                prop_assert_eq!(looking_away, expected);
            }

            // A single centered frame clears the run
            analyzer.analyze(start(), &pose(0.0, 0.0));
            prop_assert_eq!(analyzer.counters().frames_looking_away, 0);
        }
    }
}
