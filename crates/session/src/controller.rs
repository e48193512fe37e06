//! Session controller implementation

use behavior::{BehaviorAnalyzer, SignalHandler};
use gaze_calibration::{CalibrationFeedback, GazeCalibrator};
use proctor_core::{
    Modality, ModalityResult, ModalityResults, Observation, PoseSample, ProctorConfig, RiskLevel,
};
use risk_engine::RiskEngine;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::report::{SessionState, TickReport};
use crate::SessionError;

/// Sequences calibration and monitoring for one exam at a time
#[derive(Debug)]
pub struct SessionController {
    config: Arc<ProctorConfig>,
    state: SessionState,
    calibrator: GazeCalibrator,
    analyzer: BehaviorAnalyzer,
    risk_engine: RiskEngine,
    session_id: Option<Uuid>,
}

impl SessionController {
    /// Create a new controller
    pub fn new(config: Arc<ProctorConfig>) -> Result<Self, SessionError> {
        config.validate()?;

        let calibrator = GazeCalibrator::new(&config.calibration)?;
        let analyzer = BehaviorAnalyzer::new(&config)?;
        let risk_engine = RiskEngine::new(&config.risk)?;

        info!(
            "Session controller ready (modalities {:?})",
            config.active_modalities
        );

        Ok(Self {
            config,
            state: SessionState::Idle,
            calibrator,
            analyzer,
            risk_engine,
            session_id: None,
        })
    }

    /// Begin a new session
    ///
    /// Any session in progress is discarded first. Without a pose source there
    /// is nothing to calibrate, so the session starts monitoring immediately.
    pub fn start_calibration(&mut self) {
        if self.state != SessionState::Idle {
            info!("Restarting session {:?} from {}", self.session_id, self.state);
        }
        self.reset_session();

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.risk_engine.set_session_id(Some(session_id));

        if !self.config.is_active(Modality::Pose) {
            info!("Session {} has no pose source, skipping calibration", session_id);
            self.transition(SessionState::Monitoring);
            return;
        }

        self.calibrator.start();
        self.transition(SessionState::Calibrating);
    }

    /// Abort calibration, or end the session if already monitoring
    pub fn stop_calibration(&mut self) {
        match self.state {
            SessionState::Idle => debug!("stop_calibration ignored: no session"),
            SessionState::Calibrating => {
                self.calibrator.stop();
                self.reset_session();
                self.transition(SessionState::Idle);
            }
            SessionState::Monitoring => self.stop(),
        }
    }

    /// End the session and clear all per-session state
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        info!(
            "Session {:?} ended after {} risk events",
            self.session_id,
            self.risk_engine.events_emitted()
        );
        self.reset_session();
        self.transition(SessionState::Idle);
    }

    /// Process one observation
    pub fn step(&mut self, observation: &Observation) -> TickReport {
        let report = match self.state {
            SessionState::Idle => {
                TickReport::passthrough(SessionState::Idle, observation.frame_id, observation.timestamp)
            }
            SessionState::Calibrating => self.step_calibrating(observation),
            SessionState::Monitoring => self.step_monitoring(observation),
        };

        metrics::counter!("proctor_ticks_total", "state" => report.state.as_str()).increment(1);
        report
    }

    fn step_calibrating(&mut self, observation: &Observation) -> TickReport {
        let mut report = TickReport::passthrough(
            SessionState::Calibrating,
            observation.frame_id,
            observation.timestamp,
        );

        if let Some((yaw, pitch)) = observation.pose.as_ref().and_then(PoseSample::angles) {
            report.pose = Some(self.calibrator.update(yaw, pitch));
        }
        report.calibration = Some(self.calibrator.feedback());

        if self.calibrator.is_calibrated() {
            metrics::counter!("proctor_calibrations_completed_total").increment(1);
            self.transition(SessionState::Monitoring);
            report.state = SessionState::Monitoring;
        }

        report
    }

    fn step_monitoring(&mut self, observation: &Observation) -> TickReport {
        let mut report = TickReport::passthrough(
            SessionState::Monitoring,
            observation.frame_id,
            observation.timestamp,
        );
        let results = self.collect_results(observation, &mut report);

        report.signals = self.analyzer.analyze(observation.timestamp, &results);
        report.event = self
            .risk_engine
            .process_at(&report.signals, observation.timestamp);
        report.risk_level = self.risk_engine.current_risk_level();
        report.score = self.risk_engine.last_score();

        metrics::gauge!("proctor_risk_score").set(report.score as f64);
        if let Some(event) = &report.event {
            metrics::counter!("proctor_risk_events_total", "level" => event.level.as_str())
                .increment(1);
        }

        report
    }

    /// Gather this tick's results for every active modality
    fn collect_results(&mut self, observation: &Observation, report: &mut TickReport) -> ModalityResults {
        let mut results = ModalityResults::new();

        if self.config.is_active(Modality::Pose) {
            // An active pose source with nothing to report means no face
            let pose = observation.pose.unwrap_or_else(PoseSample::absent);
            let pose = match pose.angles() {
                Some((yaw, pitch)) => {
                    let (yaw, pitch) = self.calibrator.update(yaw, pitch);
                    report.pose = Some((yaw, pitch));
                    pose.with_angles(yaw, pitch)
                }
                None => pose,
            };
            results.insert(Modality::Pose, ModalityResult::Pose(pose));
        }

        if self.config.is_active(Modality::Object) {
            if let Some(objects) = &observation.objects {
                results.insert(Modality::Object, ModalityResult::Objects(objects.clone()));
            }
        }

        if self.config.is_active(Modality::Audio) {
            if let Some(audio) = observation.audio {
                results.insert(Modality::Audio, ModalityResult::Audio(audio));
            }
        }

        results
    }

    /// Replace the handler for a modality
    pub fn register_handler(
        &mut self,
        modality: Modality,
        handler: Box<dyn SignalHandler>,
    ) -> Option<Box<dyn SignalHandler>> {
        self.analyzer.register_handler(modality, handler)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn current_risk_level(&self) -> RiskLevel {
        self.risk_engine.current_risk_level()
    }

    pub fn calibration_feedback(&self) -> CalibrationFeedback {
        self.calibrator.feedback()
    }

    pub fn analyzer(&self) -> &BehaviorAnalyzer {
        &self.analyzer
    }

    pub fn risk_engine(&self) -> &RiskEngine {
        &self.risk_engine
    }

    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    fn reset_session(&mut self) {
        self.calibrator.reset();
        self.analyzer.reset();
        self.risk_engine.reset();
        self.session_id = None;
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!("Session state: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
