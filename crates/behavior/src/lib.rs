//! Behavior Analysis
//!
//! Turns raw per-modality results into discrete, debounced signals:
//! - Face presence and head pose (yaw / pitch debouncing)
//! - Forbidden objects and extra persons
//! - Speech picked up by the microphone
//!
//! Each modality is served by a [`SignalHandler`] registered under its
//! [`Modality`](proctor_core::Modality) tag, so new sources plug in without
//! touching the dispatch loop.

mod analyzer;
mod counters;
mod handlers;

pub use analyzer::BehaviorAnalyzer;
pub use counters::DebounceCounters;
pub use handlers::{AudioHandler, ObjectHandler, PoseHandler, SignalHandler};
