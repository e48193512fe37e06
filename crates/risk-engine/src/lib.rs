//! Risk Scoring
//!
//! Aggregates the signals of one tick into a risk level and rate-limits the
//! resulting notifications with a cooldown.

mod engine;

pub use engine::RiskEngine;
