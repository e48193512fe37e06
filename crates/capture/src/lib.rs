//! Observation Capture Buffers
//!
//! Hand-off points between acquisition threads and the control loop:
//! - Single-slot latest observation (frames may be skipped, never queued)
//! - Audio level buffer drained in full every tick (bursts are never lost)

mod audio;
mod slot;

pub use audio::{AudioLevelBuffer, DEFAULT_PENDING_CAPACITY};
pub use slot::ObservationSlot;

use thiserror::Error;

/// Capture error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Buffer lock poisoned by a panicked producer")]
    Poisoned,

    #[error("Audio chunk is empty")]
    EmptyChunk,

    #[error("Audio chunk contains a non-finite sample at index {0}")]
    NonFiniteSample(usize),
}
