//! Drain-all audio level buffer

use proctor_core::{AudioConfig, AudioResult, ConfigError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::CaptureError;

/// Pending chunk levels kept between drains (about 10s of 20ms chunks)
pub const DEFAULT_PENDING_CAPACITY: usize = 512;

/// RMS levels of audio chunks captured since the last tick
///
/// The capture callback pushes every chunk; the control loop drains all of
/// them once per tick and keeps the loudest. When no drain happens the
/// oldest level is overwritten once `capacity` chunks are pending.
#[derive(Debug)]
pub struct AudioLevelBuffer {
    pending: Mutex<VecDeque<f32>>,
    capacity: usize,
    threshold_rms: f32,
    /// Levels overwritten before a drain
    overwritten: AtomicUsize,
}

impl AudioLevelBuffer {
    pub fn new(config: &AudioConfig) -> Result<Self, ConfigError> {
        Self::with_capacity(config, DEFAULT_PENDING_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` pending levels (minimum 1)
    pub fn with_capacity(config: &AudioConfig, capacity: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = capacity.max(1);
        Ok(Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            threshold_rms: config.threshold_rms,
            overwritten: AtomicUsize::new(0),
        })
    }

    /// Queue one chunk of samples, returning its RMS level
    pub fn push_chunk(&self, samples: &[f32]) -> Result<f32, CaptureError> {
        let level = rms(samples)?;
        let mut pending = self.pending.lock().map_err(|_| CaptureError::Poisoned)?;
        if pending.len() == self.capacity {
            pending.pop_front();
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        pending.push_back(level);
        Ok(level)
    }

    /// Consume every pending chunk and report the loudest one
    pub fn drain(&self) -> Result<AudioResult, CaptureError> {
        let mut pending = self.pending.lock().map_err(|_| CaptureError::Poisoned)?;
        let chunks = pending.len();
        let max_rms = pending.drain(..).fold(0.0f32, f32::max);

        if chunks > 1 {
            debug!("Drained {} audio chunks (max rms {:.4})", chunks, max_rms);
        }

        if max_rms <= 0.0 {
            return Ok(AudioResult::silence());
        }

        Ok(AudioResult {
            speech_detected: max_rms > self.threshold_rms,
            rms_level: max_rms,
            decibels: 20.0 * max_rms.log10(),
        })
    }

    /// Number of chunks waiting to be drained
    pub fn pending(&self) -> Result<usize, CaptureError> {
        Ok(self.pending.lock().map_err(|_| CaptureError::Poisoned)?.len())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total levels dropped because the buffer was full
    pub fn overwritten(&self) -> usize {
        self.overwritten.load(Ordering::Relaxed)
    }
}

/// Root mean square amplitude of a chunk
fn rms(samples: &[f32]) -> Result<f32, CaptureError> {
    if samples.is_empty() {
        return Err(CaptureError::EmptyChunk);
    }
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(CaptureError::NonFiniteSample(index));
    }

    let sum_squares: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    Ok((sum_squares / samples.len() as f64).sqrt() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer() -> AudioLevelBuffer {
        AudioLevelBuffer::new(&AudioConfig::default()).unwrap()
    }

    #[test]
    fn test_drain_empty_is_silence() {
        let audio = buffer().drain().unwrap();
        assert_eq!(audio, AudioResult::silence());
    }

    #[test]
    fn test_keeps_loudest_chunk() {
        let buffer = buffer();
        buffer.push_chunk(&[0.001; 64]).unwrap();
        buffer.push_chunk(&[0.1, -0.1, 0.1, -0.1]).unwrap();
        buffer.push_chunk(&[0.0; 64]).unwrap();

        let audio = buffer.drain().unwrap();
        assert!(audio.speech_detected);
        assert!((audio.rms_level - 0.1).abs() < 1e-6);
        assert!((audio.decibels + 20.0).abs() < 1e-3);

        // Everything was consumed
        assert_eq!(buffer.pending().unwrap(), 0);
        assert_eq!(buffer.drain().unwrap(), AudioResult::silence());
    }

    #[test]
    fn test_quiet_chunk_not_speech() {
        let buffer = buffer();
        buffer.push_chunk(&[0.005; 32]).unwrap();

        let audio = buffer.drain().unwrap();
        assert!(!audio.speech_detected);
        assert!(audio.decibels < -40.0);
    }

    #[test]
    fn test_invalid_chunks() {
        let buffer = buffer();
        assert_eq!(buffer.push_chunk(&[]), Err(CaptureError::EmptyChunk));
        assert_eq!(
            buffer.push_chunk(&[0.1, f32::NAN]),
            Err(CaptureError::NonFiniteSample(1))
        );
        assert_eq!(buffer.pending().unwrap(), 0);
    }

    #[test]
    fn test_full_buffer_overwrites_oldest() {
        let buffer = AudioLevelBuffer::with_capacity(&AudioConfig::default(), 3).unwrap();
        buffer.push_chunk(&[0.5; 4]).unwrap();
        for _ in 0..5 {
            buffer.push_chunk(&[0.02; 4]).unwrap();
        }

        assert_eq!(buffer.pending().unwrap(), 3);
        assert_eq!(buffer.overwritten(), 3);

        // The loud chunk was the oldest and has been dropped
        let audio = buffer.drain().unwrap();
        assert!((audio.rms_level - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let buffer = AudioLevelBuffer::with_capacity(&AudioConfig::default(), 0).unwrap();
        buffer.push_chunk(&[0.1; 4]).unwrap();
        buffer.push_chunk(&[0.2; 4]).unwrap();

        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.pending().unwrap(), 1);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = AudioConfig { threshold_rms: -1.0 };
        assert!(AudioLevelBuffer::new(&config).is_err());
    }

    proptest! {
        #[test]
        fn prop_drain_reports_max(levels in prop::collection::vec(0.0f32..1.0, 1..20)) {
            let buffer = buffer();
            for level in &levels {
                // A constant chunk has RMS equal to its magnitude
                buffer.push_chunk(&[*level; 8]).unwrap();
            }

            let max = levels.iter().copied().fold(0.0f32, f32::max);
            let audio = buffer.drain().unwrap();
            prop_assert!((audio.rms_level - max).abs() < 1e-6);
            prop_assert_eq!(audio.speech_detected, audio.rms_level > 0.01);
        }
    }
}
