//! Single-slot latest value holder

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::CaptureError;

/// Most recent value published by a producer thread
///
/// Publishing overwrites the previous value; readers always see the newest
/// snapshot together with its sequence number.
#[derive(Debug, Default)]
pub struct ObservationSlot<T> {
    latest: Mutex<Option<(u64, T)>>,
    /// Values overwritten before anyone took them
    dropped: AtomicUsize,
}

impl<T: Clone> ObservationSlot<T> {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Replace the held value, returning its sequence number (starting at 1)
    pub fn publish(&self, value: T) -> Result<u64, CaptureError> {
        let mut latest = self.latest.lock().map_err(|_| CaptureError::Poisoned)?;
        let seq = latest.as_ref().map_or(1, |(seq, _)| seq + 1);
        *latest = Some((seq, value));
        Ok(seq)
    }

    /// Clone of the newest value and its sequence number
    pub fn latest(&self) -> Result<Option<(u64, T)>, CaptureError> {
        let latest = self.latest.lock().map_err(|_| CaptureError::Poisoned)?;
        Ok(latest.clone())
    }

    /// Newest value if it was published after `last_seen`
    ///
    /// Any values published in between are counted as dropped.
    pub fn take_if_newer(&self, last_seen: u64) -> Result<Option<(u64, T)>, CaptureError> {
        let latest = self.latest.lock().map_err(|_| CaptureError::Poisoned)?;
        match latest.as_ref() {
            Some((seq, value)) if *seq > last_seen => {
                let skipped = (*seq - last_seen - 1) as usize;
                if skipped > 0 {
                    self.dropped.fetch_add(skipped, Ordering::Relaxed);
                }
                Ok(Some((*seq, value.clone())))
            }
            _ => Ok(None),
        }
    }

    /// Total values overwritten before being read
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_slot() {
        let slot: ObservationSlot<u32> = ObservationSlot::new();
        assert_eq!(slot.latest().unwrap(), None);
        assert_eq!(slot.take_if_newer(0).unwrap(), None);
    }

    #[test]
    fn test_publish_overwrites() {
        let slot = ObservationSlot::new();
        assert_eq!(slot.publish("a").unwrap(), 1);
        assert_eq!(slot.publish("b").unwrap(), 2);

        assert_eq!(slot.latest().unwrap(), Some((2, "b")));
    }

    #[test]
    fn test_take_if_newer_counts_skipped() {
        let slot = ObservationSlot::new();
        for i in 0..5 {
            slot.publish(i).unwrap();
        }

        assert_eq!(slot.take_if_newer(1).unwrap(), Some((5, 4)));
        assert_eq!(slot.dropped(), 3);

        // Nothing new since 5
        assert_eq!(slot.take_if_newer(5).unwrap(), None);
    }

    #[test]
    fn test_producer_thread() {
        let slot = Arc::new(ObservationSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..100u32 {
                    slot.publish(i).unwrap();
                }
            })
        };
        producer.join().unwrap();

        assert_eq!(slot.latest().unwrap(), Some((100, 99)));
    }

    #[test]
    fn test_poisoned_lock() {
        let slot = Arc::new(ObservationSlot::new());
        slot.publish(1u32).unwrap();

        let poisoner = Arc::clone(&slot);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.latest.lock().unwrap();
            panic!("producer crashed");
        })
        .join();

        assert_eq!(slot.publish(2), Err(CaptureError::Poisoned));
    }
}
