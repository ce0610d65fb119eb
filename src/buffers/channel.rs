use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{AdcSample, AxisSample, Channel, SensorFrame};

pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity ring of the most recent samples for one channel.
///
/// Clones share the same storage: the ingestion loop pushes through one
/// handle while readers take snapshots through another. The lock is only
/// held for the duration of a push or a copy.
pub struct ChannelBuffer<T> {
    samples: Arc<Mutex<VecDeque<T>>>,
    capacity: usize,
}

impl<T: Clone> ChannelBuffer<T> {
    /// Create a buffer holding at most `capacity` samples (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a sample, evicting the oldest when full
    pub fn push(&self, sample: T) {
        let mut samples = self.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<T> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<T> Clone for ChannelBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            samples: self.samples.clone(),
            capacity: self.capacity,
        }
    }
}

/// The three per-channel buffers of one session
#[derive(Clone)]
pub struct ChannelBuffers {
    pub adc: ChannelBuffer<AdcSample>,
    pub accel: ChannelBuffer<AxisSample>,
    pub gyro: ChannelBuffer<AxisSample>,
}

impl ChannelBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            adc: ChannelBuffer::new(capacity),
            accel: ChannelBuffer::new(capacity),
            gyro: ChannelBuffer::new(capacity),
        }
    }

    pub fn push_frame(&self, frame: &SensorFrame) {
        self.adc.push(frame.adc);
        self.accel.push(frame.accel);
        self.gyro.push(frame.gyro);
    }

    /// Snapshot of one channel as plain rows, oldest first
    pub fn snapshot(&self, channel: Channel) -> Vec<Vec<i16>> {
        match channel {
            Channel::Adc => self.adc.snapshot().iter().map(|s| s.to_vec()).collect(),
            Channel::Accel => self.accel.snapshot().iter().map(|s| s.to_vec()).collect(),
            Channel::Gyro => self.gyro.snapshot().iter().map(|s| s.to_vec()).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.adc.capacity()
    }
}

impl Default for ChannelBuffers {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_clamped() {
        let buffer: ChannelBuffer<u8> = ChannelBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.snapshot(), vec![2]);
    }

    #[test]
    fn test_clone_shares_storage() {
        let writer: ChannelBuffer<u32> = ChannelBuffer::new(4);
        let reader = writer.clone();
        writer.push(7);
        assert_eq!(reader.latest(), Some(7));
    }
}
