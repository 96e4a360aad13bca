use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Thread-safe ring of PCM samples that overwrites the oldest data when
/// full, so the decoder side never blocks on a slow consumer.
pub struct SampleRing {
    inner: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Push a block of samples, dropping the oldest as needed.
    pub fn push_slice(&self, samples: &[f32]) {
        let mut buf = self.inner.lock();
        for &sample in samples {
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(sample);
        }
    }

    /// Try to pop the oldest sample.
    pub fn try_pop(&self) -> Option<f32> {
        self.inner.lock().pop_front()
    }

    /// Discard all buffered samples (used during seek).
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_oldest_when_full() {
        let ring = SampleRing::new(3);
        ring.push_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.try_pop(), Some(2.0));
        assert_eq!(ring.try_pop(), Some(3.0));
        assert_eq!(ring.try_pop(), Some(4.0));
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn clear_discards_everything() {
        let ring = SampleRing::new(8);
        ring.push_slice(&[0.5; 8]);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.try_pop(), None);
    }
}
