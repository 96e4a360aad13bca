use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Audio clock for A/V synchronization.
/// The audio playback position is the master clock; video frames are
/// displayed or dropped against it.
#[derive(Clone)]
pub struct AudioClock {
    /// Current playback position in microseconds
    position_us: Arc<AtomicU64>,
    /// Whether playback is paused
    paused: Arc<AtomicBool>,
    /// Flag to clear buffered audio (set on seek)
    clear_buffer: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position_us: Arc::new(AtomicU64::new(0)),
            paused: Arc::new(AtomicBool::new(true)),
            clear_buffer: Arc::new(AtomicBool::new(false)),
            sample_rate,
            channels,
        }
    }

    /// Current playback position in milliseconds.
    pub fn position_ms(&self) -> u64 {
        self.position_us.load(Ordering::Relaxed) / 1_000
    }

    /// Set playback position in milliseconds (used during seek).
    /// Also flags stale buffered samples for discarding.
    pub fn set_position_ms(&self, position_ms: u64) {
        self.position_us
            .store(position_ms * 1_000, Ordering::Relaxed);
        self.clear_buffer.store(true, Ordering::Relaxed);
    }

    /// Check and clear the buffer-clear flag.
    pub fn should_clear_buffer(&self) -> bool {
        self.clear_buffer.swap(false, Ordering::Relaxed)
    }

    /// Advance the clock by a number of consumed samples (all channels).
    pub fn advance_samples(&self, samples: u64) {
        if !self.paused.load(Ordering::Relaxed) {
            let us_per_sample = 1_000_000.0 / (self.sample_rate as f64 * self.channels as f64);
            let delta_us = (samples as f64 * us_per_sample) as u64;
            self.position_us.fetch_add(delta_us, Ordering::Relaxed);
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
