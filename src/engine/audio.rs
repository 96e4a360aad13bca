use rodio::Source;
use std::sync::Arc;
use std::time::Duration;

use super::clock::AudioClock;
use super::ring::SampleRing;

/// Audio source that pulls samples from the ring and advances the audio
/// clock as they are consumed. Implements `rodio::Source`.
pub struct PcmSource {
    ring: Arc<SampleRing>,
    clock: AudioClock,
    samples_consumed: u64,
}

impl PcmSource {
    pub fn new(ring: Arc<SampleRing>, clock: AudioClock) -> Self {
        Self {
            ring,
            clock,
            samples_consumed: 0,
        }
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        // Stale samples are discarded after a seek.
        if self.clock.should_clear_buffer() {
            self.ring.clear();
            self.samples_consumed = 0;
            return Some(0.0);
        }

        match self.ring.try_pop() {
            Some(sample) => {
                self.samples_consumed += 1;
                // Advance the clock in batches to keep the atomics cheap.
                if self.samples_consumed % 256 == 0 {
                    self.clock.advance_samples(256);
                }
                Some(sample)
            }
            // Underrun: play silence rather than ending the stream.
            None => Some(0.0),
        }
    }
}

impl Source for PcmSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Infinite stream
    }

    fn channels(&self) -> u16 {
        self.clock.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}
