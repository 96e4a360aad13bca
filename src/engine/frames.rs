use crossbeam_channel::Receiver;
use std::collections::VecDeque;

use super::decoder::DecodedFrame;

/// How far behind the audio clock a frame may run before it is dropped.
const DROP_THRESHOLD_MS: u64 = 20;
/// How far ahead of the audio clock a frame may be shown early.
const HOLD_THRESHOLD_MS: u64 = 20;
/// Tolerance for accepting a frame slightly before the seek target.
const SEEK_TOLERANCE_MS: u64 = 500;

/// Queue of decoded frames, paced against the audio clock.
pub struct FrameQueue {
    receiver: Receiver<DecodedFrame>,
    buffer: VecDeque<DecodedFrame>,
    current_frame: Option<DecodedFrame>,
    max_buffer_size: usize,
}

impl FrameQueue {
    pub fn new(receiver: Receiver<DecodedFrame>, max_buffer_size: usize) -> Self {
        Self {
            receiver,
            buffer: VecDeque::with_capacity(max_buffer_size),
            current_frame: None,
            max_buffer_size,
        }
    }

    fn receive_frames(&mut self) {
        while self.buffer.len() < self.max_buffer_size {
            match self.receiver.try_recv() {
                Ok(frame) => self.buffer.push_back(frame),
                Err(_) => break,
            }
        }
    }

    /// The frame that should be on screen at the given audio time, if a
    /// newer one than the current frame is due.
    pub fn display_frame(&mut self, audio_ms: u64) -> Option<&DecodedFrame> {
        self.receive_frames();

        // Drop frames that are too late.
        while let Some(frame) = self.buffer.front() {
            if frame.pts_ms + DROP_THRESHOLD_MS < audio_ms {
                self.buffer.pop_front();
            } else {
                break;
            }
        }

        if let Some(frame) = self.buffer.front() {
            if frame.pts_ms <= audio_ms + HOLD_THRESHOLD_MS {
                self.current_frame = self.buffer.pop_front();
            }
        }

        self.current_frame.as_ref()
    }

    /// First available frame after a seek; more lenient than the sync
    /// logic so the surface updates as soon as anything decodes.
    pub fn first_frame_after_seek(&mut self, target_ms: u64) -> Option<&DecodedFrame> {
        self.receive_frames();

        while let Some(frame) = self.buffer.front() {
            if frame.pts_ms + SEEK_TOLERANCE_MS < target_ms {
                self.buffer.pop_front();
            } else {
                break;
            }
        }

        if self.buffer.front().is_some() {
            self.current_frame = self.buffer.pop_front();
        }

        self.current_frame.as_ref()
    }

    /// Forget all buffered frames (used during seek).
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.current_frame = None;
        while self.receiver.try_recv().is_ok() {}
    }

    /// True when nothing is buffered anywhere (end of stream).
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.current_frame.is_none() && self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn frame(pts_ms: u64) -> DecodedFrame {
        DecodedFrame {
            rgba: Vec::new(),
            width: 0,
            height: 0,
            pts_ms,
        }
    }

    #[test]
    fn drops_late_frames_and_shows_the_due_one() {
        let (tx, rx) = bounded(8);
        let mut queue = FrameQueue::new(rx, 8);
        for pts in [0, 40, 80, 120] {
            tx.send(frame(pts)).unwrap();
        }

        // At t=95 the 0 ms and 40 ms frames are stale; 80 ms is due.
        let shown = queue.display_frame(95).map(|f| f.pts_ms);
        assert_eq!(shown, Some(80));

        // 120 ms is still in the future beyond the hold threshold.
        let shown = queue.display_frame(95).map(|f| f.pts_ms);
        assert_eq!(shown, Some(80));

        let shown = queue.display_frame(130).map(|f| f.pts_ms);
        assert_eq!(shown, Some(120));
    }

    #[test]
    fn seek_takes_first_frame_near_target() {
        let (tx, rx) = bounded(8);
        let mut queue = FrameQueue::new(rx, 8);
        for pts in [0, 1_000, 4_900, 5_040] {
            tx.send(frame(pts)).unwrap();
        }

        let shown = queue.first_frame_after_seek(5_000).map(|f| f.pts_ms);
        assert_eq!(shown, Some(4_900));
    }

    #[test]
    fn clear_empties_buffer_and_channel() {
        let (tx, rx) = bounded(8);
        let mut queue = FrameQueue::new(rx, 8);
        tx.send(frame(0)).unwrap();
        tx.send(frame(40)).unwrap();
        queue.display_frame(0);
        queue.clear();
        assert!(queue.is_empty());
    }
}
