mod audio;
mod clock;
mod decoder;
mod frames;
mod ring;

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use audio::PcmSource;
use clock::AudioClock;
use decoder::{probe_media, start_decoder_thread, DecoderCommand};
use frames::FrameQueue;
use ring::SampleRing;

/// Playback state, queried on demand by the UI.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    Error,
}

/// Notification emitted by the engine toward the UI. These drive display
/// updates only; they must never be answered with an engine command from
/// the same handler.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    DurationChanged(u64),
    PositionChanged(u64),
    Error(String),
}

/// The transport surface the UI is allowed to command. Positions are
/// milliseconds, volume is 0-100.
pub trait Transport {
    fn play(&mut self);
    fn pause(&mut self);
    fn set_position(&mut self, position_ms: u64);
    fn set_volume(&mut self, volume: u8);
    fn state(&self) -> PlaybackState;
}

/// Playback engine bound to a single media file.
pub struct Engine {
    state: PlaybackState,
    seeking: bool,
    seek_target_ms: u64,

    // Media info
    width: u32,
    height: u32,
    duration_ms: u64,

    // Notifications
    pending: VecDeque<EngineEvent>,
    event_receiver: Receiver<EngineEvent>,
    last_reported_ms: Option<u64>,

    // Threading
    decoder_handle: Option<JoinHandle<()>>,
    command_sender: Sender<DecoderCommand>,
    stop_flag: Arc<AtomicBool>,

    // Audio
    _output_stream: OutputStream, // Keep alive
    _stream_handle: OutputStreamHandle,
    sink: Sink,
    clock: AudioClock,

    // Video
    frame_queue: FrameQueue,
    texture: Option<TextureHandle>,
}

impl Engine {
    /// Bind a media file and prepare for playback. Starts in `Stopped`
    /// with the first frame queued for display.
    pub fn bind(path: &Path, ctx: Context) -> Result<Self> {
        let info = probe_media(path)?;

        let clock = AudioClock::new(info.sample_rate, info.channels);

        let (output_stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;

        // About one second of audio buffering.
        let ring_capacity = info.sample_rate as usize * info.channels as usize * 2;
        let sample_ring = SampleRing::new(ring_capacity);

        let pcm_source = PcmSource::new(sample_ring.clone(), clock.clone());
        sink.append(pcm_source);
        sink.pause(); // Start paused

        let (frame_sender, frame_receiver) = bounded(30);
        let frame_queue = FrameQueue::new(frame_receiver, 30);

        let (command_sender, command_receiver) = bounded(16);
        let (event_sender, event_receiver) = bounded(16);

        let stop_flag = Arc::new(AtomicBool::new(false));
        let decoder_handle = start_decoder_thread(
            path,
            frame_sender,
            sample_ring,
            command_receiver,
            event_sender,
            clock.clone(),
            stop_flag.clone(),
        )?;

        let texture = ctx.load_texture(
            "video_frame",
            ColorImage::new(
                [info.width as usize, info.height as usize],
                egui::Color32::BLACK,
            ),
            TextureOptions::LINEAR,
        );

        let mut pending = VecDeque::new();
        pending.push_back(EngineEvent::DurationChanged(info.duration_ms));

        let mut engine = Self {
            state: PlaybackState::Stopped,
            seeking: false,
            seek_target_ms: 0,
            width: info.width,
            height: info.height,
            duration_ms: info.duration_ms,
            pending,
            event_receiver,
            last_reported_ms: None,
            decoder_handle: Some(decoder_handle),
            command_sender,
            stop_flag,
            _output_stream: output_stream,
            _stream_handle: stream_handle,
            sink,
            clock,
            frame_queue,
            texture: Some(texture),
        };

        // Resume the decoder long enough to produce the first frame.
        let _ = engine.command_sender.send(DecoderCommand::Resume);
        engine.seek(0);

        Ok(engine)
    }

    fn seek(&mut self, position_ms: u64) {
        let position_ms = position_ms.min(self.duration_ms);
        self.seeking = true;
        self.seek_target_ms = position_ms;
        self.sink.pause(); // Stop clock advancement while the seek settles
        self.frame_queue.clear();
        self.clock.set_position_ms(position_ms);
        let _ = self.command_sender.send(DecoderCommand::Seek(position_ms));
    }

    /// Drain pending notifications. Position changes are synthesized from
    /// the audio clock at millisecond granularity; decoder errors arrive on
    /// the event channel and move the engine into the `Error` state.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        let mut events: Vec<EngineEvent> = self.pending.drain(..).collect();

        while let Ok(event) = self.event_receiver.try_recv() {
            if let EngineEvent::Error(_) = event {
                self.state = PlaybackState::Error;
                self.sink.pause();
            }
            events.push(event);
        }

        let position_ms = self.position_ms();
        if self.last_reported_ms != Some(position_ms) {
            self.last_reported_ms = Some(position_ms);
            events.push(EngineEvent::PositionChanged(position_ms));
        }

        events
    }

    /// Update texture and A/V sync; call once per UI frame.
    pub fn update(&mut self, ctx: &Context) {
        if self.state == PlaybackState::Error {
            return;
        }

        // While seeking, wait for the first frame at the target and show it.
        if self.seeking {
            if let Some(frame) = self
                .frame_queue
                .first_frame_after_seek(self.seek_target_ms)
            {
                if let Some(ref mut texture) = self.texture {
                    let image = ColorImage::from_rgba_unmultiplied(
                        [frame.width as usize, frame.height as usize],
                        &frame.rgba,
                    );
                    texture.set(image, TextureOptions::LINEAR);
                }
                // Snap the clock to the frame we actually got.
                self.clock.set_position_ms(frame.pts_ms);
                self.seeking = false;
                if self.state == PlaybackState::Playing {
                    self.sink.play();
                }
            }
            ctx.request_repaint();
            return;
        }

        if self.state != PlaybackState::Playing {
            return;
        }

        let audio_ms = self.clock.position_ms();

        if let Some(frame) = self.frame_queue.display_frame(audio_ms) {
            if let Some(ref mut texture) = self.texture {
                let image = ColorImage::from_rgba_unmultiplied(
                    [frame.width as usize, frame.height as usize],
                    &frame.rgba,
                );
                texture.set(image, TextureOptions::LINEAR);
            }
        }

        // End of stream.
        if self.frame_queue.is_empty() && audio_ms + 100 >= self.duration_ms {
            self.state = PlaybackState::Stopped;
            self.sink.pause();
        }

        ctx.request_repaint();
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    pub fn video_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Current playhead in milliseconds; reports the seek target while a
    /// seek is in flight.
    pub fn position_ms(&self) -> u64 {
        if self.seeking {
            self.seek_target_ms
        } else {
            self.clock.position_ms().min(self.duration_ms)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

impl Transport for Engine {
    fn play(&mut self) {
        if self.state == PlaybackState::Error {
            return;
        }
        if self.state != PlaybackState::Playing {
            self.state = PlaybackState::Playing;
            self.sink.play();
            let _ = self.command_sender.send(DecoderCommand::Resume);
        }
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.sink.pause();
            let _ = self.command_sender.send(DecoderCommand::Pause);
        }
    }

    fn set_position(&mut self, position_ms: u64) {
        if self.state == PlaybackState::Error {
            return;
        }
        self.seek(position_ms);
    }

    fn set_volume(&mut self, volume: u8) {
        self.sink.set_volume(f32::from(volume.min(100)) / 100.0);
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let _ = self.command_sender.send(DecoderCommand::Stop);

        if let Some(handle) = self.decoder_handle.take() {
            let _ = handle.join();
        }
    }
}
