use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as ResamplerContext;
use ffmpeg_next::software::scaling::{Context as ScalerContext, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::Sample;
use ffmpeg_next::{codec, Packet, Rational};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::clock::AudioClock;
use super::ring::SampleRing;
use super::EngineEvent;

/// A decoded video frame ready for display.
pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts_ms: u64,
}

/// Commands sent to the decoder thread. Positions are milliseconds.
pub enum DecoderCommand {
    Seek(u64),
    Pause,
    Resume,
    Stop,
}

/// Media info extracted when the file is bound.
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Open a media file and extract info without starting decoding.
pub fn probe_media(path: &Path) -> Result<MediaInfo> {
    let input = ffmpeg_next::format::input(path).context("Failed to open input file")?;

    let video_stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let video_decoder = codec::Context::from_parameters(video_stream.parameters())?
        .decoder()
        .video()?;

    let audio_stream = input.streams().best(Type::Audio);

    let (sample_rate, channels) = if let Some(audio) = audio_stream {
        let audio_decoder = codec::Context::from_parameters(audio.parameters())?
            .decoder()
            .audio()?;
        (audio_decoder.rate(), audio_decoder.channels() as u16)
    } else {
        (44100, 2) // Default if no audio
    };

    let duration_ms = if input.duration() > 0 {
        (input.duration() as u64 * 1000) / ffmpeg_next::ffi::AV_TIME_BASE as u64
    } else {
        0
    };

    Ok(MediaInfo {
        width: video_decoder.width(),
        height: video_decoder.height(),
        duration_ms,
        sample_rate,
        channels,
    })
}

fn pts_to_ms(pts: i64, time_base: Rational) -> u64 {
    let seconds = pts as f64 * f64::from(time_base);
    (seconds * 1000.0).max(0.0) as u64
}

/// Start the decoder thread. Failures inside the loop are reported to the
/// UI through the event channel rather than crashing the thread silently.
pub fn start_decoder_thread(
    path: &Path,
    frame_sender: Sender<DecodedFrame>,
    sample_ring: Arc<SampleRing>,
    command_receiver: Receiver<DecoderCommand>,
    event_sender: Sender<EngineEvent>,
    clock: AudioClock,
    stop_flag: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let path = path.to_path_buf();

    let handle = thread::spawn(move || {
        if let Err(e) = decode_loop(
            &path,
            frame_sender,
            &sample_ring,
            command_receiver,
            clock,
            stop_flag,
        ) {
            log::error!("Decoder error: {e}");
            let _ = event_sender.send(EngineEvent::Error(e.to_string()));
        }
    });

    Ok(handle)
}

fn decode_loop(
    path: &Path,
    frame_sender: Sender<DecodedFrame>,
    sample_ring: &Arc<SampleRing>,
    command_receiver: Receiver<DecoderCommand>,
    clock: AudioClock,
    stop_flag: Arc<AtomicBool>,
) -> Result<()> {
    let mut input = ffmpeg_next::format::input(path)?;

    let video_stream_index = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("No video stream"))?
        .index();

    let audio_stream_index = input.streams().best(Type::Audio).map(|s| s.index());

    let video_stream = input.stream(video_stream_index).ok_or_else(|| anyhow!("Video stream vanished"))?;
    let video_time_base = video_stream.time_base();
    let video_params = video_stream.parameters();

    let audio_params = audio_stream_index
        .and_then(|idx| input.stream(idx))
        .map(|s| s.parameters());

    let mut video_decoder = codec::Context::from_parameters(video_params)?
        .decoder()
        .video()?;

    let mut audio_decoder = if let Some(params) = audio_params {
        Some(codec::Context::from_parameters(params)?.decoder().audio()?)
    } else {
        None
    };

    // Scale every video frame to RGBA for the texture upload.
    let mut scaler = ScalerContext::get(
        video_decoder.format(),
        video_decoder.width(),
        video_decoder.height(),
        Pixel::RGBA,
        video_decoder.width(),
        video_decoder.height(),
        Flags::BILINEAR,
    )?;

    // Resample audio to f32 stereo at the clock's rate.
    let mut resampler = if let Some(ref decoder) = audio_decoder {
        Some(ResamplerContext::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(ffmpeg_next::util::format::sample::Type::Packed),
            ChannelLayout::STEREO,
            clock.sample_rate(),
        )?)
    } else {
        None
    };

    let mut video_frame = VideoFrame::empty();
    let mut audio_frame = AudioFrame::empty();
    let mut rgba_frame = VideoFrame::empty();

    let mut paused = true;
    let mut pending_seek: Option<u64> = None;
    let mut at_eof = false;

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }

        // Process all pending commands.
        loop {
            match command_receiver.try_recv() {
                Ok(DecoderCommand::Stop) => return Ok(()),
                Ok(DecoderCommand::Pause) => {
                    paused = true;
                    clock.pause();
                }
                Ok(DecoderCommand::Resume) => {
                    paused = false;
                    clock.resume();
                }
                Ok(DecoderCommand::Seek(target_ms)) => {
                    pending_seek = Some(target_ms);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        if let Some(target_ms) = pending_seek.take() {
            let target_ts =
                (target_ms as i64) * (ffmpeg_next::ffi::AV_TIME_BASE as i64) / 1000;
            if input.seek(target_ts, ..target_ts).is_ok() {
                video_decoder.flush();
                if let Some(ref mut dec) = audio_decoder {
                    dec.flush();
                }
                clock.set_position_ms(target_ms);
                at_eof = false; // Packets are readable again after a seek
            }
        }

        // Nothing to do while paused or at EOF; wait for the next command.
        if paused || at_eof {
            thread::sleep(std::time::Duration::from_millis(10));
            continue;
        }

        let mut packet = Packet::empty();
        match packet.read(&mut input) {
            Ok(()) => {
                let stream_index = packet.stream();

                if stream_index == video_stream_index {
                    video_decoder.send_packet(&packet)?;

                    'frame_loop: while video_decoder.receive_frame(&mut video_frame).is_ok() {
                        scaler.run(&video_frame, &mut rgba_frame)?;

                        let pts_ms =
                            pts_to_ms(video_frame.pts().unwrap_or(0), video_time_base);

                        let mut frame = DecodedFrame {
                            rgba: rgba_frame.data(0).to_vec(),
                            width: rgba_frame.width(),
                            height: rgba_frame.height(),
                            pts_ms,
                        };

                        // Non-blocking send with command polling; seek and
                        // stop take priority over frame delivery.
                        loop {
                            match command_receiver.try_recv() {
                                Ok(DecoderCommand::Stop) => return Ok(()),
                                Ok(DecoderCommand::Pause) => {
                                    paused = true;
                                    clock.pause();
                                }
                                Ok(DecoderCommand::Resume) => {
                                    paused = false;
                                    clock.resume();
                                }
                                Ok(DecoderCommand::Seek(target_ms)) => {
                                    pending_seek = Some(target_ms);
                                    break 'frame_loop;
                                }
                                Err(TryRecvError::Empty) => {}
                                Err(TryRecvError::Disconnected) => return Ok(()),
                            }

                            match frame_sender.try_send(frame) {
                                Ok(()) => break,
                                Err(TrySendError::Full(f)) => {
                                    frame = f;
                                    thread::sleep(std::time::Duration::from_millis(1));
                                }
                                Err(TrySendError::Disconnected(_)) => return Ok(()),
                            }
                        }
                    }
                }

                if let Some(audio_idx) = audio_stream_index {
                    if stream_index == audio_idx {
                        if let Some(ref mut decoder) = audio_decoder {
                            decoder.send_packet(&packet)?;

                            while decoder.receive_frame(&mut audio_frame).is_ok() {
                                if let Some(ref mut resampler) = resampler {
                                    let mut resampled = AudioFrame::empty();
                                    if resampler.run(&audio_frame, &mut resampled).is_ok() {
                                        let data = resampled.data(0);
                                        let samples: &[f32] = unsafe {
                                            std::slice::from_raw_parts(
                                                data.as_ptr() as *const f32,
                                                data.len() / 4,
                                            )
                                        };

                                        // Never blocks; overwrites oldest if full.
                                        sample_ring.push_slice(samples);
                                    }
                                }
                            }
                        }
                    }
                }
            }
            Err(ffmpeg_next::Error::Eof) => {
                // End of file; idle until a seek or stop command arrives.
                at_eof = true;
                continue;
            }
            Err(_) => {
                // Skip corrupted packets
                continue;
            }
        }
    }

    // Flush the video decoder so the tail frames still reach the queue.
    video_decoder.send_eof()?;
    while video_decoder.receive_frame(&mut video_frame).is_ok() {
        scaler.run(&video_frame, &mut rgba_frame)?;
        let pts_ms = pts_to_ms(video_frame.pts().unwrap_or(0), video_time_base);

        let frame = DecodedFrame {
            rgba: rgba_frame.data(0).to_vec(),
            width: rgba_frame.width(),
            height: rgba_frame.height(),
            pts_ms,
        };

        let _ = frame_sender.send(frame);
    }

    if let Some(ref mut decoder) = audio_decoder {
        decoder.send_eof()?;
        while decoder.receive_frame(&mut audio_frame).is_ok() {}
    }

    Ok(())
}
