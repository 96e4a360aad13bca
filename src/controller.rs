use std::time::Instant;

use crate::engine::{EngineEvent, PlaybackState, Transport};
use crate::ui::controls::{PanelView, UserCommand};
use crate::ui::overlay::OverlayVisibility;

/// Orchestration between the control panel and the playback engine.
///
/// Traffic is strictly one-directional per path: engine notifications go
/// through [`Controller::handle_notification`], which has no transport
/// access and can only update display state; user commands go through
/// [`Controller::handle_command`], which is the only place engine calls
/// are made. A notification can therefore never echo back into a command.
pub struct Controller {
    position_ms: u64,
    duration_ms: u64,
    volume: u8,
    media_loaded: bool,
    engine_error: Option<String>,
    pub overlay: OverlayVisibility,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            position_ms: 0,
            duration_ms: 0,
            volume: 100,
            media_loaded: false,
            engine_error: None,
            overlay: OverlayVisibility::new(),
        }
    }

    /// Mark the media file as bound; enables the transport buttons.
    pub fn media_loaded(&mut self) {
        self.media_loaded = true;
    }

    pub fn is_media_loaded(&self) -> bool {
        self.media_loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.engine_error.as_deref()
    }

    fn play_enabled(&self) -> bool {
        self.media_loaded && self.engine_error.is_none()
    }

    /// Display state for the control panel.
    pub fn panel_view(&self, state: PlaybackState) -> PanelView {
        PanelView {
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            volume: self.volume,
            playing: state == PlaybackState::Playing,
            transport_enabled: self.media_loaded,
            play_enabled: self.play_enabled(),
        }
    }

    /// Engine notification: display updates only.
    pub fn handle_notification(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::DurationChanged(duration_ms) => {
                self.duration_ms = duration_ms;
            }
            EngineEvent::PositionChanged(position_ms) => {
                self.position_ms = position_ms;
            }
            EngineEvent::Error(message) => {
                log::error!("Playback error: {message}");
                self.engine_error = Some(message);
            }
        }
    }

    /// User command: the only path that issues engine calls.
    pub fn handle_command(
        &mut self,
        command: UserCommand,
        transport: &mut dyn Transport,
        now: Instant,
    ) {
        match command {
            UserCommand::TogglePlayback => {
                if !self.play_enabled() {
                    return;
                }
                if transport.state() == PlaybackState::Playing {
                    transport.pause();
                    self.overlay.playback_paused();
                } else {
                    transport.play();
                    self.overlay.playback_resumed(now);
                }
            }
            UserCommand::SeekRelative(offset_ms) => {
                if !self.media_loaded {
                    return;
                }
                let target = self
                    .position_ms
                    .saturating_add_signed(offset_ms)
                    .min(self.duration_ms);
                transport.set_position(target);
                self.position_ms = target;
            }
            UserCommand::SeekAbsolute(position_ms) => {
                if !self.media_loaded {
                    return;
                }
                let target = position_ms.min(self.duration_ms);
                transport.set_position(target);
                self.position_ms = target;
            }
            UserCommand::SetVolume(volume) => {
                // Engine volume and the label's source of truth change in
                // one step; they cannot diverge.
                let volume = volume.min(100);
                transport.set_volume(volume);
                self.volume = volume;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Play,
        Pause,
        SetPosition(u64),
        SetVolume(u8),
    }

    struct MockTransport {
        state: PlaybackState,
        calls: Vec<Call>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                state: PlaybackState::Stopped,
                calls: Vec::new(),
            }
        }
    }

    impl Transport for MockTransport {
        fn play(&mut self) {
            self.state = PlaybackState::Playing;
            self.calls.push(Call::Play);
        }

        fn pause(&mut self) {
            self.state = PlaybackState::Paused;
            self.calls.push(Call::Pause);
        }

        fn set_position(&mut self, position_ms: u64) {
            self.calls.push(Call::SetPosition(position_ms));
        }

        fn set_volume(&mut self, volume: u8) {
            self.calls.push(Call::SetVolume(volume));
        }

        fn state(&self) -> PlaybackState {
            self.state
        }
    }

    fn loaded_controller(duration_ms: u64, position_ms: u64) -> Controller {
        let mut controller = Controller::new();
        controller.media_loaded();
        controller.handle_notification(EngineEvent::DurationChanged(duration_ms));
        controller.handle_notification(EngineEvent::PositionChanged(position_ms));
        controller
    }

    #[test]
    fn toggle_alternates_play_and_pause() {
        let mut controller = loaded_controller(100_000, 0);
        let mut transport = MockTransport::new();
        transport.state = PlaybackState::Playing;
        let now = Instant::now();

        controller.handle_command(UserCommand::TogglePlayback, &mut transport, now);
        assert_eq!(transport.state, PlaybackState::Paused);
        assert!(!controller.panel_view(transport.state()).playing);

        controller.handle_command(UserCommand::TogglePlayback, &mut transport, now);
        assert_eq!(transport.state, PlaybackState::Playing);
        assert!(controller.panel_view(transport.state()).playing);

        assert_eq!(transport.calls, vec![Call::Pause, Call::Play]);
    }

    #[test]
    fn pausing_forces_the_overlay_visible() {
        let mut controller = loaded_controller(100_000, 0);
        let mut transport = MockTransport::new();
        transport.state = PlaybackState::Playing;
        let now = Instant::now();
        controller.overlay.pointer_activity(now, true);

        controller.handle_command(UserCommand::TogglePlayback, &mut transport, now);
        assert!(controller.overlay.is_visible());
        assert_eq!(controller.overlay.next_deadline(), None);
    }

    #[test]
    fn relative_seek_clamps_to_duration() {
        let mut controller = loaded_controller(100_000, 95_000);
        let mut transport = MockTransport::new();

        controller.handle_command(
            UserCommand::SeekRelative(10_000),
            &mut transport,
            Instant::now(),
        );
        assert_eq!(transport.calls, vec![Call::SetPosition(100_000)]);
    }

    #[test]
    fn relative_seek_clamps_to_zero() {
        let mut controller = loaded_controller(100_000, 5_000);
        let mut transport = MockTransport::new();

        controller.handle_command(
            UserCommand::SeekRelative(-10_000),
            &mut transport,
            Instant::now(),
        );
        assert_eq!(transport.calls, vec![Call::SetPosition(0)]);
    }

    #[test]
    fn consecutive_relative_seeks_use_the_cached_position() {
        let mut controller = loaded_controller(100_000, 50_000);
        let mut transport = MockTransport::new();
        let now = Instant::now();

        controller.handle_command(UserCommand::SeekRelative(10_000), &mut transport, now);
        controller.handle_command(UserCommand::SeekRelative(10_000), &mut transport, now);
        assert_eq!(
            transport.calls,
            vec![Call::SetPosition(60_000), Call::SetPosition(70_000)]
        );
    }

    #[test]
    fn volume_command_keeps_engine_and_label_in_lockstep() {
        let mut controller = loaded_controller(100_000, 0);
        let mut transport = MockTransport::new();

        for volume in [0u8, 37, 100] {
            controller.handle_command(
                UserCommand::SetVolume(volume),
                &mut transport,
                Instant::now(),
            );
            let view = controller.panel_view(transport.state());
            assert_eq!(view.volume, volume);
            assert_eq!(view.volume_text(), format!("{volume}%"));
        }
        assert_eq!(
            transport.calls,
            vec![Call::SetVolume(0), Call::SetVolume(37), Call::SetVolume(100)]
        );
    }

    #[test]
    fn unloaded_media_issues_no_engine_commands() {
        let mut controller = Controller::new();
        let mut transport = MockTransport::new();
        let now = Instant::now();

        let view = controller.panel_view(transport.state());
        assert!(!view.transport_enabled);
        assert!(!view.play_enabled);

        controller.handle_command(UserCommand::TogglePlayback, &mut transport, now);
        controller.handle_command(UserCommand::SeekRelative(10_000), &mut transport, now);
        controller.handle_command(UserCommand::SeekAbsolute(5_000), &mut transport, now);
        assert!(transport.calls.is_empty(), "no commands may reach the engine");
    }

    #[test]
    fn engine_error_disables_play_terminally() {
        let mut controller = loaded_controller(100_000, 0);
        let mut transport = MockTransport::new();
        transport.state = PlaybackState::Playing;

        controller.handle_notification(EngineEvent::Error("demuxer failed".into()));
        let view = controller.panel_view(transport.state());
        assert!(!view.play_enabled);
        assert!(view.transport_enabled, "skip buttons stay as they were");

        controller.handle_command(
            UserCommand::TogglePlayback,
            &mut transport,
            Instant::now(),
        );
        assert!(transport.calls.is_empty());
        assert_eq!(controller.error(), Some("demuxer failed"));
    }

    #[test]
    fn notifications_update_display_caches() {
        let mut controller = Controller::new();
        controller.media_loaded();
        controller.handle_notification(EngineEvent::DurationChanged(125_000));
        let view = controller.panel_view(PlaybackState::Stopped);
        assert_eq!(view.remaining_text(), "-00:02:05");

        controller.handle_notification(EngineEvent::PositionChanged(65_000));
        let view = controller.panel_view(PlaybackState::Playing);
        assert_eq!(view.elapsed_text(), "00:01:05");
        assert_eq!(view.remaining_text(), "-00:01:00");
    }
}
