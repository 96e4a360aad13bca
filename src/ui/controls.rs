use egui::{vec2, Align, Button, Layout, RichText, Ui};

use super::scrub::ScrubBar;

/// Skip distance for the transport buttons, in milliseconds.
pub const SKIP_MS: i64 = 10_000;

const BUTTON_SIZE: f32 = 32.0;
const VOLUME_BAR_WIDTH: f32 = 100.0;
/// Width reserved for everything except the position scrubber: time
/// labels, three transport buttons, volume section, and spacing.
const RESERVED_WIDTH: f32 = 440.0;

/// Command emitted by the control panel toward the orchestration layer.
/// The panel never talks to the engine itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UserCommand {
    TogglePlayback,
    SeekRelative(i64),
    SeekAbsolute(u64),
    SetVolume(u8),
}

/// Everything the panel needs to draw itself. Purely display data; the
/// panel holds no playback state of its own.
#[derive(Clone, Copy, Debug)]
pub struct PanelView {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub volume: u8,
    pub playing: bool,
    pub transport_enabled: bool,
    pub play_enabled: bool,
}

impl PanelView {
    /// Elapsed time as `HH:MM:SS`.
    pub fn elapsed_text(&self) -> String {
        format_clock(self.position_ms)
    }

    /// Remaining time as `-HH:MM:SS`.
    pub fn remaining_text(&self) -> String {
        format!("-{}", format_clock(self.duration_ms.saturating_sub(self.position_ms)))
    }

    /// Volume percentage label; always equal to the slider value.
    pub fn volume_text(&self) -> String {
        format!("{}%", self.volume)
    }
}

/// Format milliseconds as `HH:MM:SS`.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// The overlay control bar: time labels, position scrubber, transport
/// buttons, and volume. Draws from a `PanelView` and reports user intent
/// as `UserCommand`s.
pub struct ControlPanel;

impl ControlPanel {
    pub fn show(ui: &mut Ui, view: &PanelView) -> Vec<UserCommand> {
        let mut commands = Vec::new();

        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 10.0;

            ui.label(view.elapsed_text());

            let scrub_width = (ui.available_width() - RESERVED_WIDTH).max(50.0);
            ui.add_enabled_ui(view.transport_enabled, |ui| {
                if let Some(position) =
                    ScrubBar::new(view.duration_ms).width(scrub_width).show(ui, view.position_ms)
                {
                    commands.push(UserCommand::SeekAbsolute(position));
                }
            });

            ui.label(view.remaining_text());

            ui.add_space(10.0);

            if transport_button(ui, "⏪", view.transport_enabled) {
                commands.push(UserCommand::SeekRelative(-SKIP_MS));
            }

            let play_icon = if view.playing { "⏸" } else { "▶" };
            if transport_button(ui, play_icon, view.transport_enabled && view.play_enabled) {
                commands.push(UserCommand::TogglePlayback);
            }

            if transport_button(ui, "⏩", view.transport_enabled) {
                commands.push(UserCommand::SeekRelative(SKIP_MS));
            }

            ui.add_space(10.0);

            ui.label("Volume:");
            if let Some(volume) =
                ScrubBar::new(100).width(VOLUME_BAR_WIDTH).show(ui, u64::from(view.volume))
            {
                commands.push(UserCommand::SetVolume(volume.min(100) as u8));
            }
            ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                ui.set_min_width(45.0);
                ui.label(view.volume_text());
            });
        });

        commands
    }
}

fn transport_button(ui: &mut Ui, icon: &str, enabled: bool) -> bool {
    ui.add_enabled(
        enabled,
        Button::new(RichText::new(icon).size(18.0))
            .min_size(vec2(BUTTON_SIZE, BUTTON_SIZE))
            .frame(false),
    )
    .clicked()
}
