use std::path::PathBuf;
use std::time::Instant;

use eframe::CreationContext;
use egui::{
    pos2, vec2, Align, CentralPanel, Color32, Frame, Id, Layout, Margin, Order, Rect, Vec2,
};

use crate::controller::Controller;
use crate::engine::{Engine, PlaybackState, Transport};
use crate::ui::controls::{ControlPanel, UserCommand};

const PANEL_HEIGHT: f32 = 50.0;
const PANEL_MARGIN_X: f32 = 10.0;
const MEDIA_FILE: &str = "demo.mp4";

/// Transport that swallows commands while no media is bound, so volume
/// changes before a load still update the label.
struct Detached;

impl Transport for Detached {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn set_position(&mut self, _position_ms: u64) {}
    fn set_volume(&mut self, _volume: u8) {}
    fn state(&self) -> PlaybackState {
        PlaybackState::Stopped
    }
}

/// The main window: video surface, overlay control panel, and the wiring
/// between them and the engine.
pub struct PlayerApp {
    engine: Option<Engine>,
    controller: Controller,
    had_pointer: bool,
}

fn demo_media_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(MEDIA_FILE))
}

impl PlayerApp {
    pub fn new(cc: &CreationContext<'_>) -> Self {
        let mut controller = Controller::new();

        // Bind and autoplay the demo file next to the executable. A missing
        // file is a diagnostic, not a crash; controls just stay disabled.
        let engine = match demo_media_path() {
            Some(path) if path.exists() => {
                match Engine::bind(&path, cc.egui_ctx.clone()) {
                    Ok(mut engine) => {
                        controller.media_loaded();
                        engine.play();
                        controller.overlay.playback_resumed(Instant::now());
                        Some(engine)
                    }
                    Err(e) => {
                        log::error!("Failed to open {}: {e:#}", path.display());
                        None
                    }
                }
            }
            Some(path) => {
                log::error!(
                    "Error: {MEDIA_FILE} not found in {}",
                    path.parent().map(|p| p.display().to_string()).unwrap_or_default()
                );
                None
            }
            None => {
                log::error!("Error: could not determine the executable directory");
                None
            }
        };

        Self {
            engine,
            controller,
            had_pointer: false,
        }
    }

    fn dispatch(&mut self, commands: Vec<UserCommand>, now: Instant) {
        if commands.is_empty() {
            return;
        }
        if let Some(engine) = &mut self.engine {
            for command in commands {
                self.controller.handle_command(command, engine, now);
            }
        } else {
            let mut detached = Detached;
            for command in commands {
                self.controller.handle_command(command, &mut detached, now);
            }
        }
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Engine notifications first: display updates only on this path.
        if let Some(engine) = &mut self.engine {
            for event in engine.poll_events() {
                self.controller.handle_notification(event);
            }
            engine.update(ctx);
        }

        let state = self
            .engine
            .as_ref()
            .map(|e| e.state())
            .unwrap_or(PlaybackState::Stopped);
        let playing = state == PlaybackState::Playing;

        // The panel spans the full window width, anchored to the bottom;
        // recomputing from the screen rect keeps resizes deterministic.
        let screen = ctx.screen_rect();
        let panel_rect = Rect::from_min_max(
            pos2(screen.left(), screen.bottom() - PANEL_HEIGHT),
            screen.max,
        );

        let (pointer_moved, hover_pos) = ctx.input(|i| {
            (i.pointer.delta() != Vec2::ZERO, i.pointer.hover_pos())
        });

        let over_panel = self.controller.overlay.is_visible()
            && hover_pos.is_some_and(|p| panel_rect.contains(p));
        if over_panel != self.controller.overlay.is_over_controls() {
            if over_panel {
                self.controller.overlay.enter_controls();
            } else {
                self.controller.overlay.leave_controls(now, playing);
            }
        }

        // Motion over the window, or the pointer entering it, counts as
        // activity.
        let entered = hover_pos.is_some() && !self.had_pointer;
        self.had_pointer = hover_pos.is_some();
        if entered || (pointer_moved && hover_pos.is_some()) {
            self.controller.overlay.pointer_activity(now, playing);
        }

        self.controller.overlay.tick(now, playing);
        if let Some(deadline) = self.controller.overlay.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }

        // Video surface fills the client area.
        CentralPanel::default()
            .frame(Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(message) = self.controller.error() {
                    ui.centered_and_justified(|ui| {
                        ui.colored_label(Color32::RED, format!("Error: {message}"));
                    });
                    return;
                }

                let Some(engine) = &self.engine else { return };
                let Some(texture) = engine.texture() else { return };

                let (width, height) = engine.video_size();
                let available = ui.available_size();
                let aspect = width.max(1) as f32 / height.max(1) as f32;
                let available_aspect = available.x / available.y.max(1.0);

                let display_size = if aspect > available_aspect {
                    vec2(available.x, available.x / aspect)
                } else {
                    vec2(available.y * aspect, available.y)
                };

                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), display_size));
                });
            });

        if self.controller.overlay.is_visible() {
            let view = self.controller.panel_view(state);
            let mut commands = Vec::new();

            egui::Area::new(Id::new("control_panel"))
                .order(Order::Foreground)
                .fixed_pos(panel_rect.min)
                .show(ctx, |ui| {
                    Frame::none()
                        .fill(Color32::from_black_alpha(180))
                        .inner_margin(Margin::symmetric(PANEL_MARGIN_X, 0.0))
                        .show(ui, |ui| {
                            ui.visuals_mut().override_text_color = Some(Color32::WHITE);
                            ui.allocate_ui_with_layout(
                                vec2(panel_rect.width() - 2.0 * PANEL_MARGIN_X, PANEL_HEIGHT),
                                Layout::left_to_right(Align::Center),
                                |ui| {
                                    commands = ControlPanel::show(ui, &view);
                                },
                            );
                        });
                });

            self.dispatch(commands, now);
        }

        if playing {
            ctx.request_repaint();
        }
    }
}
