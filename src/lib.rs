pub mod app;
pub mod controller;
pub mod engine;
pub mod ui;

pub use app::PlayerApp;
pub use controller::Controller;
pub use engine::{Engine, EngineEvent, PlaybackState, Transport};
pub use ui::controls::{ControlPanel, PanelView, UserCommand};
