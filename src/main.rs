use eframe::NativeOptions;
use env_logger::Env;
use miniplay::PlayerApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    ffmpeg_next::init().expect("Failed to initialize FFmpeg");

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Video Player")
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Video Player",
        options,
        Box::new(|cc| Ok(Box::new(PlayerApp::new(cc)))),
    )
}
