#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod context;
mod i18n;
mod modules;
mod state;
mod theme;

fn main() -> eframe::Result {
    env_logger::init();
    ffmpeg_the_third::init().expect("FFmpeg init failed");

    let native_options = eframe::NativeOptions {
        centered: true,
        viewport: egui::ViewportBuilder::default()
            .with_title("ClipMill")
            .with_inner_size([880.0, 620.0])
            .with_min_inner_size([700.0, 480.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "ClipMill",
        native_options,
        Box::new(|cc| Ok(Box::new(app::ClipMillApp::new(cc)))),
    )
}
