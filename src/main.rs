mod ui;
mod engine;
mod model;

use eframe::egui;

fn main() -> eframe::Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let settings = ui::settings_io::load_settings();
    log::info!(
        "Starting {} with model {} at {}",
        settings.session.scenario,
        settings.llm.model,
        settings.llm.endpoint
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 820.0])
            .with_min_inner_size([900.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Escape Room",
        options,
        Box::new(|_cc| {
            Ok(Box::new(ui::app::EscapeApp::new(settings)))
        }),
    )
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    // RUST_LOG refines the default
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
