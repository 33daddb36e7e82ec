use crate::app::BikeAccidentMapApp;
use crate::app::settings::Settings;

/// Native entry point
pub async fn native_main() {
    // Setup logging
    tracing_subscriber::fmt::init();

    let settings = Settings::from_cli();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Bike Accident Map"),
        ..Default::default()
    };

    let _ = eframe::run_native(
        "Bike Accident Map",
        native_options,
        Box::new(move |cc| Ok(Box::new(BikeAccidentMapApp::new(settings, cc)))),
    );
}
