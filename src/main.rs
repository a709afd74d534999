mod domain;
mod infrastructure;
mod presentation;

use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_title("BLE Scope"),
        ..Default::default()
    };

    eframe::run_native(
        "BLE Scope",
        options,
        Box::new(|cc| Ok(Box::new(presentation::app::BleScopeApp::new(cc)))),
    )
}
