use crate::presentation::app::BleScopeApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut BleScopeApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Discovered Devices");
    ui.add_space(20.0);

    if app.device_list.is_empty() {
        Components::card(ui, "No Devices", |ui| {
            ui.label("No scan results yet. Run a scan from the Scan tab.");
        });
        return;
    }

    let mut connect_to: Option<String> = None;

    Components::card(ui, "Nearby Devices", |ui| {
        egui::ScrollArea::vertical()
            .id_salt("device_list")
            .max_height(420.0)
            .show(ui, |ui| {
                for device in &app.device_list {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new(device.display_name()).strong());
                            ui.label(egui::RichText::new(&device.address).monospace().weak());
                        });
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if ui.button("Connect").clicked() {
                                    connect_to = Some(device.address.clone());
                                }
                                if let Some(rssi) = device.rssi {
                                    ui.label(format!("{} dBm", rssi));
                                }
                            },
                        );
                    });
                    ui.separator();
                }
            });
    });

    if let Some(address) = connect_to {
        app.begin_connect(address);
    }
}
