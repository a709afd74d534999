use crate::domain::models::UnavailableReason;
use crate::presentation::app::BleScopeApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut BleScopeApp, ui: &mut egui::Ui) {
    Components::heading(ui, "BLE Scope");
    ui.add_space(20.0);

    if let Some(reason) = app.unavailable {
        ui_unavailable_panel(reason, ui);
        return;
    }

    Components::card(ui, "Device Discovery", |ui| {
        if app.is_scanning {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Scanning for Bluetooth LE devices...");
            });
        } else {
            if app.scan_ran_once && app.device_list.is_empty() {
                ui.label("Could not find any devices.");
            } else if !app.device_list.is_empty() {
                ui.label(format!(
                    "Found {} device(s). See the Devices tab.",
                    app.device_list.len()
                ));
            }

            if ui.button("Scan Again").clicked() {
                app.start_scan();
            }
        }
    });

    ui.add_space(15.0);
    ui_status_panel(app, ui);
}

fn ui_unavailable_panel(reason: UnavailableReason, ui: &mut egui::Ui) {
    match reason {
        UnavailableReason::NoAdapter => {
            Components::card(ui, "Bluetooth Not Supported", |ui| {
                ui.label("This application cannot be used on this device.");
                ui.label("No Bluetooth LE adapter was found.");
            });
        }
        UnavailableReason::PermissionDenied => {
            Components::card(ui, "Bluetooth Access Required", |ui| {
                ui.label("Scanning for nearby devices requires Bluetooth access.");
                ui.label("Grant access in system settings, then reload.");
                ui.add_space(8.0);
                if ui.button("Open System Settings").clicked() {
                    open_bluetooth_settings();
                }
            });
        }
    }
}

fn ui_status_panel(app: &BleScopeApp, ui: &mut egui::Ui) {
    use crate::domain::models::MessageSeverity;

    if let Some(msg) = &app.status_message {
        Components::card(ui, "Status", |ui| {
            let color = match msg.severity {
                MessageSeverity::Info => egui::Color32::GRAY,
                MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
                MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
                MessageSeverity::Error => egui::Color32::RED,
            };
            ui.label(egui::RichText::new(&msg.message).color(color).strong());
        });
    }
}

fn open_bluetooth_settings() {
    let result = if cfg!(target_os = "windows") {
        std::process::Command::new("explorer")
            .arg("ms-settings:bluetooth")
            .spawn()
    } else if cfg!(target_os = "macos") {
        std::process::Command::new("open")
            .arg("x-apple.systempreferences:com.apple.preferences.Bluetooth")
            .spawn()
    } else {
        std::process::Command::new("xdg-open")
            .arg("settings://bluetooth")
            .spawn()
    };

    if let Err(e) = result {
        tracing::warn!("Could not open system settings: {}", e);
    }
}
