use crate::domain::models::{BleCommand, ConnectionStatus, MessageSeverity, StatusMessage};
use crate::presentation::app::BleScopeApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut BleScopeApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Device Detail");
    ui.add_space(20.0);

    ui_status_banner(app, ui);
    ui.add_space(15.0);

    match app.connection_status {
        ConnectionStatus::Connecting => {
            Components::card(ui, "Connecting", |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(format!("Connecting to {}...", app.connect_address));
                });
            });
            return;
        }
        ConnectionStatus::Disconnected | ConnectionStatus::Error if app.device_detail.is_none() => {
            Components::card(ui, "Not Connected", |ui| {
                ui.label("Pick a device from the Devices tab to connect.");
            });
            return;
        }
        _ => {}
    }

    ui_detail_panel(app, ui);
    ui.add_space(15.0);
    ui_services_panel(app, ui);
    ui.add_space(15.0);

    if app.connection_status == ConnectionStatus::Connected {
        if ui.button("Disconnect").clicked() {
            app.send(BleCommand::Disconnect);
            app.send(BleCommand::Close);
            app.connection_status = ConnectionStatus::Disconnected;
            app.status_message = Some(StatusMessage::new(
                "Disconnected from device",
                MessageSeverity::Info,
            ));
        }
    }
}

fn ui_status_banner(app: &BleScopeApp, ui: &mut egui::Ui) {
    let (status_text, bg_color, text_color) = match app.connection_status {
        ConnectionStatus::Connected => (
            "CONNECTED",
            egui::Color32::from_rgb(0, 200, 0),
            egui::Color32::BLACK,
        ),
        ConnectionStatus::Connecting => (
            "CONNECTING...",
            egui::Color32::from_rgb(255, 200, 0),
            egui::Color32::BLACK,
        ),
        ConnectionStatus::Disconnected => (
            "DISCONNECTED",
            egui::Color32::from_gray(100),
            egui::Color32::WHITE,
        ),
        ConnectionStatus::Error => (
            "ERROR",
            egui::Color32::from_rgb(255, 50, 50),
            egui::Color32::WHITE,
        ),
    };
    Components::status_banner(ui, status_text, bg_color, text_color);
}

fn ui_detail_panel(app: &BleScopeApp, ui: &mut egui::Ui) {
    let Some(detail) = &app.device_detail else {
        return;
    };

    Components::card(ui, "Device", |ui| {
        egui::Grid::new("detail_grid")
            .spacing([40.0, 8.0])
            .show(ui, |ui| {
                ui.label("Name:");
                ui.label(&detail.name);
                ui.end_row();

                ui.label("Address:");
                ui.label(egui::RichText::new(&detail.address).monospace());
                ui.end_row();

                ui.label("Address type:");
                ui.label(&detail.address_type);
                ui.end_row();

                ui.label("Device class:");
                ui.label(&detail.device_class);
                ui.end_row();

                ui.label("Advertised services:");
                ui.label(&detail.services);
                ui.end_row();

                ui.label("Payload ceiling:");
                ui.label(
                    app.negotiated_mtu
                        .map(|mtu| format!("{} bytes", mtu))
                        .unwrap_or_default(),
                );
                ui.end_row();
            });
    });
}

fn ui_services_panel(app: &mut BleScopeApp, ui: &mut egui::Ui) {
    if app.services.is_empty() {
        return;
    }

    let services = app.services.clone();

    Components::card(ui, "GATT Services", |ui| {
        for service in &services {
            let label = if service.primary {
                format!("{} (primary)", service.uuid)
            } else {
                service.uuid.to_string()
            };

            ui.collapsing(label, |ui| {
                for characteristic in &service.characteristics {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(characteristic.uuid.to_string()).monospace());
                        ui.label(egui::RichText::new(&characteristic.properties).weak());
                        if characteristic.can_notify {
                            ui.label("🔔");
                        }

                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if characteristic.can_write && ui.button("Write").clicked() {
                                    app.write_target =
                                        Some((service.uuid, characteristic.uuid));
                                    app.write_input.clear();
                                }
                                if characteristic.can_read && ui.button("Read").clicked() {
                                    app.send(BleCommand::Read {
                                        service: service.uuid,
                                        characteristic: characteristic.uuid,
                                    });
                                }
                            },
                        );
                    });

                    if let Some(value) = app.characteristic_values.get(&characteristic.uuid) {
                        ui.indent(characteristic.uuid, |ui| {
                            ui.label(
                                egui::RichText::new(format_value(value)).monospace().size(12.0),
                            );
                        });
                    }

                    if app.write_target == Some((service.uuid, characteristic.uuid)) {
                        ui.indent("write_panel", |ui| {
                            ui_write_panel(app, ui);
                        });
                    }

                    ui.separator();
                }
            });
        }
    });
}

fn ui_write_panel(app: &mut BleScopeApp, ui: &mut egui::Ui) {
    let Some((service, characteristic)) = app.write_target else {
        return;
    };

    ui.horizontal(|ui| {
        ui.label("Value:");
        ui.text_edit_singleline(&mut app.write_input);
        ui.checkbox(&mut app.write_as_hex, "hex");

        if ui.button("Send").clicked() {
            if app.write_as_hex {
                match parse_hex_input(&app.write_input) {
                    Some(data) => {
                        app.send(BleCommand::Write {
                            service,
                            characteristic,
                            data,
                        });
                        app.write_target = None;
                    }
                    None => {
                        app.status_message = Some(StatusMessage::new(
                            "Invalid hex input",
                            MessageSeverity::Error,
                        ));
                    }
                }
            } else {
                app.send(BleCommand::WriteText {
                    service,
                    characteristic,
                    text: app.write_input.clone(),
                });
                app.write_target = None;
            }
        }

        if ui.button("Cancel").clicked() {
            app.write_target = None;
        }
    });
}

/// Render a characteristic value as hex, with a printable-text suffix when
/// the bytes happen to be UTF-8.
fn format_value(value: &[u8]) -> String {
    let hex: Vec<String> = value.iter().map(|b| format!("{:02X}", b)).collect();
    let hex = hex.join(" ");

    match std::str::from_utf8(value) {
        Ok(text) if text.chars().all(|c| !c.is_control()) && !text.is_empty() => {
            format!("{}  \"{}\"", hex, text)
        }
        _ => hex,
    }
}

/// Parse "0A 1B 2C" / "0a1b2c" style input into bytes.
fn parse_hex_input(input: &str) -> Option<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return None;
    }

    (0..cleaned.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&cleaned[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_accepts_spaced_and_packed_forms() {
        assert_eq!(parse_hex_input("0A 1B 2C"), Some(vec![0x0A, 0x1B, 0x2C]));
        assert_eq!(parse_hex_input("0a1b2c"), Some(vec![0x0A, 0x1B, 0x2C]));
    }

    #[test]
    fn hex_input_rejects_odd_or_garbage_input() {
        assert_eq!(parse_hex_input("0A1"), None);
        assert_eq!(parse_hex_input("zz"), None);
        assert_eq!(parse_hex_input(""), None);
    }

    #[test]
    fn values_render_as_hex_with_text_suffix() {
        assert_eq!(format_value(b"Hi"), "48 69  \"Hi\"");
        assert_eq!(format_value(&[0x00, 0xFF]), "00 FF");
    }
}
