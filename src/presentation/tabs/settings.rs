use crate::presentation::app::BleScopeApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut BleScopeApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Settings");
    ui.add_space(20.0);

    let mut save_requested = false;

    if let Ok(mut settings) = app.settings.lock() {
        let settings_mut = settings.get_mut();

        Components::card(ui, "Scanning", |ui| {
            ui.horizontal(|ui| {
                ui.label("Scan window (ms):");
                ui.add(egui::Slider::new(
                    &mut settings_mut.scan_window_ms,
                    1000..=30000,
                ));
            });
            ui.checkbox(
                &mut settings_mut.show_unnamed_devices,
                "Include devices without a name",
            );
        });

        ui.add_space(10.0);

        Components::card(ui, "Connection", |ui| {
            ui.horizontal(|ui| {
                ui.label("Settle delay (ms):");
                ui.add(egui::Slider::new(
                    &mut settings_mut.dispatch_delay_ms,
                    0..=100,
                ));
            });
            ui.horizontal(|ui| {
                ui.label("Preferred payload ceiling:");
                ui.add(egui::Slider::new(&mut settings_mut.preferred_mtu, 23..=512));
            });

            if let Some(address) = &settings_mut.last_connected_address {
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("Last connected device:");
                    ui.label(egui::RichText::new(address).monospace());
                });
            }
        });

        ui.add_space(10.0);

        Components::card(ui, "Logging", |ui| {
            ui.horizontal(|ui| {
                ui.label("Verbosity level:");
                egui::ComboBox::from_id_salt("log_level")
                    .selected_text(&settings_mut.log_settings.level)
                    .show_ui(ui, |ui| {
                        for level in &["trace", "debug", "info", "warn", "error"] {
                            ui.selectable_value(
                                &mut settings_mut.log_settings.level,
                                level.to_string(),
                                *level,
                            );
                        }
                    });
            });

            ui.checkbox(
                &mut settings_mut.log_settings.console_logging_enabled,
                "Console logs",
            );
            ui.checkbox(
                &mut settings_mut.log_settings.file_logging_enabled,
                "Persistent file logs",
            );

            if settings_mut.log_settings.file_logging_enabled {
                ui.indent("file_logs", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Save path:");
                        ui.text_edit_singleline(&mut settings_mut.log_settings.log_dir);
                    });
                    ui.horizontal(|ui| {
                        ui.label("Rotation:");
                        egui::ComboBox::from_id_salt("log_rot")
                            .selected_text(&settings_mut.log_settings.rotation)
                            .show_ui(ui, |ui| {
                                for rot in &["daily", "hourly", "never"] {
                                    ui.selectable_value(
                                        &mut settings_mut.log_settings.rotation,
                                        rot.to_string(),
                                        *rot,
                                    );
                                }
                            });
                    });
                });
                ui.label(
                    egui::RichText::new("Restart required for log changes.")
                        .italics()
                        .size(12.0),
                );
            }
        });

        ui.add_space(10.0);

        if ui.button("Save Settings").clicked() {
            save_requested = true;
        }

        if save_requested {
            if let Err(e) = settings.save() {
                tracing::warn!("Failed to save settings: {}", e);
            }
        }
    }
}
