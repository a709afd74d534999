//! Application state holder and event pump.
//!
//! State lives as plain fields here; the Bluetooth worker publishes
//! [`AppEvent`]s over a channel that is drained once per frame. The connect
//! handshake is driven from this layer, one forwarded command per step:
//! connected -> discover services -> enable notifications + request the
//! payload ceiling -> connection complete.

use crate::domain::models::{
    AppEvent, BleCommand, ConnectionStatus, DeviceDetail, DiscoveredDevice, GattServiceInfo,
    MessageSeverity, StatusMessage, Tab, UnavailableReason,
};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::service as ble_service;
use eframe::egui;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct BleScopeApp {
    // Services
    pub(crate) settings: Arc<Mutex<SettingsService>>,

    // Bluetooth worker endpoints
    pub(crate) command_tx: mpsc::UnboundedSender<BleCommand>,
    pub(crate) event_rx: mpsc::UnboundedReceiver<AppEvent>,

    // Observable state
    pub(crate) connection_status: ConnectionStatus,
    pub(crate) status_message: Option<StatusMessage>,
    pub(crate) device_list: Vec<DiscoveredDevice>,
    pub(crate) device_detail: Option<DeviceDetail>,
    pub(crate) services: Vec<GattServiceInfo>,
    pub(crate) negotiated_mtu: Option<u16>,
    pub(crate) characteristic_values: HashMap<Uuid, Vec<u8>>,
    pub(crate) unavailable: Option<UnavailableReason>,

    // UI state
    pub(crate) selected_tab: Tab,
    pub(crate) is_scanning: bool,
    pub(crate) scan_ran_once: bool,
    pub(crate) connect_address: String,
    pub(crate) write_target: Option<(Uuid, Uuid)>,
    pub(crate) write_input: String,
    pub(crate) write_as_hex: bool,
    pub(crate) is_dark_mode: bool,

    // Logging guard
    pub(crate) _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl BleScopeApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        crate::presentation::theme::configure_style(&cc.egui_ctx, false);

        let settings_service = SettingsService::new().expect("Failed to load settings");
        let logging_guard =
            crate::infrastructure::logging::init_logger(&settings_service.get().log_settings)
                .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
                .ok();

        info!("Starting BLE Scope");

        let settings = Arc::new(Mutex::new(settings_service));
        let (command_tx, event_rx) = ble_service::spawn(settings.clone());

        let mut app = Self {
            settings,
            command_tx,
            event_rx,
            connection_status: ConnectionStatus::Disconnected,
            status_message: None,
            device_list: Vec::new(),
            device_detail: None,
            services: Vec::new(),
            negotiated_mtu: None,
            characteristic_values: HashMap::new(),
            unavailable: None,
            selected_tab: Tab::Scan,
            is_scanning: false,
            scan_ran_once: false,
            connect_address: String::new(),
            write_target: None,
            write_input: String::new(),
            write_as_hex: false,
            is_dark_mode: false,
            _logging_guard: logging_guard,
        };

        // The scan screen is the entry point; start discovering right away.
        app.start_scan();
        app
    }

    pub(crate) fn send(&self, cmd: BleCommand) {
        if self.command_tx.send(cmd).is_err() {
            warn!("Bluetooth worker is gone, command dropped");
        }
    }

    pub(crate) fn start_scan(&mut self) {
        // Permission denials can be retried once the user granted access; a
        // missing adapter cannot.
        if self.unavailable == Some(UnavailableReason::PermissionDenied) {
            self.unavailable = None;
        }

        let window_ms = self
            .settings
            .lock()
            .map(|s| s.get().scan_window_ms)
            .unwrap_or(5000);
        self.device_list.clear();
        self.is_scanning = true;
        self.scan_ran_once = true;
        self.send(BleCommand::Scan { window_ms });
    }

    pub(crate) fn begin_connect(&mut self, address: String) {
        info!(%address, "Connect requested");
        self.connection_status = ConnectionStatus::Connecting;
        self.connect_address = address.clone();
        self.device_detail = None;
        self.services.clear();
        self.characteristic_values.clear();
        self.negotiated_mtu = None;
        self.write_target = None;
        self.selected_tab = Tab::Detail;
        self.send(BleCommand::Connect { address });
    }

    /// Toolbar reload: drop the connection, forget results, rescan.
    pub(crate) fn reload(&mut self) {
        self.send(BleCommand::StopScan);
        self.send(BleCommand::Disconnect);
        self.send(BleCommand::Close);
        self.connection_status = ConnectionStatus::Disconnected;
        self.device_detail = None;
        self.services.clear();
        self.characteristic_values.clear();
        self.negotiated_mtu = None;
        self.selected_tab = Tab::Scan;
        self.start_scan();
    }

    fn preferred_mtu(&self) -> u16 {
        self.settings
            .lock()
            .map(|s| s.get().preferred_mtu)
            .unwrap_or(512)
    }

    fn on_connection_completed(&mut self) {
        self.connection_status = ConnectionStatus::Connected;
        self.status_message = Some(StatusMessage::new(
            "Connection established",
            MessageSeverity::Success,
        ));
        if !self.connect_address.is_empty() {
            if let Ok(mut settings) = self.settings.lock() {
                let _ = settings.add_known_address(&self.connect_address);
            }
        }
    }

    fn on_connection_failed(&mut self) {
        self.connection_status = ConnectionStatus::Error;
        self.status_message = Some(StatusMessage::new(
            "Bluetooth LE connection failed",
            MessageSeverity::Error,
        ));
        self.send(BleCommand::Close);
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ScanStarted => {
                self.is_scanning = true;
            }
            AppEvent::ScanCompleted(devices) => {
                self.is_scanning = false;
                if devices.is_empty() {
                    if self.device_list.is_empty() {
                        self.status_message = Some(StatusMessage::new(
                            "Could not find any devices",
                            MessageSeverity::Warning,
                        ));
                    }
                } else {
                    self.device_list = devices;
                    self.selected_tab = Tab::Devices;
                }
            }
            AppEvent::ConnectionStatus(ConnectionStatus::Connected) => {
                if self.connection_status == ConnectionStatus::Connecting {
                    // Link is up; next step of the handshake.
                    self.send(BleCommand::DiscoverServices);
                } else {
                    self.connection_status = ConnectionStatus::Connected;
                }
            }
            AppEvent::ConnectionStatus(ConnectionStatus::Disconnected) => {
                if self.connection_status == ConnectionStatus::Connecting {
                    self.on_connection_failed();
                } else {
                    self.connection_status = ConnectionStatus::Disconnected;
                    self.status_message = Some(StatusMessage::new(
                        "Disconnected from device",
                        MessageSeverity::Info,
                    ));
                }
            }
            AppEvent::ConnectionStatus(status) => {
                if self.connection_status == ConnectionStatus::Connecting {
                    self.on_connection_failed();
                } else {
                    self.connection_status = status;
                }
            }
            AppEvent::DeviceDetail(detail) => {
                self.device_detail = Some(detail);
            }
            AppEvent::ServicesDiscovered(services) => {
                self.services = services;
                if self.connection_status == ConnectionStatus::Connecting {
                    self.send(BleCommand::SubscribeAll);
                    self.send(BleCommand::RequestMtu(self.preferred_mtu()));
                }
            }
            AppEvent::MtuChanged(mtu) => {
                self.negotiated_mtu = Some(mtu);
                if self.connection_status == ConnectionStatus::Connecting {
                    if mtu == self.preferred_mtu() {
                        self.on_connection_completed();
                    } else {
                        self.on_connection_failed();
                    }
                }
            }
            AppEvent::CharacteristicRead { uuid, value }
            | AppEvent::CharacteristicChanged { uuid, value } => {
                self.characteristic_values.insert(uuid, value);
            }
            AppEvent::CharacteristicWrite { uuid, ok } => {
                let (message, severity) = if ok {
                    (format!("Wrote characteristic {}", uuid), MessageSeverity::Info)
                } else {
                    (
                        format!("Write to characteristic {} failed", uuid),
                        MessageSeverity::Error,
                    )
                };
                self.status_message = Some(StatusMessage::new(message, severity));
            }
            AppEvent::BluetoothUnavailable(reason) => {
                self.unavailable = Some(reason);
                self.is_scanning = false;
            }
            AppEvent::LogMessage(message) => {
                self.status_message = Some(message);
            }
        }
    }
}

impl eframe::App for BleScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }

        ctx.request_repaint();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.selected_tab, Tab::Scan, "Scan");
                ui.selectable_value(&mut self.selected_tab, Tab::Devices, "Devices");
                ui.selectable_value(&mut self.selected_tab, Tab::Detail, "Detail");
                ui.selectable_value(&mut self.selected_tab, Tab::Settings, "Settings");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_style(ctx, self.is_dark_mode);
                    }
                    if ui.button("⟳ Reload").clicked() {
                        self.reload();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(820.0);
                    ui.add_space(20.0);

                    use crate::presentation::tabs;
                    match self.selected_tab {
                        Tab::Scan => tabs::scan::render(self, ui),
                        Tab::Devices => tabs::devices::render(self, ui),
                        Tab::Detail => tabs::detail::render(self, ui),
                        Tab::Settings => tabs::settings::render(self, ui),
                    }

                    ui.add_space(40.0);
                });
            });
        });
    }
}
