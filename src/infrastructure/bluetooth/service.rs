//! Bluetooth worker.
//!
//! The UI never touches the adapter directly: it sends [`BleCommand`]s into
//! an unbounded channel and drains [`AppEvent`]s coming back. The worker is a
//! dedicated thread running a current-thread tokio runtime; each command is
//! forwarded to the binding after a short settle delay, and platform events
//! (disconnects, notifications) are bridged onto the same event channel.

use crate::domain::models::{
    AppEvent, BleCommand, ConnectionStatus, MessageSeverity, StatusMessage, UnavailableReason,
};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::controller::LowEnergyController;
use crate::infrastructure::bluetooth::error::BleError;
use crate::infrastructure::bluetooth::scanner::BleScanner;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _};
use btleplug::platform::{Adapter, Manager};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Log a failure and surface its fixed user-facing message.
pub fn report_error(sender: &mpsc::UnboundedSender<AppEvent>, err: &BleError) {
    error!("{}", err);
    match err {
        BleError::AdapterUnavailable => {
            let _ = sender.send(AppEvent::BluetoothUnavailable(UnavailableReason::NoAdapter));
        }
        BleError::PermissionDenied => {
            let _ = sender.send(AppEvent::BluetoothUnavailable(
                UnavailableReason::PermissionDenied,
            ));
        }
        _ => {}
    }
    let _ = sender.send(AppEvent::LogMessage(StatusMessage::new(
        err.user_message(),
        MessageSeverity::Error,
    )));
}

/// Start the Bluetooth worker thread and return its command/event endpoints.
pub fn spawn(
    settings: Arc<Mutex<SettingsService>>,
) -> (
    mpsc::UnboundedSender<BleCommand>,
    mpsc::UnboundedReceiver<AppEvent>,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime for Bluetooth");

        rt.block_on(async move {
            let adapter = match default_adapter().await {
                Ok(adapter) => adapter,
                Err(e) => {
                    report_error(&event_tx, &e);
                    return;
                }
            };

            BleService::new(adapter, event_tx, settings).run(cmd_rx).await;
        });
    });

    (cmd_tx, event_rx)
}

async fn default_adapter() -> Result<Adapter, BleError> {
    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(BleError::AdapterUnavailable)?;

    match adapter.adapter_info().await {
        Ok(info) => info!("Using Bluetooth adapter: {}", info),
        Err(_) => info!("Using Bluetooth adapter (info unavailable)"),
    }
    Ok(adapter)
}

/// Coordinates the scanner and the GATT client on the worker task.
pub struct BleService {
    controller: LowEnergyController,
    scanner: BleScanner,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    settings: Arc<Mutex<SettingsService>>,
    tracked_address: Arc<Mutex<Option<String>>>,
}

impl BleService {
    pub fn new(
        adapter: Adapter,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        settings: Arc<Mutex<SettingsService>>,
    ) -> Self {
        let tracked_address = Arc::new(Mutex::new(None));
        spawn_disconnect_watcher(adapter.clone(), event_sender.clone(), tracked_address.clone());

        Self {
            controller: LowEnergyController::new(adapter.clone(), event_sender.clone()),
            scanner: BleScanner::new(adapter, event_sender.clone()),
            event_sender,
            settings,
            tracked_address,
        }
    }

    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<BleCommand>) {
        while let Some(cmd) = commands.recv().await {
            // Give the adapter a moment to settle before every forwarded call.
            tokio::time::sleep(self.dispatch_delay()).await;
            self.handle(cmd).await;
        }
    }

    fn dispatch_delay(&self) -> Duration {
        let ms = self
            .settings
            .lock()
            .map(|s| s.get().dispatch_delay_ms)
            .unwrap_or(10);
        Duration::from_millis(ms)
    }

    async fn handle(&mut self, cmd: BleCommand) {
        match cmd {
            BleCommand::Scan { window_ms } => {
                let include_unnamed = self
                    .settings
                    .lock()
                    .map(|s| s.get().show_unnamed_devices)
                    .unwrap_or(false);
                if let Err(e) = self
                    .scanner
                    .start(Duration::from_millis(window_ms), include_unnamed)
                {
                    report_error(&self.event_sender, &e);
                }
            }
            BleCommand::StopScan => self.scanner.stop(),
            BleCommand::Connect { address } => match self.controller.connect(&address).await {
                Ok(()) => self.track(self.controller.connected_address()),
                Err(e) => {
                    report_error(&self.event_sender, &e);
                    let _ = self
                        .event_sender
                        .send(AppEvent::ConnectionStatus(ConnectionStatus::Error));
                }
            },
            BleCommand::Disconnect => {
                if !self.controller.is_connected().await {
                    warn!("Disconnect requested with no active connection");
                } else if let Err(e) = self.controller.disconnect().await {
                    warn!("Disconnect failed: {}", e);
                }
            }
            BleCommand::Close => {
                self.controller.close().await;
                self.track(None);
            }
            BleCommand::DiscoverServices => {
                if let Err(e) = self.controller.discover_services().await {
                    report_error(&self.event_sender, &e);
                    let _ = self
                        .event_sender
                        .send(AppEvent::ConnectionStatus(ConnectionStatus::Error));
                }
            }
            BleCommand::SubscribeAll => {
                if let Err(e) = self.controller.subscribe_all().await {
                    report_error(&self.event_sender, &e);
                }
            }
            BleCommand::RequestMtu(mtu) => self.controller.request_mtu(mtu),
            BleCommand::Read {
                service,
                characteristic,
            } => {
                if let Err(e) = self
                    .controller
                    .read_characteristic(service, characteristic)
                    .await
                {
                    report_error(&self.event_sender, &e);
                }
            }
            BleCommand::Write {
                service,
                characteristic,
                data,
            } => {
                if let Err(e) = self
                    .controller
                    .write_characteristic(service, characteristic, &data)
                    .await
                {
                    report_error(&self.event_sender, &e);
                }
            }
            BleCommand::WriteText {
                service,
                characteristic,
                text,
            } => {
                if let Err(e) = self
                    .controller
                    .write_characteristic_text(service, characteristic, &text)
                    .await
                {
                    report_error(&self.event_sender, &e);
                }
            }
        }
    }

    fn track(&self, address: Option<&str>) {
        if let Ok(mut tracked) = self.tracked_address.lock() {
            *tracked = address.map(str::to_string);
        }
    }
}

/// Forward adapter disconnect events for the tracked device to the UI.
fn spawn_disconnect_watcher(
    adapter: Adapter,
    sender: mpsc::UnboundedSender<AppEvent>,
    tracked: Arc<Mutex<Option<String>>>,
) {
    tokio::spawn(async move {
        let mut events = match adapter.events().await {
            Ok(events) => events,
            Err(e) => {
                warn!("Could not watch adapter events: {}", e);
                return;
            }
        };

        while let Some(event) = events.next().await {
            if let CentralEvent::DeviceDisconnected(id) = event {
                let Ok(peripheral) = adapter.peripheral(&id).await else {
                    continue;
                };
                let address = peripheral.address().to_string();
                let is_tracked = tracked
                    .lock()
                    .map(|t| t.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(&address)))
                    .unwrap_or(false);
                if is_tracked {
                    info!(%address, "Device disconnected");
                    let _ = sender
                        .send(AppEvent::ConnectionStatus(ConnectionStatus::Disconnected));
                }
            }
        }
    });
}
