//! BLE device discovery.
//!
//! A scan runs for a fixed wall-clock window. Sightings are collected into a
//! de-duplicating accumulator keyed by device address; when the window
//! elapses the scan is stopped and the finished list is delivered in a single
//! [`AppEvent::ScanCompleted`].

use crate::domain::models::{AppEvent, DiscoveredDevice};
use crate::infrastructure::bluetooth::error::Result;
use crate::infrastructure::bluetooth::service::report_error;
use btleplug::api::{Central, CentralEvent, Peripheral as _, ScanFilter};
use btleplug::platform::Adapter;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Collects scan sightings, one slot per device address.
///
/// The first sighting claims the slot; later sightings only refresh the name
/// (if it was still empty) and the signal strength. Cleared at the start of
/// every scan window.
#[derive(Debug, Default)]
pub struct ScanAccumulator {
    devices: Vec<DiscoveredDevice>,
}

impl ScanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn observe(&mut self, address: String, name: Option<String>, rssi: Option<i16>) {
        if let Some(existing) = self.devices.iter_mut().find(|d| d.address == address) {
            if existing.name.is_empty() {
                if let Some(name) = name {
                    existing.name = name;
                }
            }
            if rssi.is_some() {
                existing.rssi = rssi;
            }
        } else {
            self.devices.push(DiscoveredDevice {
                address,
                name: name.unwrap_or_default(),
                rssi,
            });
        }
    }

    /// Finalize the window. Nameless devices are dropped unless
    /// `include_unnamed` is set.
    pub fn finish(self, include_unnamed: bool) -> Vec<DiscoveredDevice> {
        self.devices
            .into_iter()
            .filter(|d| include_unnamed || !d.name.is_empty())
            .collect()
    }
}

/// Runs fixed-window scans against one adapter.
pub struct BleScanner {
    adapter: Adapter,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    results: Arc<Mutex<ScanAccumulator>>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BleScanner {
    pub fn new(adapter: Adapter, event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            adapter,
            event_sender,
            results: Arc::new(Mutex::new(ScanAccumulator::new())),
            stop: None,
            task: None,
        }
    }

    /// Start a scan window. A window already in progress is left alone.
    pub fn start(&mut self, window: Duration, include_unnamed: bool) -> Result<()> {
        if self.is_scanning() {
            debug!("Scan already in progress, ignoring start request");
            return Ok(());
        }

        info!(window_ms = window.as_millis() as u64, "Starting BLE scan");
        if let Ok(mut results) = self.results.lock() {
            results.clear();
        }
        let _ = self.event_sender.send(AppEvent::ScanStarted);

        let (stop_tx, stop_rx) = oneshot::channel();
        let adapter = self.adapter.clone();
        let sender = self.event_sender.clone();
        let results = self.results.clone();

        self.stop = Some(stop_tx);
        self.task = Some(tokio::spawn(async move {
            match run_window(adapter, &results, window, stop_rx).await {
                Ok(()) => {
                    let devices = results
                        .lock()
                        .map(|mut acc| std::mem::take(&mut *acc))
                        .unwrap_or_default()
                        .finish(include_unnamed);
                    info!("Scan window finished with {} device(s)", devices.len());
                    let _ = sender.send(AppEvent::ScanCompleted(devices));
                }
                Err(e) => {
                    warn!("Scan failed: {}", e);
                    let _ = sender.send(AppEvent::ScanCompleted(Vec::new()));
                    report_error(&sender, &e);
                }
            }
        }));

        Ok(())
    }

    /// Cut the current window short; accumulated results are still delivered.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            info!("Stopping BLE scan early");
            let _ = stop.send(());
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }
}

/// One scan window: start the adapter scan, fold central events into the
/// accumulator, stop when the deadline or a stop request arrives.
async fn run_window(
    adapter: Adapter,
    results: &Mutex<ScanAccumulator>,
    window: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<()> {
    let mut events = adapter.events().await?;
    adapter.start_scan(ScanFilter::default()).await?;

    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut stop_rx => break,
            event = events.next() => {
                let Some(event) = event else { break };
                if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event {
                    if let Ok(peripheral) = adapter.peripheral(&id).await {
                        let address = peripheral.address().to_string();
                        let (name, rssi) = match peripheral.properties().await {
                            Ok(Some(props)) => (props.local_name, props.rssi),
                            _ => (None, None),
                        };
                        if let Ok(mut acc) = results.lock() {
                            acc.observe(address, name, rssi);
                        }
                    }
                }
            }
        }
    }

    if let Err(e) = adapter.stop_scan().await {
        warn!("Failed to stop scan cleanly: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_deduplicates_by_address() {
        let mut acc = ScanAccumulator::new();
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Sensor".into()), Some(-50));
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Sensor".into()), Some(-48));
        acc.observe("11:22:33:44:55:66".into(), None, None);

        let devices = acc.finish(true);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].rssi, Some(-48));
    }

    #[test]
    fn late_name_fills_an_empty_slot() {
        let mut acc = ScanAccumulator::new();
        acc.observe("AA:BB:CC:DD:EE:FF".into(), None, Some(-70));
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Beacon".into()), None);

        let devices = acc.finish(false);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Beacon");
        assert_eq!(devices[0].rssi, Some(-70));
    }

    #[test]
    fn first_name_is_not_overwritten() {
        let mut acc = ScanAccumulator::new();
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("First".into()), None);
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Second".into()), None);

        let devices = acc.finish(true);
        assert_eq!(devices[0].name, "First");
    }

    #[test]
    fn unnamed_devices_are_filtered_unless_requested() {
        let mut acc = ScanAccumulator::new();
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Named".into()), None);
        acc.observe("11:22:33:44:55:66".into(), None, None);
        assert_eq!(acc.finish(false).len(), 1);

        let mut acc = ScanAccumulator::new();
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Named".into()), None);
        acc.observe("11:22:33:44:55:66".into(), None, None);
        assert_eq!(acc.finish(true).len(), 2);
    }

    #[test]
    fn clear_resets_the_window() {
        let mut acc = ScanAccumulator::new();
        acc.observe("AA:BB:CC:DD:EE:FF".into(), Some("Sensor".into()), None);
        acc.clear();
        assert!(acc.finish(true).is_empty());
    }
}
