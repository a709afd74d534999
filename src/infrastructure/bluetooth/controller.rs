//! GATT client wrapper.
//!
//! Every operation is a direct forward to the platform binding: connect,
//! disconnect, service discovery, notification enabling, characteristic
//! read/write, payload-ceiling negotiation. Results travel back to the UI as
//! [`AppEvent`]s, mirroring the callback interface of the platform stack.

use crate::domain::models::{
    AppEvent, ConnectionStatus, DeviceDetail, GattCharacteristicInfo, GattServiceInfo,
};
use crate::infrastructure::bluetooth::error::{BleError, Result};
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Peripheral as _, PeripheralProperties, WriteType,
};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Largest payload ceiling a peer can negotiate.
pub const MAX_PAYLOAD_CEILING: u16 = 512;

pub struct LowEnergyController {
    adapter: Adapter,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    peripheral: Option<Peripheral>,
    device_address: Option<String>,
    payload_ceiling: u16,
    notify_task: Option<JoinHandle<()>>,
}

impl LowEnergyController {
    pub fn new(adapter: Adapter, event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            adapter,
            event_sender,
            peripheral: None,
            device_address: None,
            payload_ceiling: MAX_PAYLOAD_CEILING,
            notify_task: None,
        }
    }

    /// Address of the device this client currently targets.
    pub fn connected_address(&self) -> Option<&str> {
        self.device_address.as_deref()
    }

    pub async fn is_connected(&self) -> bool {
        match &self.peripheral {
            Some(p) => p.is_connected().await.unwrap_or(false),
            None => false,
        }
    }

    /// Initiate a connection to the device with the given address.
    ///
    /// Reconnecting to the address already being tracked reuses the existing
    /// client instead of resolving the peripheral again.
    pub async fn connect(&mut self, address: &str) -> Result<()> {
        let address = normalize_address(address)?;
        info!(%address, "Connecting to device");

        if self.device_address.as_deref() == Some(address.as_str()) {
            if let Some(peripheral) = self.peripheral.clone() {
                debug!("Reusing existing client for {}", address);
                peripheral.connect().await?;
                self.announce_connected(&peripheral).await;
                return Ok(());
            }
        }

        let peripheral = self
            .find_peripheral(&address)
            .await?
            .ok_or_else(|| BleError::DeviceNotFound(address.clone()))?;

        peripheral.connect().await?;
        info!(%address, "Device connected");

        self.device_address = Some(address);
        self.peripheral = Some(peripheral.clone());
        self.announce_connected(&peripheral).await;
        Ok(())
    }

    /// Disconnects an established connection, or cancels one in progress.
    pub async fn disconnect(&mut self) -> Result<()> {
        let peripheral = self.peripheral.as_ref().ok_or(BleError::NotConnected)?;
        peripheral.disconnect().await?;
        Ok(())
    }

    /// Release the client. Must be called when the device is no longer used.
    pub async fn close(&mut self) {
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
        if let Some(peripheral) = self.peripheral.take() {
            if peripheral.is_connected().await.unwrap_or(false) {
                if let Err(e) = peripheral.disconnect().await {
                    warn!("Disconnect during close failed: {}", e);
                }
            }
        }
        self.device_address = None;
        info!("GATT client closed");
    }

    /// Discover services and characteristics, then publish a snapshot.
    pub async fn discover_services(&mut self) -> Result<()> {
        let peripheral = self.peripheral.as_ref().ok_or(BleError::NotConnected)?;
        peripheral.discover_services().await?;

        let services = service_snapshot(peripheral);
        info!("Discovered {} service(s)", services.len());
        let _ = self
            .event_sender
            .send(AppEvent::ServicesDiscovered(services));
        Ok(())
    }

    /// Enable notifications on every characteristic that supports them, and
    /// start forwarding the value stream.
    pub async fn subscribe_all(&mut self) -> Result<()> {
        let peripheral = self.peripheral.clone().ok_or(BleError::NotConnected)?;

        for characteristic in peripheral.characteristics() {
            if characteristic
                .properties
                .intersects(CharPropFlags::NOTIFY | CharPropFlags::INDICATE)
            {
                debug!(
                    service = %characteristic.service_uuid,
                    characteristic = %characteristic.uuid,
                    "Enabling notifications"
                );
                if let Err(e) = peripheral.subscribe(&characteristic).await {
                    warn!(
                        "Could not subscribe to {}: {}",
                        characteristic.uuid, e
                    );
                }
            }
        }

        self.spawn_notification_forwarder(&peripheral).await?;
        Ok(())
    }

    /// Record the requested payload ceiling and report it back.
    ///
    /// The binding negotiates the ATT MTU internally; the ceiling's visible
    /// effect is bounding the chunk size of outgoing writes.
    pub fn request_mtu(&mut self, mtu: u16) {
        let ceiling = mtu.min(MAX_PAYLOAD_CEILING);
        info!(requested = mtu, ceiling, "Payload ceiling updated");
        self.payload_ceiling = ceiling;
        let _ = self.event_sender.send(AppEvent::MtuChanged(ceiling));
    }

    /// Read a characteristic value and publish it.
    pub async fn read_characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<()> {
        let peripheral = self.peripheral.as_ref().ok_or(BleError::NotConnected)?;
        let target = find_characteristic(peripheral, service, characteristic)?;

        let value = peripheral.read(&target).await?;
        debug!(uuid = %characteristic, len = value.len(), "Characteristic read");
        let _ = self.event_sender.send(AppEvent::CharacteristicRead {
            uuid: characteristic,
            value,
        });
        Ok(())
    }

    /// Write a value to a characteristic, chunked to the payload ceiling.
    ///
    /// Empty payloads are ignored, matching the platform demo behavior.
    pub async fn write_characteristic(
        &self,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<()> {
        if data.is_empty() {
            debug!("Ignoring empty write to {}", characteristic);
            return Ok(());
        }

        let peripheral = self.peripheral.as_ref().ok_or(BleError::NotConnected)?;
        let target = find_characteristic(peripheral, service, characteristic)?;
        let write_type = if target.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        let mut ok = true;
        for chunk in data.chunks(self.payload_ceiling as usize) {
            if let Err(e) = peripheral.write(&target, chunk, write_type).await {
                warn!("Write to {} failed: {}", characteristic, e);
                ok = false;
                break;
            }
        }

        debug!(uuid = %characteristic, len = data.len(), ok, "Characteristic write");
        let _ = self.event_sender.send(AppEvent::CharacteristicWrite {
            uuid: characteristic,
            ok,
        });
        Ok(())
    }

    /// Convenience wrapper for writing UTF-8 text.
    pub async fn write_characteristic_text(
        &self,
        service: Uuid,
        characteristic: Uuid,
        text: &str,
    ) -> Result<()> {
        self.write_characteristic(service, characteristic, text.as_bytes())
            .await
    }

    async fn announce_connected(&self, peripheral: &Peripheral) {
        let detail = match peripheral.properties().await {
            Ok(Some(props)) => device_detail(&props),
            _ => DeviceDetail {
                address: peripheral.address().to_string(),
                ..DeviceDetail::default()
            },
        };
        let _ = self.event_sender.send(AppEvent::DeviceDetail(detail));
        let _ = self
            .event_sender
            .send(AppEvent::ConnectionStatus(ConnectionStatus::Connected));
    }

    async fn find_peripheral(&self, address: &str) -> Result<Option<Peripheral>> {
        for peripheral in self.adapter.peripherals().await? {
            if peripheral.address().to_string().eq_ignore_ascii_case(address) {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }

    async fn spawn_notification_forwarder(&mut self, peripheral: &Peripheral) -> Result<()> {
        if let Some(task) = &self.notify_task {
            if !task.is_finished() {
                return Ok(());
            }
        }

        let mut notifications = peripheral.notifications().await?;
        let sender = self.event_sender.clone();
        self.notify_task = Some(tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                let _ = sender.send(AppEvent::CharacteristicChanged {
                    uuid: notification.uuid,
                    value: notification.value,
                });
            }
        }));
        Ok(())
    }
}

/// Uppercase an `AA:BB:CC:DD:EE:FF` address, rejecting malformed input.
pub fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let bytes: Vec<&str> = trimmed.split(':').collect();
    let well_formed = bytes.len() == 6
        && bytes
            .iter()
            .all(|b| b.len() == 2 && b.chars().all(|c| c.is_ascii_hexdigit()));
    if !well_formed {
        return Err(BleError::InvalidAddress(trimmed.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Format the facts the binding exposes about a peripheral. Absent fields
/// stay empty strings.
pub fn device_detail(props: &PeripheralProperties) -> DeviceDetail {
    DeviceDetail {
        name: props.local_name.clone().unwrap_or_default(),
        address: props.address.to_string(),
        address_type: props
            .address_type
            .map(|t| format!("{:?}", t).to_lowercase())
            .unwrap_or_default(),
        device_class: props.class.map(|c| format!("{:#08x}", c)).unwrap_or_default(),
        services: props
            .services
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Render a characteristic's property flags, e.g. "READ | WRITE | NOTIFY".
pub fn format_properties(flags: CharPropFlags) -> String {
    const NAMES: &[(CharPropFlags, &str)] = &[
        (CharPropFlags::BROADCAST, "BROADCAST"),
        (CharPropFlags::READ, "READ"),
        (CharPropFlags::WRITE_WITHOUT_RESPONSE, "WRITE_NO_RSP"),
        (CharPropFlags::WRITE, "WRITE"),
        (CharPropFlags::NOTIFY, "NOTIFY"),
        (CharPropFlags::INDICATE, "INDICATE"),
    ];

    let parts: Vec<&str> = NAMES
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect();
    parts.join(" | ")
}

fn characteristic_info(characteristic: &Characteristic) -> GattCharacteristicInfo {
    let props = characteristic.properties;
    GattCharacteristicInfo {
        uuid: characteristic.uuid,
        service_uuid: characteristic.service_uuid,
        properties: format_properties(props),
        can_read: props.contains(CharPropFlags::READ),
        can_write: props
            .intersects(CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE),
        can_notify: props.intersects(CharPropFlags::NOTIFY | CharPropFlags::INDICATE),
    }
}

fn service_snapshot(peripheral: &Peripheral) -> Vec<GattServiceInfo> {
    peripheral
        .services()
        .iter()
        .map(|service| GattServiceInfo {
            uuid: service.uuid,
            primary: service.primary,
            characteristics: service.characteristics.iter().map(characteristic_info).collect(),
        })
        .collect()
}

fn find_characteristic(
    peripheral: &Peripheral,
    service: Uuid,
    characteristic: Uuid,
) -> Result<Characteristic> {
    let services = peripheral.services();
    let service = services
        .iter()
        .find(|s| s.uuid == service)
        .ok_or(BleError::ServiceNotFound(service))?;
    service
        .characteristics
        .iter()
        .find(|c| c.uuid == characteristic)
        .cloned()
        .ok_or(BleError::CharacteristicNotFound(characteristic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use btleplug::api::{AddressType, BDAddr};
    use std::str::FromStr;

    fn props_with(name: Option<&str>, class: Option<u32>) -> PeripheralProperties {
        PeripheralProperties {
            address: BDAddr::from_str("AA:BB:CC:DD:EE:FF").unwrap(),
            address_type: Some(AddressType::Public),
            local_name: name.map(str::to_string),
            class,
            services: vec![Uuid::from_u128(0x180F)],
            ..PeripheralProperties::default()
        }
    }

    #[test]
    fn addresses_are_normalized_to_uppercase() {
        let addr = normalize_address(" aa:bb:cc:dd:ee:ff ").unwrap();
        assert_eq!(addr, "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(normalize_address("").is_err());
        assert!(normalize_address("AA:BB:CC").is_err());
        assert!(normalize_address("ZZ:BB:CC:DD:EE:FF").is_err());
        assert!(normalize_address("AABBCCDDEEFF").is_err());
    }

    #[test]
    fn detail_formats_every_exposed_field() {
        let detail = device_detail(&props_with(Some("Heart Monitor"), Some(0x240404)));
        assert_eq!(detail.name, "Heart Monitor");
        assert_eq!(detail.address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(detail.address_type, "public");
        assert_eq!(detail.device_class, "0x240404");
        assert!(detail.services.contains("180f"));
    }

    #[test]
    fn detail_defaults_absent_fields_to_empty() {
        let detail = device_detail(&props_with(None, None));
        assert_eq!(detail.name, "");
        assert_eq!(detail.device_class, "");
    }

    #[test]
    fn property_flags_render_in_canonical_order() {
        let rendered =
            format_properties(CharPropFlags::NOTIFY | CharPropFlags::READ | CharPropFlags::WRITE);
        assert_eq!(rendered, "READ | WRITE | NOTIFY");
    }

    #[test]
    fn empty_property_flags_render_empty() {
        assert_eq!(format_properties(CharPropFlags::empty()), "");
    }
}
