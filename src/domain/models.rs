//! Core data types shared between the UI and the Bluetooth worker.

use uuid::Uuid;

/// A peripheral seen during a scan window.
///
/// Identity is the address string the platform binding assigns; two sightings
/// with the same address are the same device.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    pub address: String,
    pub name: String,
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    /// Name to show in device lists. Nameless advertisers render as "Unknown".
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }
}

/// Formatted facts about the connected peripheral.
///
/// Every field is a display string; anything the binding does not expose
/// stays empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceDetail {
    pub name: String,
    pub address: String,
    pub address_type: String,
    pub device_class: String,
    pub services: String,
}

/// Snapshot of one GATT service taken at discovery time.
#[derive(Debug, Clone, PartialEq)]
pub struct GattServiceInfo {
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<GattCharacteristicInfo>,
}

/// Snapshot of one characteristic within a discovered service.
#[derive(Debug, Clone, PartialEq)]
pub struct GattCharacteristicInfo {
    pub uuid: Uuid,
    pub service_uuid: Uuid,
    /// Formatted property list, e.g. "READ | WRITE | NOTIFY".
    pub properties: String,
    pub can_read: bool,
    pub can_write: bool,
    pub can_notify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Why the Bluetooth stack is unusable on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    NoAdapter,
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, severity: MessageSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Requests forwarded to the Bluetooth worker. Each maps to a single call
/// against the platform binding.
#[derive(Debug, Clone)]
pub enum BleCommand {
    /// Scan for the given window in milliseconds, then report what was seen.
    Scan { window_ms: u64 },
    StopScan,
    Connect { address: String },
    Disconnect,
    Close,
    DiscoverServices,
    /// Enable notifications on every characteristic that supports them.
    SubscribeAll,
    RequestMtu(u16),
    Read {
        service: Uuid,
        characteristic: Uuid,
    },
    Write {
        service: Uuid,
        characteristic: Uuid,
        data: Vec<u8>,
    },
    WriteText {
        service: Uuid,
        characteristic: Uuid,
        text: String,
    },
}

/// Events emitted by the Bluetooth worker and drained by the UI each frame.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ScanStarted,
    ScanCompleted(Vec<DiscoveredDevice>),
    ConnectionStatus(ConnectionStatus),
    DeviceDetail(DeviceDetail),
    ServicesDiscovered(Vec<GattServiceInfo>),
    MtuChanged(u16),
    CharacteristicRead { uuid: Uuid, value: Vec<u8> },
    CharacteristicWrite { uuid: Uuid, ok: bool },
    CharacteristicChanged { uuid: Uuid, value: Vec<u8> },
    BluetoothUnavailable(UnavailableReason),
    LogMessage(StatusMessage),
}

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Scan,
    Devices,
    Detail,
    Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nameless_device_renders_as_unknown() {
        let device = DiscoveredDevice {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            name: String::new(),
            rssi: Some(-60),
        };
        assert_eq!(device.display_name(), "Unknown");
    }

    #[test]
    fn named_device_keeps_its_name() {
        let device = DiscoveredDevice {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            name: "Thermometer".to_string(),
            rssi: None,
        };
        assert_eq!(device.display_name(), "Thermometer");
    }

    #[test]
    fn detail_defaults_to_empty_strings() {
        let detail = DeviceDetail::default();
        assert!(detail.name.is_empty());
        assert!(detail.address.is_empty());
        assert!(detail.address_type.is_empty());
        assert!(detail.device_class.is_empty());
        assert!(detail.services.is_empty());
    }
}
