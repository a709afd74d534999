//! Error taxonomy for the Bluetooth layer.
//!
//! Failures are classified once, logged, and surfaced to the user as a fixed
//! message. There is no retry policy; recovery is left to the user.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BleError {
    #[error("no Bluetooth adapter available")]
    AdapterUnavailable,

    #[error("Bluetooth access denied by the system")]
    PermissionDenied,

    #[error("device {0} not found")]
    DeviceNotFound(String),

    #[error("no device connected")]
    NotConnected,

    #[error("service {0} not found on the connected device")]
    ServiceNotFound(Uuid),

    #[error("characteristic {0} not found on the connected device")]
    CharacteristicNotFound(Uuid),

    #[error("invalid device address: {0}")]
    InvalidAddress(String),

    #[error("bluetooth backend: {0}")]
    Backend(btleplug::Error),
}

impl From<btleplug::Error> for BleError {
    fn from(err: btleplug::Error) -> Self {
        match err {
            btleplug::Error::PermissionDenied => BleError::PermissionDenied,
            btleplug::Error::DeviceNotFound => BleError::DeviceNotFound("<unknown>".to_string()),
            btleplug::Error::NotConnected => BleError::NotConnected,
            other => BleError::Backend(other),
        }
    }
}

impl BleError {
    /// Fixed message shown in the status line for this failure class.
    pub fn user_message(&self) -> &'static str {
        match self {
            BleError::AdapterUnavailable => "Bluetooth is not available on this device.",
            BleError::PermissionDenied => {
                "Bluetooth access was denied. Grant access in system settings and retry."
            }
            BleError::DeviceNotFound(_) => "The selected device is no longer in range.",
            BleError::NotConnected => "Not connected to a device.",
            BleError::ServiceNotFound(_) | BleError::CharacteristicNotFound(_) => {
                "The requested attribute was not found on the device."
            }
            BleError::InvalidAddress(_) => "The device address could not be parsed.",
            BleError::Backend(_) => "Bluetooth LE connection failed.",
        }
    }
}

pub type Result<T> = std::result::Result<T, BleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_permission_error_is_classified() {
        let err = BleError::from(btleplug::Error::PermissionDenied);
        assert!(matches!(err, BleError::PermissionDenied));
    }

    #[test]
    fn backend_not_connected_is_classified() {
        let err = BleError::from(btleplug::Error::NotConnected);
        assert!(matches!(err, BleError::NotConnected));
    }

    #[test]
    fn unclassified_backend_errors_keep_a_generic_message() {
        let err = BleError::from(btleplug::Error::RuntimeError("boom".to_string()));
        assert!(matches!(err, BleError::Backend(_)));
        assert_eq!(err.user_message(), "Bluetooth LE connection failed.");
    }
}
