use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            console_logging_enabled: default_true(),
            file_logging_enabled: default_false(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "blescope".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// How long a scan window lasts before results are finalized.
    #[serde(default = "default_scan_window_ms")]
    pub scan_window_ms: u64,

    /// Settle delay applied before each call forwarded to the adapter.
    #[serde(default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,

    /// Payload ceiling requested once a connection is up.
    #[serde(default = "default_preferred_mtu")]
    pub preferred_mtu: u16,

    /// Include advertisers that never sent a local name.
    #[serde(default = "default_false")]
    pub show_unnamed_devices: bool,

    #[serde(default)]
    pub last_connected_address: Option<String>,

    #[serde(default)]
    pub known_addresses: Vec<String>,

    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scan_window_ms: default_scan_window_ms(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            preferred_mtu: default_preferred_mtu(),
            show_unnamed_devices: false,
            last_connected_address: None,
            known_addresses: Vec::new(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_scan_window_ms() -> u64 {
    5000
}
fn default_dispatch_delay_ms() -> u64 {
    10
}
fn default_preferred_mtu() -> u16 {
    512
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("BleScope");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Remember an address that completed a connection at least once.
    pub fn add_known_address(&mut self, address: &str) -> anyhow::Result<()> {
        self.settings.last_connected_address = Some(address.to_string());
        if !self.settings.known_addresses.iter().any(|a| a == address) {
            self.settings.known_addresses.push(address.to_string());
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_behavior() {
        let settings = Settings::default();
        assert_eq!(settings.scan_window_ms, 5000);
        assert_eq!(settings.dispatch_delay_ms, 10);
        assert_eq!(settings.preferred_mtu, 512);
        assert!(!settings.show_unnamed_devices);
    }

    #[test]
    fn settings_survive_a_json_round_trip() {
        let mut settings = Settings::default();
        settings.scan_window_ms = 8000;
        settings.last_connected_address = Some("AA:BB:CC:DD:EE:FF".to_string());

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scan_window_ms, 8000);
        assert_eq!(
            back.last_connected_address.as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let back: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(back.scan_window_ms, 5000);
        assert_eq!(back.preferred_mtu, 512);
        assert!(back.known_addresses.is_empty());
    }
}
