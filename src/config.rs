use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::buffers::DEFAULT_CAPACITY;
use crate::error::ConfigError;
use crate::resilience::ReconnectPolicy;

pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef0);
pub const ADC_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef1);
pub const ACCEL_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef2);
pub const GYRO_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef3);

pub const DEFAULT_DEVICE_NAME: &str = "ESP32_Sensor_Module";
pub const DEFAULT_UDP_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_LOG_PATH: &str = "data.txt";

/// BLE poll settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// Advertised name of the sensor module
    pub device_name: String,
    pub service_uuid: Uuid,
    pub adc_uuid: Uuid,
    pub accel_uuid: Uuid,
    pub gyro_uuid: Uuid,
    pub scan_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Pause after connecting before the first read
    pub settle_delay_ms: u64,
    /// Per-characteristic read timeout
    pub read_timeout_ms: u64,
    /// Pause between poll cycles
    pub poll_interval_ms: u64,
}

impl BleConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            service_uuid: SERVICE_UUID,
            adc_uuid: ADC_CHARACTERISTIC_UUID,
            accel_uuid: ACCEL_CHARACTERISTIC_UUID,
            gyro_uuid: GYRO_CHARACTERISTIC_UUID,
            scan_timeout_ms: 5_000,
            connect_timeout_ms: 20_000,
            settle_delay_ms: 2_000,
            read_timeout_ms: 5_000,
            poll_interval_ms: 0,
        }
    }
}

/// UDP listen settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpConfig {
    pub bind_addr: String,
    /// Receive buffer; longer datagrams are truncated
    pub buffer_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_UDP_BIND.to_string(),
            buffer_size: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    Udp(UdpConfig),
    Ble(BleConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Udp(UdpConfig::default())
    }
}

/// Everything needed to start one ingestion session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    /// Samples kept per channel for presentation
    pub buffer_capacity: usize,
    pub log_path: PathBuf,
    /// Write the frame sequence as a leading log column
    pub record_sequence: bool,
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            buffer_capacity: DEFAULT_CAPACITY,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            record_sequence: false,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn udp(bind_addr: impl Into<String>) -> Self {
        Self {
            transport: TransportConfig::Udp(UdpConfig {
                bind_addr: bind_addr.into(),
                ..UdpConfig::default()
            }),
            ..Self::default()
        }
    }

    pub fn ble(device_name: impl Into<String>) -> Self {
        Self {
            transport: TransportConfig::Ble(BleConfig {
                device_name: device_name.into(),
                ..BleConfig::default()
            }),
            ..Self::default()
        }
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Invalid("buffer_capacity must be at least 1".into()));
        }
        if self.reconnect.max_attempts == 0 {
            return Err(ConfigError::Invalid("reconnect.max_attempts must be at least 1".into()));
        }
        match &self.transport {
            TransportConfig::Udp(udp) => {
                if udp.buffer_size == 0 {
                    return Err(ConfigError::Invalid("udp.buffer_size must be at least 1".into()));
                }
            }
            TransportConfig::Ble(ble) => {
                if ble.connect_timeout_ms == 0 || ble.read_timeout_ms == 0 {
                    return Err(ConfigError::Invalid("ble timeouts must be non-zero".into()));
                }
            }
        }
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON via a temporary file and rename
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(|source| ConfigError::Write {
            path: temp_path.display().to_string(),
            source,
        })?;
        fs::rename(&temp_path, path).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}
