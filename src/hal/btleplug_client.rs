use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Manager, Peripheral};
use uuid::Uuid;

use super::traits::GattClient;
use crate::config::BleConfig;
use crate::error::{TransportError, TransportResult};

fn map_err(err: btleplug::Error) -> TransportError {
    match err {
        btleplug::Error::NotConnected | btleplug::Error::DeviceNotFound => {
            TransportError::Disconnected(err.to_string())
        }
        btleplug::Error::TimedOut(d) => TransportError::Timeout(format!("btleplug after {:?}", d)),
        other => TransportError::Io(other.to_string()),
    }
}

/// GATT client over the platform Bluetooth stack.
///
/// The peripheral is located by advertised name on the first connect and
/// reused for reconnects.
pub struct BtleplugClient {
    config: BleConfig,
    peripheral: Option<Peripheral>,
    characteristics: Vec<Characteristic>,
}

impl BtleplugClient {
    pub fn new(config: BleConfig) -> Self {
        Self {
            config,
            peripheral: None,
            characteristics: Vec::new(),
        }
    }

    async fn find_peripheral(&self) -> TransportResult<Peripheral> {
        let manager = Manager::new().await.map_err(map_err)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(map_err)?
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Io("no Bluetooth adapter found".into()))?;

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(map_err)?;
        tokio::time::sleep(self.config.scan_timeout()).await;
        let peripherals = adapter.peripherals().await.map_err(map_err)?;
        let _ = adapter.stop_scan().await;

        for peripheral in peripherals {
            let name = peripheral
                .properties()
                .await
                .map_err(map_err)?
                .and_then(|props| props.local_name);
            if name.as_deref() == Some(self.config.device_name.as_str()) {
                tracing::info!(device = %self.config.device_name, address = %peripheral.address(), "found sensor module");
                return Ok(peripheral);
            }
        }

        Err(TransportError::Disconnected(format!(
            "{} not found during scan",
            self.config.device_name
        )))
    }
}

#[async_trait]
impl GattClient for BtleplugClient {
    async fn connect(&mut self) -> TransportResult<()> {
        let peripheral = match &self.peripheral {
            Some(p) => p.clone(),
            None => {
                let p = self.find_peripheral().await?;
                self.peripheral = Some(p.clone());
                p
            }
        };

        peripheral.connect().await.map_err(map_err)?;
        peripheral.discover_services().await.map_err(map_err)?;
        self.characteristics = peripheral.characteristics().into_iter().collect();

        for characteristic in &self.characteristics {
            tracing::debug!(service = %characteristic.service_uuid, uuid = %characteristic.uuid, "characteristic");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        match &self.peripheral {
            Some(p) => p.is_connected().await.unwrap_or(false),
            None => false,
        }
    }

    async fn read(&mut self, characteristic: Uuid) -> TransportResult<Vec<u8>> {
        let peripheral = self
            .peripheral
            .as_ref()
            .ok_or_else(|| TransportError::Disconnected("no peripheral".into()))?;
        let target = self
            .characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .ok_or_else(|| TransportError::Io(format!("characteristic {} not offered", characteristic)))?;

        peripheral.read(target).await.map_err(map_err)
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        if let Some(p) = &self.peripheral {
            p.disconnect().await.map_err(map_err)?;
        }
        Ok(())
    }
}
