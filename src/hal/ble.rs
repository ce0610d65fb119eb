use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::state::{CloseHandle, ConnectionState, StateCell};
use super::traits::{GattClient, TransportSource};
use crate::config::BleConfig;
use crate::core::{Channel, FrameLayout, RawFrame};
use crate::error::{TransportError, TransportResult};

/// Polls the ADC, accel and gyro characteristics of a GATT peripheral.
///
/// One `read_next` performs three sequential reads. The reads are not
/// atomic across characteristics, so sub-channels of one frame may come
/// from adjacent device samples. The frame sequence is the local read
/// index since the device does not send one.
pub struct BleTransport<C: GattClient> {
    client: C,
    config: BleConfig,
    read_index: u64,
    status: StateCell,
    closer: CloseHandle,
}

impl<C: GattClient> BleTransport<C> {
    pub fn new(client: C, config: BleConfig) -> Self {
        Self {
            client,
            config,
            read_index: 0,
            status: StateCell::new(),
            closer: CloseHandle::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Number of complete poll cycles so far
    pub fn read_index(&self) -> u64 {
        self.read_index
    }

    fn characteristic(&self, channel: Channel) -> Uuid {
        match channel {
            Channel::Adc => self.config.adc_uuid,
            Channel::Accel => self.config.accel_uuid,
            Channel::Gyro => self.config.gyro_uuid,
        }
    }

    async fn read_characteristic(&mut self, channel: Channel) -> TransportResult<Vec<u8>> {
        let uuid = self.characteristic(channel);
        let read_timeout = self.config.read_timeout();
        let result = with_timeout(read_timeout, self.client.read(uuid), || {
            format!("reading {} characteristic {}", channel, uuid)
        })
        .await;

        match &result {
            Err(TransportError::Disconnected(_)) => {
                self.status.set(ConnectionState::Reconnecting);
            }
            Err(TransportError::Timeout(_)) => {
                // Link may still report connected; drop it so the next connect is real
                self.status.set(ConnectionState::Reconnecting);
                if let Err(e) = self.client.disconnect().await {
                    tracing::debug!(error = %e, "disconnect after read timeout failed");
                }
            }
            _ => {}
        }
        result
    }

    async fn pause(&self, delay: Duration) -> TransportResult<()> {
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = self.closer.closed() => Err(TransportError::Closed),
        }
    }
}

async fn with_timeout<T, F, D>(limit: Duration, fut: F, describe: D) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
    D: FnOnce() -> String,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(format!("{} after {:?}", describe(), limit))),
    }
}

#[async_trait]
impl<C: GattClient> TransportSource for BleTransport<C> {
    fn name(&self) -> &str {
        "ble"
    }

    fn layout(&self) -> FrameLayout {
        FrameLayout::Binary
    }

    async fn connect(&mut self) -> TransportResult<()> {
        if self.closer.is_closed() {
            return Err(TransportError::Closed);
        }
        if self.client.is_connected().await {
            self.status.set(ConnectionState::Connected);
            return Ok(());
        }

        if self.status.get() != ConnectionState::Reconnecting {
            self.status.set(ConnectionState::Connecting);
        }

        let connect_timeout = self.config.connect_timeout();
        let device = self.config.device_name.clone();
        with_timeout(connect_timeout, self.client.connect(), || {
            format!("connecting to {}", device)
        })
        .await?;

        self.pause(self.config.settle_delay()).await?;

        if !self.client.is_connected().await {
            return Err(TransportError::Disconnected(format!(
                "{} dropped the link during setup",
                self.config.device_name
            )));
        }

        tracing::info!(device = %self.config.device_name, "connected to sensor module");
        self.status.set(ConnectionState::Connected);
        Ok(())
    }

    async fn read_next(&mut self) -> TransportResult<RawFrame> {
        if self.closer.is_closed() {
            return Err(TransportError::Closed);
        }
        if self.read_index > 0 {
            self.pause(self.config.poll_interval()).await?;
        }

        if !self.client.is_connected().await {
            self.status.set(ConnectionState::Reconnecting);
            return Err(TransportError::Disconnected(format!(
                "{} is not connected",
                self.config.device_name
            )));
        }

        let adc = self.read_characteristic(Channel::Adc).await?;
        let accel = self.read_characteristic(Channel::Accel).await?;
        let gyro = self.read_characteristic(Channel::Gyro).await?;

        let read_index = self.read_index;
        self.read_index += 1;

        Ok(RawFrame::Gatt {
            read_index,
            adc,
            accel,
            gyro,
        })
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.closer.close();
        let result = if self.client.is_connected().await {
            self.client.disconnect().await
        } else {
            Ok(())
        };
        self.status.set(ConnectionState::Disconnected);
        result
    }

    fn status(&self) -> &StateCell {
        &self.status
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}
