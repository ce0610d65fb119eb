use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::BleConfig;
use crate::core::{AdcSample, AxisSample, Channel};
use crate::error::{TransportError, TransportResult};
use crate::hal::GattClient;

/// What the simulated module does on the next poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Serve these raw characteristic payloads
    Payload {
        adc: Vec<u8>,
        accel: Vec<u8>,
        gyro: Vec<u8>,
    },
    /// Drop the link when the ADC characteristic is read
    Disconnect,
    /// Never answer the ADC read
    Stall,
}

impl ReadEvent {
    /// Payloads encoded as little-endian i16, as the firmware sends them
    pub fn samples(adc: AdcSample, accel: AxisSample, gyro: AxisSample) -> Self {
        Self::Payload {
            adc: encode_le(&adc),
            accel: encode_le(&accel),
            gyro: encode_le(&gyro),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    /// Refuse with `Disconnected`
    Refuse,
    /// Never complete, so the caller's connect timeout fires
    Stall,
}

pub fn encode_le(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

struct Inner {
    connected: bool,
    connect_behavior: ConnectBehavior,
    connect_script: VecDeque<ConnectBehavior>,
    reads: VecDeque<ReadEvent>,
    /// accel/gyro payloads of the cycle started by the last ADC read
    pending: Option<(Vec<u8>, Vec<u8>)>,
    synthetic: bool,
    synthetic_counter: u64,
    connect_attempts: usize,
    cycles_served: usize,
    disconnects: usize,
}

/// In-process stand-in for the sensor module's GATT server.
///
/// Clones share state, so a test can keep one handle to script events and
/// inspect counters while the transport owns another. With an empty read
/// script it serves synthetic samples derived from a running counter.
#[derive(Clone)]
pub struct SimulatedGattClient {
    inner: Arc<Mutex<Inner>>,
    adc_uuid: Uuid,
    accel_uuid: Uuid,
    gyro_uuid: Uuid,
}

impl SimulatedGattClient {
    pub fn new() -> Self {
        Self::with_config(&BleConfig::default())
    }

    pub fn with_config(config: &BleConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                connected: false,
                connect_behavior: ConnectBehavior::Succeed,
                connect_script: VecDeque::new(),
                reads: VecDeque::new(),
                pending: None,
                synthetic: true,
                synthetic_counter: 0,
                connect_attempts: 0,
                cycles_served: 0,
                disconnects: 0,
            })),
            adc_uuid: config.adc_uuid,
            accel_uuid: config.accel_uuid,
            gyro_uuid: config.gyro_uuid,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue events for upcoming poll cycles
    pub fn push_reads(&self, events: impl IntoIterator<Item = ReadEvent>) {
        self.lock().reads.extend(events);
    }

    /// When disabled, reads past the end of the script never answer
    pub fn set_synthetic(&self, enabled: bool) {
        self.lock().synthetic = enabled;
    }

    /// Behaviour for every connect attempt without a scripted outcome
    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        self.lock().connect_behavior = behavior;
    }

    /// One-shot outcomes for the next connect attempts
    pub fn push_connects(&self, outcomes: impl IntoIterator<Item = ConnectBehavior>) {
        self.lock().connect_script.extend(outcomes);
    }

    /// Simulate the peripheral dropping the link
    pub fn drop_link(&self) {
        let mut inner = self.lock();
        inner.connected = false;
        inner.pending = None;
    }

    pub fn connect_attempts(&self) -> usize {
        self.lock().connect_attempts
    }

    pub fn cycles_served(&self) -> usize {
        self.lock().cycles_served
    }

    pub fn disconnects(&self) -> usize {
        self.lock().disconnects
    }

    fn channel_of(&self, uuid: Uuid) -> Option<Channel> {
        if uuid == self.adc_uuid {
            Some(Channel::Adc)
        } else if uuid == self.accel_uuid {
            Some(Channel::Accel)
        } else if uuid == self.gyro_uuid {
            Some(Channel::Gyro)
        } else {
            None
        }
    }

    fn synthesize(counter: u64) -> ReadEvent {
        let base = (counter % 1000) as i16;
        let mut adc = [0i16; 8];
        for (i, value) in adc.iter_mut().enumerate() {
            *value = base * 10 + i as i16;
        }
        ReadEvent::samples(adc, [base, -base, 1000], [0, base / 2, -1])
    }
}

impl Default for SimulatedGattClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GattClient for SimulatedGattClient {
    async fn connect(&mut self) -> TransportResult<()> {
        let behavior = {
            let mut inner = self.lock();
            inner.connect_attempts += 1;
            let behavior = inner
                .connect_script
                .pop_front()
                .unwrap_or(inner.connect_behavior);
            if behavior == ConnectBehavior::Succeed {
                inner.connected = true;
            }
            behavior
        };

        match behavior {
            ConnectBehavior::Succeed => Ok(()),
            ConnectBehavior::Refuse => {
                Err(TransportError::Disconnected("peripheral refused connection".into()))
            }
            ConnectBehavior::Stall => std::future::pending().await,
        }
    }

    async fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn read(&mut self, characteristic: Uuid) -> TransportResult<Vec<u8>> {
        // Let other tasks run between reads, as a radio round-trip would
        tokio::task::yield_now().await;

        let channel = self.channel_of(characteristic).ok_or_else(|| {
            TransportError::Io(format!("unknown characteristic {}", characteristic))
        })?;

        let result = {
            let mut inner = self.lock();
            if !inner.connected {
                return Err(TransportError::Disconnected("not connected".into()));
            }

            match channel {
                Channel::Adc => {
                    let event = match inner.reads.pop_front() {
                        Some(event) => event,
                        None if !inner.synthetic => ReadEvent::Stall,
                        None => {
                            let counter = inner.synthetic_counter;
                            inner.synthetic_counter += 1;
                            Self::synthesize(counter)
                        }
                    };
                    match event {
                        ReadEvent::Payload { adc, accel, gyro } => {
                            inner.pending = Some((accel, gyro));
                            inner.cycles_served += 1;
                            Some(Ok(adc))
                        }
                        ReadEvent::Disconnect => {
                            inner.connected = false;
                            inner.pending = None;
                            inner.disconnects += 1;
                            Some(Err(TransportError::Disconnected("link lost".into())))
                        }
                        ReadEvent::Stall => None,
                    }
                }
                Channel::Accel => Some(
                    inner
                        .pending
                        .as_ref()
                        .map(|(accel, _)| accel.clone())
                        .ok_or_else(|| TransportError::Io("accel read out of order".into())),
                ),
                Channel::Gyro => Some(
                    inner
                        .pending
                        .take()
                        .map(|(_, gyro)| gyro)
                        .ok_or_else(|| TransportError::Io("gyro read out of order".into())),
                ),
            }
        };

        match result {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.drop_link();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_scripted_cycle() {
        let mut client = SimulatedGattClient::new();
        client.push_reads([ReadEvent::samples([1; 8], [2; 3], [3; 3])]);
        client.connect().await.unwrap();

        let config = BleConfig::default();
        assert_eq!(client.read(config.adc_uuid).await.unwrap(), encode_le(&[1; 8]));
        assert_eq!(client.read(config.accel_uuid).await.unwrap(), encode_le(&[2; 3]));
        assert_eq!(client.read(config.gyro_uuid).await.unwrap(), encode_le(&[3; 3]));
        assert_eq!(client.cycles_served(), 1);
    }

    #[tokio::test]
    async fn test_read_while_disconnected() {
        let mut client = SimulatedGattClient::new();
        let result = client.read(BleConfig::default().adc_uuid).await;
        assert!(matches!(result, Err(TransportError::Disconnected(_))));
    }
}
