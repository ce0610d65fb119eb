use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use super::state::{CloseHandle, ConnectionState, StateCell};
use crate::core::{FrameLayout, RawFrame};
use crate::error::{TransportError, TransportResult};
use crate::resilience::ReconnectPolicy;

/// Source of raw sensor frames (BLE poll or UDP listen)
#[async_trait]
pub trait TransportSource: Send + Sync {
    /// Short identifier used in logs (e.g., "udp", "ble")
    fn name(&self) -> &str;

    /// Wire encoding of the frames this source produces
    fn layout(&self) -> FrameLayout;

    /// Establish the link (connect for BLE, bind for UDP)
    async fn connect(&mut self) -> TransportResult<()>;

    /// Block until the next raw frame is available
    async fn read_next(&mut self) -> TransportResult<RawFrame>;

    /// Release the link. Pending and future reads fail with `Closed`.
    async fn close(&mut self) -> TransportResult<()>;

    /// Publisher for this source's connection state
    fn status(&self) -> &StateCell;

    /// Handle that closes this source from another task
    fn close_handle(&self) -> CloseHandle;

    fn current_state(&self) -> ConnectionState {
        self.status().get()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.status().subscribe()
    }

    /// Connect under a fixed-delay retry budget.
    ///
    /// The first attempt runs immediately. Errors that retrying cannot fix
    /// (e.g. `Bind`) are returned as-is without further attempts. On
    /// exhaustion the state becomes `Failed` and `ReconnectExhausted` is
    /// returned.
    async fn connect_with_policy(&mut self, policy: &ReconnectPolicy) -> TransportResult<()> {
        let closer = self.close_handle();
        let mut last = String::from("no attempt made");
        let mut attempt = 1;

        while let Some(delay) = policy.delay_before(attempt) {
            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = closer.closed() => return Err(TransportError::Closed),
                }
            }
            if closer.is_closed() {
                return Err(TransportError::Closed);
            }

            match self.connect().await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(transport = self.name(), attempt, "reconnected");
                    }
                    return Ok(());
                }
                Err(TransportError::Closed) => return Err(TransportError::Closed),
                Err(e) if !e.is_recoverable() => {
                    tracing::error!(transport = self.name(), error = %e, "connect failed");
                    self.status().set(ConnectionState::Failed(e.to_string()));
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(transport = self.name(), attempt, error = %e, "connect attempt failed");
                    last = e.to_string();
                }
            }
            attempt += 1;
        }

        let err = TransportError::ReconnectExhausted {
            attempts: attempt - 1,
            last,
        };
        self.status().set(ConnectionState::Failed(err.to_string()));
        Err(err)
    }
}

/// Minimal GATT client capability needed by the BLE poller
#[async_trait]
pub trait GattClient: Send + Sync {
    /// Connect to the peripheral (timeouts are applied by the caller)
    async fn connect(&mut self) -> TransportResult<()>;

    async fn is_connected(&self) -> bool;

    /// Read one characteristic value
    async fn read(&mut self, characteristic: Uuid) -> TransportResult<Vec<u8>>;

    async fn disconnect(&mut self) -> TransportResult<()>;
}
