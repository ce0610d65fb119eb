use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::ingestion::{IngestionLoop, LoopOptions, SessionShared};
use super::state::SessionState;
use crate::buffers::ChannelBuffers;
use crate::config::{SessionConfig, TransportConfig};
use crate::core::{AdcSample, AxisSample, Channel, SensorFrame};
use crate::error::{ConfigError, SessionError};
use crate::hal::{CloseHandle, ConnectionState, TransportSource, UdpTransport};
use crate::observability::SessionStats;
use crate::resilience::ReconnectPolicy;
use crate::storage::{FileSink, PersistenceSink};

/// Per-session settings independent of the concrete transport and sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub buffer_capacity: usize,
    pub record_sequence: bool,
    pub reconnect: ReconnectPolicy,
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            buffer_capacity: config.buffer_capacity,
            record_sequence: config.record_sequence,
            reconnect: config.reconnect,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

/// Build the transport described by a config
pub fn create_transport(config: &TransportConfig) -> Result<Box<dyn TransportSource>, ConfigError> {
    match config {
        TransportConfig::Udp(udp) => Ok(Box::new(UdpTransport::new(udp.clone()))),
        #[cfg(feature = "ble")]
        TransportConfig::Ble(ble) => {
            let client = crate::hal::BtleplugClient::new(ble.clone());
            Ok(Box::new(crate::hal::BleTransport::new(client, ble.clone())))
        }
        #[cfg(not(feature = "ble"))]
        TransportConfig::Ble(_) => Err(ConfigError::Invalid(
            "BLE transport requires the `ble` feature".into(),
        )),
    }
}

/// Start a session from a full config: builds the transport and opens the log
pub async fn start_session(config: SessionConfig) -> Result<Session, SessionError> {
    Session::start(config).await
}

/// Handle held by the UI collaborator for one ingestion session.
///
/// Every query is pull-based and returns immediately; none of them wait on
/// the transport.
pub struct Session {
    shared: Arc<SessionShared>,
    buffers: ChannelBuffers,
    connection: watch::Receiver<ConnectionState>,
    closer: CloseHandle,
    handle: Option<JoinHandle<SessionState>>,
}

impl Session {
    pub async fn start(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let transport = create_transport(&config.transport)?;
        let sink = FileSink::open(&config.log_path).await?;
        tracing::info!(log = %config.log_path.display(), "recording to log");
        Self::start_with(transport, Box::new(sink), SessionOptions::from(&config))
    }

    /// Start with caller-supplied collaborators (custom transports, in-memory sinks)
    pub fn start_with(
        transport: Box<dyn TransportSource>,
        sink: Box<dyn PersistenceSink>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let shared = Arc::new(SessionShared::new());
        let buffers = ChannelBuffers::new(options.buffer_capacity);
        let connection = transport.watch_state();
        let closer = transport.close_handle();

        shared.transition_to(SessionState::Running {
            start_time: Some(std::time::Instant::now()),
        })?;

        let ingestion = IngestionLoop::new(
            transport,
            sink,
            buffers.clone(),
            LoopOptions {
                record_sequence: options.record_sequence,
                reconnect: options.reconnect,
            },
            shared.clone(),
        );
        let handle = tokio::spawn(ingestion.run());

        Ok(Self {
            shared,
            buffers,
            connection,
            closer,
            handle: Some(handle),
        })
    }

    /// Request a cooperative stop and wait for the loop to exit.
    ///
    /// The in-flight read completes first; a blocked UDP read is released by
    /// closing the socket. Calling this again returns the same final state.
    pub async fn stop_session(&mut self) -> SessionState {
        self.shared.request_stop();
        self.closer.close();
        self.wait().await
    }

    /// Wait for the loop to exit on its own (failure or external close)
    pub async fn wait(&mut self) -> SessionState {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                let reason = SessionError::Join(e.to_string()).to_string();
                self.shared.set_last_error(reason.clone());
                let failed = SessionState::Failed {
                    reason,
                    total_frames: self.shared.metrics.frames_accepted(),
                };
                if let Err(e) = self.shared.transition_to(failed) {
                    tracing::warn!(error = %e, "could not record aborted session");
                }
            }
        }
        self.shared.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.borrow().clone()
    }

    /// Receiver that is notified on every connection state change
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.state().is_terminal()
    }

    /// Copy of one channel's recent samples, oldest first
    pub fn channel_snapshot(&self, channel: Channel) -> Vec<Vec<i16>> {
        self.buffers.snapshot(channel)
    }

    pub fn adc_snapshot(&self) -> Vec<AdcSample> {
        self.buffers.adc.snapshot()
    }

    pub fn accel_snapshot(&self) -> Vec<AxisSample> {
        self.buffers.accel.snapshot()
    }

    pub fn gyro_snapshot(&self) -> Vec<AxisSample> {
        self.buffers.gyro.snapshot()
    }

    pub fn latest_frame(&self) -> Option<SensorFrame> {
        self.shared.latest_frame()
    }

    /// Most recent error of any kind, including recovered ones
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error()
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.metrics.snapshot()
    }
}

/// Dropping a running session only signals the loop to stop; call
/// `stop_session()` to wait for it.
impl Drop for Session {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shared.request_stop();
            self.closer.close();
        }
    }
}
