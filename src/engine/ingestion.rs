use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::buffers::ChannelBuffers;
use crate::core::{decode, RawFrame, SensorFrame};
use crate::engine::state::SessionState;
use crate::error::{SessionError, TransportError};
use crate::hal::{ConnectionState, TransportSource};
use crate::observability::SessionMetrics;
use crate::resilience::ReconnectPolicy;
use crate::storage::{PersistedRecord, PersistenceSink};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State shared between the ingestion task and its session handle.
///
/// Every lock here guards a plain value and is never held across an await.
pub struct SessionShared {
    state: Mutex<SessionState>,
    last_error: Mutex<Option<String>>,
    latest: Mutex<Option<SensorFrame>>,
    stop_requested: AtomicBool,
    pub metrics: SessionMetrics,
}

impl SessionShared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            last_error: Mutex::new(None),
            latest: Mutex::new(None),
            stop_requested: AtomicBool::new(false),
            metrics: SessionMetrics::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// Transition to a new state with validation
    pub fn transition_to(&self, new_state: SessionState) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        if !state.can_transition_to(&new_state) {
            return Err(SessionError::InvalidTransition {
                from: state.name().to_string(),
                to: new_state.name().to_string(),
            });
        }
        tracing::debug!(from = state.name(), to = new_state.name(), "session state changed");
        *state = new_state;
        Ok(())
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn set_last_error(&self, error: impl Into<String>) {
        *lock(&self.last_error) = Some(error.into());
    }

    pub fn latest_frame(&self) -> Option<SensorFrame> {
        *lock(&self.latest)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

impl Default for SessionShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings the loop needs beyond its collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    pub record_sequence: bool,
    pub reconnect: ReconnectPolicy,
}

/// How one read cycle ended
enum Cycle {
    Continue,
    Finish(SessionState),
}

/// Read → decode → buffer → persist, until stopped or the transport fails.
///
/// Owns the transport and the sink for the whole session. Frames are
/// handled strictly in the order the transport returns them.
pub struct IngestionLoop {
    transport: Box<dyn TransportSource>,
    sink: Box<dyn PersistenceSink>,
    buffers: ChannelBuffers,
    options: LoopOptions,
    shared: Arc<SessionShared>,
    /// Read cycles that failed since the last frame arrived
    failed_cycles: usize,
}

impl IngestionLoop {
    pub fn new(
        transport: Box<dyn TransportSource>,
        sink: Box<dyn PersistenceSink>,
        buffers: ChannelBuffers,
        options: LoopOptions,
        shared: Arc<SessionShared>,
    ) -> Self {
        Self {
            transport,
            sink,
            buffers,
            options,
            shared,
            failed_cycles: 0,
        }
    }

    /// Run to completion and return the final session state
    pub async fn run(mut self) -> SessionState {
        let transport = self.transport.name().to_string();
        tracing::info!(%transport, "ingestion started");

        let mut outcome = match self.transport.connect_with_policy(&self.options.reconnect).await {
            Ok(()) => None,
            Err(e) => Some(self.on_transport_failure(e)),
        };

        while outcome.is_none() {
            if self.shared.stop_requested() {
                outcome = Some(self.stopped());
                break;
            }

            let cycle = match self.transport.read_next().await {
                Ok(raw) => {
                    self.failed_cycles = 0;
                    self.ingest(raw).await;
                    Cycle::Continue
                }
                Err(e) => self.recover(e).await,
            };

            if let Cycle::Finish(state) = cycle {
                outcome = Some(state);
            }
        }

        let final_state = outcome.unwrap_or_else(|| self.stopped());
        self.shutdown(&final_state).await;

        if let Err(e) = self.shared.transition_to(final_state.clone()) {
            tracing::warn!(error = %e, "could not record final session state");
        }
        match &final_state {
            SessionState::Failed { reason, .. } => {
                tracing::error!(%transport, %reason, "ingestion failed")
            }
            _ => tracing::info!(%transport, stats = %self.shared.metrics.snapshot().summary(), "ingestion stopped"),
        }
        final_state
    }

    /// Decode one raw frame and store it. Decode and write errors skip only this frame.
    async fn ingest(&mut self, raw: RawFrame) {
        let frame = match decode(&raw, self.transport.layout()) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed frame");
                self.shared.metrics.record_decode_error();
                self.shared.set_last_error(format!("decode: {}", e));
                return;
            }
        };

        self.buffers.push_frame(&frame);
        *lock(&self.shared.latest) = Some(frame);
        self.shared.metrics.record_frame_accepted();

        let record = PersistedRecord::from_frame(&frame, self.options.record_sequence);
        if let Err(e) = self.sink.append(&record).await {
            tracing::warn!(error = %e, sequence = frame.sequence, "failed to persist frame");
            self.shared.metrics.record_persist_error();
            self.shared.set_last_error(format!("persist: {}", e));
        }
    }

    async fn recover(&mut self, error: TransportError) -> Cycle {
        if !error.is_recoverable() {
            return Cycle::Finish(self.on_transport_failure(error));
        }

        self.shared.set_last_error(error.to_string());
        self.failed_cycles += 1;
        if self.failed_cycles > self.options.reconnect.max_attempts {
            let exhausted = TransportError::ReconnectExhausted {
                attempts: self.failed_cycles - 1,
                last: error.to_string(),
            };
            return Cycle::Finish(self.on_transport_failure(exhausted));
        }

        tracing::warn!(error = %error, failed_cycles = self.failed_cycles, "transport error, reconnecting");
        self.shared.metrics.record_reconnect();

        match self.transport.connect_with_policy(&self.options.reconnect).await {
            Ok(()) => Cycle::Continue,
            Err(e) => Cycle::Finish(self.on_transport_failure(e)),
        }
    }

    fn on_transport_failure(&self, error: TransportError) -> SessionState {
        if error == TransportError::Closed {
            return self.stopped();
        }
        let reason = error.to_string();
        self.shared.set_last_error(reason.clone());
        SessionState::Failed {
            reason,
            total_frames: self.shared.metrics.frames_accepted(),
        }
    }

    fn stopped(&self) -> SessionState {
        SessionState::Stopped {
            total_frames: self.shared.metrics.frames_accepted(),
        }
    }

    async fn shutdown(&mut self, final_state: &SessionState) {
        if let Err(e) = self.transport.close().await {
            tracing::warn!(error = %e, "error closing transport");
        }
        if let Err(e) = self.sink.close().await {
            tracing::warn!(error = %e, "error closing log");
        }
        if let SessionState::Failed { reason, .. } = final_state {
            self.transport
                .status()
                .set(ConnectionState::Failed(reason.clone()));
        }
    }
}
