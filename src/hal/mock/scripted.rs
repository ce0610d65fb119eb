use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{FrameLayout, RawFrame};
use crate::error::{TransportError, TransportResult};
use crate::hal::{CloseHandle, ConnectionState, StateCell, TransportSource};

#[derive(Default)]
struct Script {
    connects: VecDeque<TransportResult<()>>,
    reads: VecDeque<TransportResult<RawFrame>>,
    connect_attempts: usize,
    reads_served: usize,
}

/// Transport that replays queued connect and read outcomes.
///
/// Once the read queue is empty, `read_next` blocks until the source is
/// closed, like an idle UDP listener.
pub struct ScriptedTransport {
    layout: FrameLayout,
    script: Arc<Mutex<Script>>,
    status: StateCell,
    closer: CloseHandle,
}

/// Test-side handle onto a `ScriptedTransport`
#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedTransport {
    pub fn new(layout: FrameLayout) -> (Self, ScriptHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        let transport = Self {
            layout,
            script: script.clone(),
            status: StateCell::new(),
            closer: CloseHandle::new(),
        };
        (transport, ScriptHandle { script })
    }
}

impl ScriptHandle {
    pub fn push_connect(&self, outcome: TransportResult<()>) {
        lock(&self.script).connects.push_back(outcome);
    }

    pub fn push_read(&self, outcome: TransportResult<RawFrame>) {
        lock(&self.script).reads.push_back(outcome);
    }

    pub fn push_datagram(&self, text: &str) {
        self.push_read(Ok(RawFrame::Datagram(text.as_bytes().to_vec())));
    }

    pub fn connect_attempts(&self) -> usize {
        lock(&self.script).connect_attempts
    }

    pub fn reads_served(&self) -> usize {
        lock(&self.script).reads_served
    }

    pub fn pending_reads(&self) -> usize {
        lock(&self.script).reads.len()
    }
}

#[async_trait]
impl TransportSource for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn layout(&self) -> FrameLayout {
        self.layout
    }

    async fn connect(&mut self) -> TransportResult<()> {
        if self.closer.is_closed() {
            return Err(TransportError::Closed);
        }
        let outcome = {
            let mut script = lock(&self.script);
            script.connect_attempts += 1;
            script.connects.pop_front().unwrap_or(Ok(()))
        };

        match &outcome {
            Ok(()) => self.status.set(ConnectionState::Connected),
            Err(_) => {
                if self.status.get() != ConnectionState::Reconnecting {
                    self.status.set(ConnectionState::Connecting);
                }
            }
        }
        outcome
    }

    async fn read_next(&mut self) -> TransportResult<RawFrame> {
        if self.closer.is_closed() {
            return Err(TransportError::Closed);
        }
        let next = {
            let mut script = lock(&self.script);
            let next = script.reads.pop_front();
            if next.is_some() {
                script.reads_served += 1;
            }
            next
        };

        match next {
            Some(Err(e)) => {
                if e.is_recoverable() {
                    self.status.set(ConnectionState::Reconnecting);
                }
                Err(e)
            }
            Some(frame) => frame,
            None => {
                self.closer.closed().await;
                Err(TransportError::Closed)
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.closer.close();
        self.status.set(ConnectionState::Disconnected);
        Ok(())
    }

    fn status(&self) -> &StateCell {
        &self.status
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}
