use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

use super::state::{CloseHandle, ConnectionState, StateCell};
use super::traits::TransportSource;
use crate::config::UdpConfig;
use crate::core::{FrameLayout, RawFrame};
use crate::error::{TransportError, TransportResult};

/// Listens for comma-delimited datagrams on a bound UDP socket.
///
/// There is no connect phase on the wire: `Connected` means the socket is
/// bound and receiving. Reads have no timeout; closing the source through
/// its `CloseHandle` unblocks a pending read with `Closed`.
pub struct UdpTransport {
    config: UdpConfig,
    socket: Option<UdpSocket>,
    buffer: Vec<u8>,
    status: StateCell,
    closer: CloseHandle,
}

impl UdpTransport {
    pub fn new(config: UdpConfig) -> Self {
        let buffer = vec![0u8; config.buffer_size.max(1)];
        Self {
            config,
            socket: None,
            buffer,
            status: StateCell::new(),
            closer: CloseHandle::new(),
        }
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

#[async_trait]
impl TransportSource for UdpTransport {
    fn name(&self) -> &str {
        "udp"
    }

    fn layout(&self) -> FrameLayout {
        FrameLayout::Text
    }

    async fn connect(&mut self) -> TransportResult<()> {
        if self.closer.is_closed() {
            return Err(TransportError::Closed);
        }
        if self.socket.is_some() {
            self.status.set(ConnectionState::Connected);
            return Ok(());
        }

        self.status.set(ConnectionState::Connecting);
        let socket = UdpSocket::bind(&self.config.bind_addr)
            .await
            .map_err(|e| TransportError::Bind {
                addr: self.config.bind_addr.clone(),
                detail: e.to_string(),
            })?;

        tracing::info!(addr = ?socket.local_addr().ok(), "listening for UDP datagrams");
        self.socket = Some(socket);
        self.status.set(ConnectionState::Connected);
        Ok(())
    }

    async fn read_next(&mut self) -> TransportResult<RawFrame> {
        if self.closer.is_closed() {
            return Err(TransportError::Closed);
        }
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| TransportError::Disconnected("socket not bound".into()))?;

        let received = tokio::select! {
            result = socket.recv_from(&mut self.buffer) => result,
            _ = self.closer.closed() => return Err(TransportError::Closed),
        };

        match received {
            Ok((len, peer)) => {
                tracing::trace!(%peer, len, "datagram received");
                Ok(RawFrame::Datagram(self.buffer[..len].to_vec()))
            }
            Err(e) => {
                // Drop the socket so the reconnect policy rebinds it
                self.socket = None;
                self.status.set(ConnectionState::Reconnecting);
                Err(TransportError::Io(e.to_string()))
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.closer.close();
        if self.socket.take().is_some() {
            tracing::info!("UDP listener closed");
        }
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
