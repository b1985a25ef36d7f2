use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::trace;

use super::{DatagramSink, Endpoint};
use crate::error::TransmitError;

/// Connectionless sender. Every call resolves the host, binds a fresh
/// ephemeral socket, sends one datagram and releases the socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpSink;

impl UdpSink{
    pub fn new() -> Self{
        UdpSink
    }

    fn resolve(endpoint: &Endpoint) -> Result<SocketAddr, TransmitError>{
        let mut addrs = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|source| TransmitError::Resolve{ host: endpoint.host.clone(), source })?;
        addrs.next().ok_or_else(|| TransmitError::NoAddress(endpoint.host.clone()))
    }
}

impl DatagramSink for UdpSink{
    fn send(&self, endpoint: &Endpoint, payload: &[u8]) -> Result<(), TransmitError>{
        let target = Self::resolve(endpoint)?;
        let bind_addr = match target{
            SocketAddr::V4(_) => "0.0.0.0:0",
            SocketAddr::V6(_) => "[::]:0",
        };

        let socket = UdpSocket::bind(bind_addr)?;
        socket.send_to(payload, target)?;
        trace!(%target, bytes = payload.len(), "datagram sent");
        Ok(())
    }
}
