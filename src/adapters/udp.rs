//! UDP broadcast transport.
//!
//! Implements [`DatagramPort`] over a std `UdpSocket` bound to an
//! ephemeral port with `SO_BROADCAST` set.  ESP-IDF provides the same
//! std socket API on top of lwIP, so one implementation serves both the
//! device and the host.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use log::{info, warn};

use crate::app::ports::DatagramPort;
use crate::error::TransportError;

pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind `0.0.0.0:0` and enable broadcast.
    pub fn bind() -> Result<Self, TransportError> {
        Self::bind_to(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
    }

    pub fn bind_to(local: SocketAddrV4) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(local).map_err(|e| {
            warn!("udp: bind {} failed: {}", local, e);
            TransportError::SocketSetup
        })?;
        socket.set_broadcast(true).map_err(|e| {
            warn!("udp: SO_BROADCAST failed: {}", e);
            TransportError::SocketSetup
        })?;
        if let Ok(addr) = socket.local_addr() {
            info!("udp: bound {}", addr);
        }
        Ok(Self { socket })
    }
}

impl DatagramPort for UdpTransport {
    fn send_to(
        &mut self,
        payload: &[u8],
        destination: SocketAddrV4,
    ) -> Result<usize, TransportError> {
        self.socket.send_to(payload, destination).map_err(|e| {
            warn!("udp: send to {} failed: {}", destination, e);
            TransportError::SendFailed
        })
    }
}
