//! UDP OSC sender
//!
//! Sends are non-blocking so they can run inside the synchronous sample
//! callback of the reader. A datagram that cannot be sent right away is
//! dropped and logged; nothing is buffered.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use super::config::OscConfig;
use super::encoder::{OscEncoder, OscMessage};

/// OSC client over UDP
pub struct OscSender {
    socket: UdpSocket,
    target: SocketAddr,
    encoder: OscEncoder,
}

impl OscSender {
    /// Bind the local socket
    pub async fn bind(config: &OscConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        // try_send_to reports WouldBlock until the reactor saw the socket writable
        socket.writable().await?;
        tracing::info!(
            local = %socket.local_addr()?,
            target = %config.target,
            "OSC sender ready"
        );

        Ok(Self {
            socket,
            target: config.target,
            encoder: OscEncoder::new(),
        })
    }

    /// Destination of every message
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Encode and send one message, returning the datagram size
    pub fn send(&mut self, message: &OscMessage) -> io::Result<usize> {
        self.encoder.encode(message);
        let packet = self.encoder.finish();
        self.socket.try_send_to(&packet, self.target)
    }

    /// Send one message, logging instead of returning failures
    pub fn forward(&mut self, message: &OscMessage) {
        match self.send(message) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                tracing::debug!(address = %message.address, "Socket busy, message dropped");
            }
            Err(e) => {
                tracing::warn!(
                    address = %message.address,
                    error = %e,
                    "Failed to send OSC message"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use tokio_test::assert_ok;

    use super::*;
    use crate::osc::OscArg;

    #[tokio::test]
    async fn test_send_reaches_target() {
        let receiver = assert_ok!(UdpSocket::bind("127.0.0.1:0").await);
        let target = assert_ok!(receiver.local_addr());

        let config = OscConfig::default()
            .bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .target(target);
        let mut sender = assert_ok!(OscSender::bind(&config).await);
        assert_eq!(sender.target(), target);

        let message = OscMessage::new("/EEG/A", vec![OscArg::Float(1.5)]);
        let sent = assert_ok!(sender.send(&message));

        let mut buf = [0u8; 64];
        let (len, _) = assert_ok!(receiver.recv_from(&mut buf).await);
        assert_eq!(len, sent);
        assert_eq!(&buf[..len], message.encode().as_ref());
    }

    #[tokio::test]
    async fn test_first_messages_after_bind_are_sent() {
        let receiver = assert_ok!(UdpSocket::bind("127.0.0.1:0").await);
        let target = assert_ok!(receiver.local_addr());

        let config = OscConfig::default()
            .bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .target(target);
        let mut sender = assert_ok!(OscSender::bind(&config).await);

        for i in 0..3 {
            sender.forward(&OscMessage::new("/n", vec![OscArg::Int(i)]));
        }

        let mut buf = [0u8; 64];
        for i in 0..3 {
            let (len, _) = assert_ok!(receiver.recv_from(&mut buf).await);
            let expected = OscMessage::new("/n", vec![OscArg::Int(i)]).encode();
            assert_eq!(&buf[..len], expected.as_ref());
        }
    }

    #[tokio::test]
    async fn test_forward_without_listener_does_not_fail() {
        let config = OscConfig::default()
            .bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .target(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9));
        let mut sender = assert_ok!(OscSender::bind(&config).await);

        for _ in 0..3 {
            sender.forward(&OscMessage::new("/x", vec![]));
        }
    }
}
