//! UDP endpoint for OSC packets
//!
//! OSC packets map one-to-one onto UDP datagrams; the datagram boundary is
//! the only framing. The endpoint encodes and decodes through the core
//! codec, so callers only ever see typed [`OscPacket`] values.

use oscwire_core::{codec, OscPacket};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};

/// UDP configuration
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Receive channel capacity
    pub channel_capacity: usize,
    /// Maximum packet size
    pub max_packet_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            max_packet_size: 65507, // Max UDP payload
        }
    }
}

/// A bound UDP socket that speaks OSC
pub struct OscEndpoint {
    socket: Arc<UdpSocket>,
    config: UdpConfig,
}

impl OscEndpoint {
    /// Bind to a local address
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, UdpConfig::default()).await
    }

    /// Bind with config
    pub async fn bind_with_config(addr: &str, config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        info!("OSC endpoint bound to {}", socket.local_addr()?);

        Ok(Self {
            socket: Arc::new(socket),
            config,
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    /// Encode a packet and send it as one datagram
    pub async fn send_to(&self, packet: &OscPacket, target: SocketAddr) -> Result<()> {
        let bytes = codec::encode(packet)?;

        self.socket
            .send_to(&bytes, target)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        debug!("sent {} OSC bytes to {}", bytes.len(), target);
        Ok(())
    }

    /// Start receiving and decoding packets
    ///
    /// Datagrams that fail to decode are logged at debug level and dropped;
    /// the stream keeps running.
    pub fn start_receiver(&self) -> OscReceiver {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let socket = self.socket.clone();
        let max_size = self.config.max_packet_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; max_size];

            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, from)) => {
                        debug!("received {} bytes from {}", len, from);

                        match codec::decode(&buf[..len]) {
                            Ok(packet) => {
                                if tx.send((packet, from)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!("undecodable OSC datagram from {}: {}", from, e);
                            }
                        }
                    }
                    Err(e) => {
                        error!("receive error: {}", e);
                        break;
                    }
                }
            }
        });

        OscReceiver { rx }
    }
}

/// Stream of decoded packets with their source addresses
pub struct OscReceiver {
    rx: mpsc::Receiver<(OscPacket, SocketAddr)>,
}

impl OscReceiver {
    /// Receive the next decoded packet
    pub async fn recv(&mut self) -> Option<(OscPacket, SocketAddr)> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oscwire_core::{OscBundle, OscMessage, OscValue};

    #[tokio::test]
    async fn test_bind() {
        let endpoint = OscEndpoint::bind("127.0.0.1:0").await.unwrap();
        assert!(endpoint.local_addr().unwrap().port() > 0);
    }

    #[tokio::test]
    async fn test_send_recv_message() {
        let server = OscEndpoint::bind("127.0.0.1:0").await.unwrap();
        let client = OscEndpoint::bind("127.0.0.1:0").await.unwrap();

        let server_addr = server.local_addr().unwrap();
        let mut receiver = server.start_receiver();

        let sent = OscPacket::Message(OscMessage::new("/synth/freq").arg(440.0f32));
        client.send_to(&sent, server_addr).await.unwrap();

        let (received, from) = receiver.recv().await.unwrap();
        assert_eq!(received, sent);
        assert_eq!(from.port(), client.local_addr().unwrap().port());
    }

    #[tokio::test]
    async fn test_send_recv_bundle() {
        let server = OscEndpoint::bind("127.0.0.1:0").await.unwrap();
        let client = OscEndpoint::bind("127.0.0.1:0").await.unwrap();

        let server_addr = server.local_addr().unwrap();
        let mut receiver = server.start_receiver();

        let sent = OscPacket::Bundle(OscBundle::immediate(vec![
            OscPacket::Message(OscMessage::new("/a")),
            OscPacket::Message(OscMessage::new("/b").arg(OscValue::Int32(1))),
        ]));
        client.send_to(&sent, server_addr).await.unwrap();

        let (received, _) = receiver.recv().await.unwrap();
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn test_undecodable_datagram_is_skipped() {
        let server = OscEndpoint::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        let mut receiver = server.start_receiver();

        // Raw socket sends an empty datagram the codec rejects
        let raw = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        raw.send_to(&[], server_addr).await.unwrap();

        let client = OscEndpoint::bind("127.0.0.1:0").await.unwrap();
        let sent = OscPacket::Message(OscMessage::new("/after/garbage"));
        client.send_to(&sent, server_addr).await.unwrap();

        // Only the decodable packet comes through
        let (received, _) = receiver.recv().await.unwrap();
        assert_eq!(received, sent);
    }
}
