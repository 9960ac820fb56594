//! OSC over TCP transport to the console
//!
//! Holds the single TCP connection (Closed → Open, re-entrant through
//! close+open on endpoint change), frames outbound packets with the OSC 1.0
//! 4-byte big-endian length prefix, and feeds decoded inbound packets plus
//! close/error notifications into a channel consumed by the translation loop.
//! Sends are fire-and-forget: a failed write surfaces only through the
//! transport's own error event.

use crate::error::{Error, Result};
use crate::events::{EventBus, LogCategory, UiEvent};
use rosc::{OscMessage, OscPacket};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Upper bound on one framed packet; anything larger is a corrupt stream.
const MAX_FRAME_LEN: u32 = 64 * 1024;

/// Transport notification delivered to the translation loop
#[derive(Debug)]
pub enum OscEvent {
    /// Decoded inbound message
    Message(OscMessage),
    /// Peer closed the connection
    Closed,
    /// Socket failure; the receiver applies the hard fallback
    Error(String),
}

struct Connection {
    write: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

/// TCP connection owner for the console's OSC endpoint.
pub struct OscTransport {
    conn: Option<Connection>,
    event_tx: mpsc::Sender<OscEvent>,
    events: EventBus,
}

impl OscTransport {
    pub fn new(event_tx: mpsc::Sender<OscEvent>, events: EventBus) -> Self {
        Self {
            conn: None,
            event_tx,
            events,
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Establish the connection, closing any previous one first. When
    /// `announce_fader_count` is set (output enabled), the bank-size
    /// configuration message is sent as soon as the connection is ready.
    pub async fn open(
        &mut self,
        address: &str,
        port: u16,
        announce_fader_count: Option<usize>,
    ) -> Result<()> {
        self.close().await;

        let stream = TcpStream::connect((address, port))
            .await
            .map_err(|e| Error::Transport(format!("connect to {address}:{port} failed: {e}")))?;
        let (read, write) = stream.into_split();

        let reader = tokio::spawn(read_loop(read, self.event_tx.clone()));
        self.conn = Some(Connection { write, reader });

        self.events.emit(UiEvent::OscConnection(true));
        self.events.log(
            LogCategory::Tcp,
            format!("OSC TCP connected to {address}:{port}"),
        );

        if let Some(count) = announce_fader_count {
            self.send(OscMessage {
                addr: super::address::bank_config_address(count),
                args: vec![],
            })
            .await;
        }
        Ok(())
    }

    /// Close the connection if open and broadcast the disconnection.
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.reader.abort();
            let mut write = conn.write;
            let _ = write.shutdown().await;
            self.events.emit(UiEvent::OscConnection(false));
            self.events
                .log(LogCategory::Tcp, "OSC TCP connection closed");
        }
    }

    /// Fire-and-forget send. Failures are reported through the event channel,
    /// not to the caller; sending while closed is silently dropped.
    pub async fn send(&mut self, msg: OscMessage) {
        let Some(conn) = self.conn.as_mut() else {
            debug!("OSC send while closed, dropped: {}", msg.addr);
            return;
        };
        match encode_frame(&msg) {
            Ok(frame) => {
                debug!("OSC out: {} {:?}", msg.addr, msg.args);
                if let Err(e) = conn.write.write_all(&frame).await {
                    let _ = self
                        .event_tx
                        .try_send(OscEvent::Error(format!("send failed: {e}")));
                }
            }
            Err(e) => warn!("Failed to encode OSC message {}: {e}", msg.addr),
        }
    }
}

/// Encode one message with the OSC 1.0 packet-length prefix.
fn encode_frame(msg: &OscMessage) -> Result<Vec<u8>> {
    let payload = rosc::encoder::encode(&OscPacket::Message(msg.clone()))
        .map_err(|e| Error::Transport(format!("encode failed: {e:?}")))?;
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Read length-prefixed packets until the stream ends, forwarding every
/// decoded message (bundles are flattened) into the event channel.
async fn read_loop(mut read: OwnedReadHalf, event_tx: mpsc::Sender<OscEvent>) {
    loop {
        let mut len_buf = [0u8; 4];
        if let Err(e) = read.read_exact(&mut len_buf).await {
            let event = if e.kind() == std::io::ErrorKind::UnexpectedEof {
                OscEvent::Closed
            } else {
                OscEvent::Error(e.to_string())
            };
            let _ = event_tx.send(event).await;
            return;
        }
        let len = u32::from_be_bytes(len_buf);
        if len == 0 || len > MAX_FRAME_LEN {
            let _ = event_tx
                .send(OscEvent::Error(format!("invalid frame length {len}")))
                .await;
            return;
        }

        let mut payload = vec![0u8; len as usize];
        if let Err(e) = read.read_exact(&mut payload).await {
            let _ = event_tx.send(OscEvent::Error(e.to_string())).await;
            return;
        }

        match rosc::decoder::decode_udp(&payload) {
            Ok((_, packet)) => deliver(packet, &event_tx).await,
            // A single undecodable packet is skipped, not fatal
            Err(e) => warn!("Failed to decode OSC packet: {e:?}"),
        }
    }
}

async fn deliver(packet: OscPacket, event_tx: &mpsc::Sender<OscEvent>) {
    let mut queue = std::collections::VecDeque::from([packet]);
    while let Some(packet) = queue.pop_front() {
        match packet {
            OscPacket::Message(msg) => {
                let _ = event_tx.send(OscEvent::Message(msg)).await;
            }
            OscPacket::Bundle(bundle) => {
                // Preserve in-bundle ordering ahead of anything queued later
                for (i, inner) in bundle.content.into_iter().enumerate() {
                    queue.insert(i, inner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::OscType;
    use tokio::net::TcpListener;

    #[test]
    fn test_frame_round_trip() {
        let msg = OscMessage {
            addr: "/eos/user/0/sub/3".to_string(),
            args: vec![OscType::Float(0.5)],
        };
        let frame = encode_frame(&msg).unwrap();

        let len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
        assert_eq!(len, frame.len() - 4);

        let (_, packet) = rosc::decoder::decode_udp(&frame[4..]).unwrap();
        match packet {
            OscPacket::Message(decoded) => assert_eq!(decoded, msg),
            other => panic!("unexpected packet: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_announces_bank_size() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (event_tx, _event_rx) = mpsc::channel(8);
        let mut transport = OscTransport::new(event_tx, EventBus::new());
        transport
            .open("127.0.0.1", port, Some(5))
            .await
            .unwrap();
        assert!(transport.is_open());

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut len_buf = [0u8; 4];
        socket.read_exact(&mut len_buf).await.unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        socket.read_exact(&mut payload).await.unwrap();

        let (_, packet) = rosc::decoder::decode_udp(&payload).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/eos/fader/1/config/5");
                assert!(msg.args.is_empty());
            }
            other => panic!("unexpected packet: {other:?}"),
        }

        transport.close().await;
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_inbound_message_and_close_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (event_tx, mut event_rx) = mpsc::channel(8);
        let mut transport = OscTransport::new(event_tx, EventBus::new());
        transport.open("127.0.0.1", port, None).await.unwrap();

        let (mut socket, _) = listener.accept().await.unwrap();
        let msg = OscMessage {
            addr: "/eos/fader/1/2".to_string(),
            args: vec![OscType::Float(0.25)],
        };
        socket.write_all(&encode_frame(&msg).unwrap()).await.unwrap();

        match event_rx.recv().await.unwrap() {
            OscEvent::Message(received) => assert_eq!(received, msg),
            other => panic!("unexpected event: {other:?}"),
        }

        drop(socket);
        match event_rx.recv().await.unwrap() {
            OscEvent::Closed => {}
            other => panic!("unexpected event: {other:?}"),
        }

        transport.close().await;
    }
}
