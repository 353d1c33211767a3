//! Socket.IO (Engine.IO v4) client over a plain websocket, enough to join
//! the default namespace and receive named events.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{Event, PushChannel, PushError, Subscription};

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO handshake.
    Open,
    Close,
    Ping,
    /// Namespace joined.
    Connected,
    Disconnected,
    Event { name: String, data: Value },
    Other,
}

pub fn decode_packet(raw: &str) -> Packet {
    match raw.as_bytes().first() {
        Some(b'0') => Packet::Open,
        Some(b'1') => Packet::Close,
        Some(b'2') => Packet::Ping,
        Some(b'4') => decode_message(&raw[1..]),
        _ => Packet::Other,
    }
}

fn decode_message(raw: &str) -> Packet {
    match raw.as_bytes().first() {
        Some(b'0') => Packet::Connected,
        Some(b'1') => Packet::Disconnected,
        Some(b'2') => decode_event(&raw[1..]),
        _ => Packet::Other,
    }
}

fn decode_event(raw: &str) -> Packet {
    // optional ack id precedes the payload
    let body = raw.trim_start_matches(|c: char| c.is_ascii_digit());

    let mut items = match serde_json::from_str::<Vec<Value>>(body) {
        Ok(v) => v.into_iter(),
        Err(_) => return Packet::Other,
    };

    match items.next() {
        Some(Value::String(name)) => Packet::Event {
            name,
            data: items.next().unwrap_or(Value::Null),
        },
        _ => Packet::Other,
    }
}

pub struct SocketIoChannel {
    endpoint: Url,
}

impl SocketIoChannel {
    pub fn new(origin: &str) -> Result<Self, PushError> {
        let mut endpoint = Url::parse(origin).map_err(|e| PushError::Connect(e.to_string()))?;

        let scheme = match endpoint.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        endpoint
            .set_scheme(scheme)
            .map_err(|_| PushError::Connect(format!("unsupported origin: {}", origin)))?;
        endpoint.set_path("/socket.io/");
        endpoint.set_query(Some("EIO=4&transport=websocket"));

        Ok(Self { endpoint })
    }

    pub fn endpoint(&self) -> &str { self.endpoint.as_str() }
}

/// First wait before reconnecting; doubled per failed attempt.
const RETRY_BASE: Duration = Duration::from_millis(500);
const RETRY_MAX: Duration = Duration::from_secs(30);

pub fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE
        .checked_mul(1 << attempt.min(16))
        .map_or(RETRY_MAX, |d| d.min(RETRY_MAX))
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    /// Transport closed or failed; worth reconnecting.
    Lost,
    /// The server closed the session on purpose.
    Kicked,
    /// Nobody reads the events anymore.
    Released,
}

async fn serve(ws: Socket, channel: &str, tx: &UnboundedSender<Event>) -> Ending {
    let (mut outgoing, mut incoming) = ws.split();

    let ending = loop {
        let text = match incoming.next().await {
            Some(Ok(Message::Text(t))) => t,
            Some(Ok(Message::Close(_))) | None => break Ending::Lost,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "push connection failed");
                break Ending::Lost;
            },
        };

        let reply = match decode_packet(&text) {
            Packet::Open => Some("40"),
            Packet::Ping => Some("3"),
            Packet::Event { name, data } if name == channel => {
                let event = Event {
                    channel: name,
                    payload: data,
                };
                if tx.send(event).is_err() {
                    break Ending::Released;
                }
                None
            },
            Packet::Close | Packet::Disconnected => break Ending::Kicked,
            p => {
                tracing::trace!(packet = ?p, "ignored");
                None
            },
        };

        if let Some(r) = reply {
            if let Err(e) = outgoing.send(Message::Text(r.to_string())).await {
                tracing::warn!(error = %e, "cannot answer push server");
                break Ending::Lost;
            }
        }
    };

    let _ = outgoing.close().await;
    ending
}

#[async_trait]
impl PushChannel for SocketIoChannel {
    /// The first connection is made before returning; later drops are
    /// reconnected with backoff until the server ends the session or the
    /// subscription is released.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, PushError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| PushError::Connect(e.to_string()))?;

        let (tx, rx) = unbounded_channel();
        let channel = channel.to_string();
        let endpoint = self.endpoint.clone();

        let connection = tokio::spawn(async move {
            let mut ws = Some(ws);
            let mut attempt = 0;

            loop {
                let socket = match ws.take() {
                    Some(s) => s,
                    None => {
                        tokio::time::sleep(retry_delay(attempt)).await;
                        attempt += 1;

                        if tx.is_closed() {
                            break;
                        }

                        match tokio_tungstenite::connect_async(endpoint.as_str()).await {
                            Ok((s, _)) => s,
                            Err(e) => {
                                tracing::debug!(attempt, error = %e, "push reconnect failed");
                                continue;
                            },
                        }
                    },
                };
                attempt = 0;

                match serve(socket, &channel, &tx).await {
                    Ending::Lost => tracing::info!(%channel, "push connection lost, reconnecting"),
                    e => {
                        tracing::debug!(ending = ?e, "push connection closed");
                        break;
                    },
                }
            }
        });

        Ok(Subscription::new(rx, connection))
    }
}
