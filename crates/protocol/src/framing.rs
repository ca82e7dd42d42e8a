//! Packet codec for the socket.io text framing spoken by the wallet.
//!
//! # Frame Format
//!
//! Every WebSocket text frame carries exactly one engine.io packet. The
//! first byte selects the packet type:
//!
//! - `0` + JSON: open handshake with session parameters
//! - `1`: close notification
//! - `2` + data: ping probe
//! - `3` + data: pong answer
//! - `4` + message: socket.io message
//!
//! A message packet nests a second type byte:
//!
//! - `40`: namespace connect acknowledgement
//! - `41`: namespace disconnect
//! - `42` + JSON array: event, encoded as `["name", payload]`
//!
//! Binary frames are never valid on this channel.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine.io type byte opening a session with handshake parameters.
pub const ENGINE_OPEN: char = '0';

/// Engine.io type byte closing the session.
pub const ENGINE_CLOSE: char = '1';

/// Engine.io type byte for a ping probe.
pub const ENGINE_PING: char = '2';

/// Engine.io type byte for a pong answer.
pub const ENGINE_PONG: char = '3';

/// Engine.io type byte wrapping a socket.io message.
pub const ENGINE_MESSAGE: char = '4';

/// Socket.io type byte acknowledging the namespace connect.
pub const SOCKET_CONNECT: char = '0';

/// Socket.io type byte signalling a namespace disconnect.
pub const SOCKET_DISCONNECT: char = '1';

/// Socket.io type byte carrying an application event.
pub const SOCKET_EVENT: char = '2';

/// Session parameters delivered with the open packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Server-assigned session identifier.
    pub sid: String,
    /// Transport upgrades offered by the server.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between client pings, in milliseconds.
    #[serde(rename = "pingInterval")]
    pub ping_interval: u64,
    /// Grace period for a pong answer, in milliseconds.
    #[serde(rename = "pingTimeout")]
    pub ping_timeout: u64,
}

/// A single decoded wire packet, control or application level.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Server handshake opening the session.
    Open(Handshake),
    /// Session close notification.
    Close,
    /// Keepalive probe; the peer answers with a pong echoing the data.
    Ping(String),
    /// Keepalive answer.
    Pong(String),
    /// Namespace connect acknowledgement.
    ConnectAck,
    /// Namespace disconnect.
    Disconnect,
    /// Application event with its JSON payload.
    Event {
        /// Event name, e.g. `api` or `paired`.
        name: String,
        /// Event payload; `Null` when the event carries no argument.
        payload: Value,
    },
}

impl Packet {
    /// Create an event packet.
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        Packet::Event {
            name: name.into(),
            payload,
        }
    }
}

/// Encoder and decoder for wire packets.
///
/// The codec is stateless; both directions are pure text transforms and the
/// same codec serves client and server roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec;

impl PacketCodec {
    /// Create a new packet codec.
    pub fn new() -> Self {
        Self
    }

    /// Encode a packet into the text of one WebSocket frame.
    pub fn encode(&self, packet: &Packet) -> Result<String> {
        match packet {
            Packet::Open(handshake) => Ok(format!("0{}", serde_json::to_string(handshake)?)),
            Packet::Close => Ok("1".to_string()),
            Packet::Ping(data) => Ok(format!("2{data}")),
            Packet::Pong(data) => Ok(format!("3{data}")),
            Packet::ConnectAck => Ok("40".to_string()),
            Packet::Disconnect => Ok("41".to_string()),
            Packet::Event { name, payload } => {
                Ok(format!("42{}", serde_json::to_string(&(name, payload))?))
            }
        }
    }

    /// Decode the text of one WebSocket frame into a packet.
    pub fn decode(&self, frame: &str) -> Result<Packet> {
        let kind = frame.chars().next().ok_or(ProtocolError::EmptyFrame)?;
        let rest = &frame[kind.len_utf8()..];

        match kind {
            ENGINE_OPEN => {
                let handshake: Handshake = serde_json::from_str(rest)
                    .map_err(|e| ProtocolError::MalformedHandshake(e.to_string()))?;
                Ok(Packet::Open(handshake))
            }
            ENGINE_CLOSE => Ok(Packet::Close),
            ENGINE_PING => Ok(Packet::Ping(rest.to_string())),
            ENGINE_PONG => Ok(Packet::Pong(rest.to_string())),
            ENGINE_MESSAGE => self.decode_message(rest),
            other => Err(ProtocolError::UnknownPacketType { packet: other }),
        }
    }

    /// Decode the socket.io message nested inside an engine.io message packet.
    fn decode_message(&self, body: &str) -> Result<Packet> {
        let kind = body.chars().next().ok_or_else(|| {
            ProtocolError::MalformedEvent("message packet with no nested type byte".to_string())
        })?;
        let rest = &body[kind.len_utf8()..];

        match kind {
            SOCKET_CONNECT => Ok(Packet::ConnectAck),
            SOCKET_DISCONNECT => Ok(Packet::Disconnect),
            SOCKET_EVENT => self.decode_event(rest),
            other => Err(ProtocolError::UnknownMessageType { packet: other }),
        }
    }

    /// Decode an event body of the form `["name", payload]`.
    fn decode_event(&self, body: &str) -> Result<Packet> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProtocolError::MalformedEvent(e.to_string()))?;

        let Value::Array(mut items) = value else {
            return Err(ProtocolError::MalformedEvent(
                "event body is not an array".to_string(),
            ));
        };
        if items.is_empty() {
            return Err(ProtocolError::MalformedEvent(
                "event array is empty".to_string(),
            ));
        }

        let payload = if items.len() > 1 {
            items.swap_remove(1)
        } else {
            Value::Null
        };
        let name = match items.swap_remove(0) {
            Value::String(name) => name,
            other => {
                return Err(ProtocolError::MalformedEvent(format!(
                    "event name is not a string: {other}"
                )))
            }
        };

        Ok(Packet::Event { name, payload })
    }
}
