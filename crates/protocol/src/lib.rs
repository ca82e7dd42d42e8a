//! # Scatter Protocol Library
//!
//! This crate provides the wire protocol definitions for talking to a
//! Scatter wallet over its local WebSocket channel.
//!
//! ## Overview
//!
//! The protocol crate is the foundation of the client's communication layer,
//! providing:
//!
//! - **Packet Codec**: the socket.io text framing carried in WebSocket frames
//! - **Message Definitions**: API, pairing, and rekey envelopes
//! - **Result Envelope**: the in-band error marker split into a typed result
//! - **Domain Types**: identities, accounts, networks, and signature results
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          API Envelopes                  │  JSON, correlated by id
//! ├─────────────────────────────────────────┤
//! │          Socket.io Events               │  42["api", {...}]
//! ├─────────────────────────────────────────┤
//! │          Engine.io Packets              │  open/ping/pong/message
//! ├─────────────────────────────────────────┤
//! │          Transport (WebSocket)          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use scatter_protocol::{ApiEnvelope, ApiRequest, Packet, PacketCodec};
//! use serde_json::json;
//!
//! // Build an API request addressed to the wallet
//! let request = ApiRequest::new("getVersion", json!({"origin": "my-app"}), "req-1");
//! let envelope = ApiEnvelope::new(request, "my-app");
//!
//! // Wrap it in a socket.io event frame
//! let codec = PacketCodec::new();
//! let payload = serde_json::to_value(&envelope).unwrap();
//! let frame = codec.encode(&Packet::event("api", payload)).unwrap();
//! assert!(frame.starts_with("42"));
//!
//! // Decode an inbound frame back into a packet
//! let packet = codec.decode(&frame).unwrap();
//! assert!(matches!(packet, Packet::Event { .. }));
//! ```
//!
//! ## Modules
//!
//! - [`framing`]: engine.io and socket.io packet codec
//! - [`messages`]: API, pairing, and rekey envelopes
//! - [`types`]: wallet domain types
//! - [`error`]: Error types

pub mod error;
pub mod framing;
pub mod messages;
pub mod types;

pub use error::{ProtocolError, Result};
pub use framing::{Handshake, Packet, PacketCodec};
pub use messages::{
    ApiEnvelope, ApiRequest, ApiResponse, ApiResult, PairingEnvelope, RekeyEnvelope, EVENT_API,
    EVENT_PAIR, EVENT_PAIRED, EVENT_REKEY, EVENT_REKEYED,
};
pub use types::{
    Account, ApiError, Identity, Network, RequiredFields, SignaturesResult,
};
