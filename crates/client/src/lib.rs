//! # Scatter Client Library
//!
//! This crate connects an application to a locally-running Scatter wallet
//! and exposes its identity, signing, and transfer operations as typed
//! async methods.
//!
//! ## Overview
//!
//! The client is built around a connection and request-correlation core:
//!
//! - **Command Façade**: one typed method per wallet operation ([`Scatter`])
//! - **Socket Service**: the WebSocket connection with ordered endpoint
//!   fallback, pairing, and keepalive
//! - **Request Correlator**: matches asynchronous responses back to the
//!   callers waiting on them
//! - **Session Cache and Storage**: the granted identity and the pairing
//!   credential, persisted across restarts
//! - **Signing Provider**: the seam blockchain client libraries plug into
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Scatter (Command Façade)       │  typed operations
//! ├─────────────────────────────────────────┤
//! │          SocketService + Correlator     │  requests in flight
//! ├─────────────────────────────────────────┤
//! │          scatter-protocol               │  frames and envelopes
//! ├─────────────────────────────────────────┤
//! │          Transport (tokio-tungstenite)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scatter_client::{Network, Scatter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let network = Network::new(
//!     "eos",
//!     "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906",
//!     "nodes.get-scatter.com",
//!     443,
//!     "https",
//! );
//!
//! let scatter = Scatter::new("my-app", network);
//! scatter.connect().await?;
//!
//! let identity = scatter.get_identity().await?;
//! println!("signing as {}", identity.name);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`scatter`]: the command façade
//! - [`socket`]: connection and request correlation
//! - [`session`]: identity cache
//! - [`signing`]: signing provider seam
//! - [`storage`]: session persistence
//! - [`config`]: endpoints and timeouts
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod scatter;
pub mod session;
pub mod signing;
pub mod socket;
pub mod storage;

pub use config::{Endpoint, ScatterConfig};
pub use error::{Result, ScatterError};
pub use scatter::Scatter;
pub use session::SessionCache;
pub use signing::{ScatterSignatureProvider, SignatureProvider};
pub use socket::SocketService;
pub use storage::{FileStorage, MemoryStorage, StorageProvider};

pub use scatter_protocol::types::{
    Account, ApiError, Identity, Network, RequiredFields, SignaturesResult,
};
