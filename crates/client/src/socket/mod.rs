//! Connection and request-correlation engine.
//!
//! The socket module turns one WebSocket connection to the wallet into a
//! request/response surface. [`SocketService`] owns the connection and its
//! reader and writer tasks; [`Correlator`] matches responses back to the
//! callers waiting on them.

mod correlator;
mod service;

pub use correlator::Correlator;
pub use service::SocketService;
