//! Client configuration for wallet connections.
//!
//! The configuration carries the ordered endpoint candidates the transport
//! walks on connect, plus the connect and request deadlines. Environment
//! variables can override individual endpoints for development setups.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default relay endpoint, tried first.
pub const DEFAULT_RELAY_HOST: &str = "local.get-scatter.com";
/// Default relay port.
pub const DEFAULT_RELAY_PORT: u16 = 50006;
/// Default local fallback endpoint.
pub const DEFAULT_LOCAL_HOST: &str = "127.0.0.1";
/// Default local fallback port.
pub const DEFAULT_LOCAL_PORT: u16 = 50005;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding the first endpoint candidate.
pub const ENV_RELAY_URL: &str = "SCATTER_RELAY_URL";
/// Environment variable overriding the second endpoint candidate.
pub const ENV_LOCAL_URL: &str = "SCATTER_LOCAL_URL";
/// Environment variable overriding the per-endpoint connect timeout.
pub const ENV_CONNECT_TIMEOUT: &str = "SCATTER_CONNECT_TIMEOUT_SECS";
/// Environment variable overriding the default request timeout.
pub const ENV_REQUEST_TIMEOUT: &str = "SCATTER_REQUEST_TIMEOUT_SECS";

/// Errors produced while building or validating a configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An endpoint failed to parse or used a non-WebSocket scheme.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The offending endpoint text.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The endpoint candidate list is empty.
    #[error("no endpoints configured")]
    NoEndpoints,

    /// An environment override failed to parse.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// The environment variable name.
        var: String,
        /// The rejected value.
        value: String,
    },

    /// A timeout was configured as zero.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// The offending field name.
        field: &'static str,
    },
}

/// One wallet endpoint candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// WebSocket scheme, `ws` or `wss`.
    pub scheme: String,
    /// Wallet host name or address.
    pub host: String,
    /// Wallet port.
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint from its parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Parse an endpoint from a `ws://host:port` or `wss://host:port` URL.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(input).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: input.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        if scheme != "ws" && scheme != "wss" {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: input.to_string(),
                reason: "scheme must be ws or wss".to_string(),
            });
        }
        let host = url.host_str().ok_or_else(|| ConfigError::InvalidEndpoint {
            endpoint: input.to_string(),
            reason: "missing host".to_string(),
        })?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ConfigError::InvalidEndpoint {
                endpoint: input.to_string(),
                reason: "missing port".to_string(),
            })?;

        Ok(Self::new(scheme, host, port))
    }

    /// The full socket.io upgrade URL the wallet listens on.
    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}/socket.io/?EIO=3&transport=websocket",
            self.scheme, self.host, self.port
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Configuration for the wallet client.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterConfig {
    /// Endpoint candidates, tried in order until one connects.
    pub endpoints: Vec<Endpoint>,
    /// Deadline for each individual endpoint attempt, covering the
    /// WebSocket upgrade, the protocol handshake, and pairing.
    pub connect_timeout: Duration,
    /// Default deadline for a single API request.
    pub request_timeout: Duration,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                Endpoint::new("wss", DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT),
                Endpoint::new("ws", DEFAULT_LOCAL_HOST, DEFAULT_LOCAL_PORT),
            ],
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ScatterConfig {
    /// Create a configuration with a custom candidate list.
    pub fn with_endpoints(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints,
            ..Default::default()
        }
    }

    /// Append an endpoint candidate at the end of the fallback order.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Set the per-endpoint connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Apply environment variable overrides.
    ///
    /// Empty variables are ignored. URL overrides replace the candidate at
    /// their slot (first for the relay, second for the local fallback),
    /// appending when the list is shorter.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(ENV_RELAY_URL) {
            let endpoint = Endpoint::parse(&value)?;
            replace_slot(&mut self.endpoints, 0, endpoint);
        }
        if let Some(value) = read_env(ENV_LOCAL_URL) {
            let endpoint = Endpoint::parse(&value)?;
            replace_slot(&mut self.endpoints, 1, endpoint);
        }
        if let Some(value) = read_env(ENV_CONNECT_TIMEOUT) {
            self.connect_timeout = Duration::from_secs(parse_secs(ENV_CONNECT_TIMEOUT, &value)?);
        }
        if let Some(value) = read_env(ENV_REQUEST_TIMEOUT) {
            self.request_timeout = Duration::from_secs(parse_secs(ENV_REQUEST_TIMEOUT, &value)?);
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        for endpoint in &self.endpoints {
            if endpoint.scheme != "ws" && endpoint.scheme != "wss" {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: "scheme must be ws or wss".to_string(),
                });
            }
            if endpoint.host.is_empty() {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: "missing host".to_string(),
                });
            }
            if endpoint.port == 0 {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: "missing port".to_string(),
                });
            }
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "connect_timeout",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "request_timeout",
            });
        }
        Ok(())
    }
}

fn read_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn replace_slot(endpoints: &mut Vec<Endpoint>, slot: usize, endpoint: Endpoint) {
    if slot < endpoints.len() {
        endpoints[slot] = endpoint;
    } else {
        endpoints.push(endpoint);
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
        })
}
