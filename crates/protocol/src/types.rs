//! Wallet domain types shared across requests and responses.
//!
//! Field names follow the wallet's camelCase wire convention via serde
//! renames; missing fields fall back to defaults so partial documents from
//! older wallet versions still parse.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Blockchain identifiers understood by the wallet.
pub mod blockchains {
    /// EOSIO chains.
    pub const EOSIO: &str = "eos";
    /// Ethereum chains.
    pub const ETHEREUM: &str = "eth";
    /// Tron chains.
    pub const TRON: &str = "trx";
}

/// A user identity granted by the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Identity {
    /// Stable identifier of the identity.
    pub hash: String,
    /// Key the identity is derived from.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// User-chosen display name.
    pub name: String,
    /// Whether the identity passed a know-your-customer check.
    pub kyc: bool,
    /// Blockchain accounts attached to the identity.
    pub accounts: Vec<Account>,
}

/// A blockchain account attached to an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Account {
    /// On-chain account name.
    pub name: String,
    /// Permission level used for signing, e.g. `active`.
    pub authority: String,
    /// Public key backing the account.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Blockchain the account lives on.
    pub blockchain: String,
    /// Chain identifier the account belongs to.
    #[serde(rename = "chainId")]
    pub chain_id: String,
    /// Whether the key is held on a hardware device.
    #[serde(rename = "isHardware")]
    pub is_hardware: bool,
}

/// A blockchain network an application wants accounts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Network {
    /// Blockchain this network belongs to.
    pub blockchain: String,
    /// Chain identifier, e.g. the EOSIO chain id hash.
    #[serde(rename = "chainId")]
    pub chain_id: String,
    /// Node host name or address.
    pub host: String,
    /// Node port.
    pub port: u16,
    /// Scheme used to reach the node, e.g. `https`.
    pub protocol: String,
}

impl Network {
    /// Create a network descriptor.
    pub fn new(
        blockchain: impl Into<String>,
        chain_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            blockchain: blockchain.into(),
            chain_id: chain_id.into(),
            host: host.into(),
            port,
            protocol: protocol.into(),
        }
    }
}

/// Fields an application requires when requesting an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RequiredFields {
    /// Networks the identity must hold an account on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<Network>,
    /// Personal fields such as `firstname` or `email`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub personal: Vec<String>,
    /// Location fields such as `country`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<String>,
}

impl RequiredFields {
    /// Require only accounts on the given networks.
    pub fn with_accounts(networks: Vec<Network>) -> Self {
        Self {
            accounts: networks,
            ..Self::default()
        }
    }
}

/// Signatures produced for a transaction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SignaturesResult {
    /// Signatures in the order the wallet produced them.
    pub signatures: Vec<String>,
    /// Identity fields the user agreed to share alongside the signatures.
    #[serde(rename = "returnedFields", skip_serializing_if = "Option::is_none")]
    pub returned_fields: Option<Value>,
}

/// Failure reported by the wallet inside an API result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    /// Machine-readable failure category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// Numeric failure code.
    pub code: i64,
    /// In-band marker distinguishing errors from results.
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl Default for ApiError {
    fn default() -> Self {
        Self {
            kind: String::new(),
            message: String::new(),
            code: 0,
            is_error: true,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.kind)
        }
    }
}

impl std::error::Error for ApiError {}
