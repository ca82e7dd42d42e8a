//! Blockchain signing adapter.
//!
//! Chain client libraries expect a signing backend they can ask for
//! available keys and hand transactions to. [`SignatureProvider`] is that
//! seam, and [`ScatterSignatureProvider`] implements it on top of a wallet
//! connection: keys come from the granted identity's accounts, signatures
//! from the wallet's signing prompt.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use scatter_protocol::types::SignaturesResult;
use serde_json::{json, Value};

use crate::error::{Result, ScatterError};
use crate::scatter::Scatter;

/// Signing backend for blockchain client libraries.
pub trait SignatureProvider: Send + Sync {
    /// Public keys this provider can sign with.
    fn available_keys(&self) -> BoxFuture<'_, Result<Vec<String>>>;

    /// Sign a serialized transaction.
    fn sign(&self, transaction: Value) -> BoxFuture<'_, Result<SignaturesResult>>;
}

/// Provider backed by a wallet connection.
///
/// Requires an identity: `available_keys` reports the keys of the granted
/// identity's accounts and fails with `NotAuthenticated` before a grant.
pub struct ScatterSignatureProvider {
    scatter: Arc<Scatter>,
}

impl ScatterSignatureProvider {
    /// Wrap a wallet client.
    pub fn new(scatter: Arc<Scatter>) -> Self {
        Self { scatter }
    }
}

impl SignatureProvider for ScatterSignatureProvider {
    fn available_keys(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            let identity = self
                .scatter
                .identity()
                .await
                .ok_or(ScatterError::NotAuthenticated)?;

            let mut keys = Vec::new();
            for account in &identity.accounts {
                if !account.public_key.is_empty() && !keys.contains(&account.public_key) {
                    keys.push(account.public_key.clone());
                }
            }
            Ok(keys)
        })
    }

    fn sign(&self, transaction: Value) -> BoxFuture<'_, Result<SignaturesResult>> {
        Box::pin(async move {
            let payload = json!({
                "transaction": transaction,
                "blockchain": self.scatter.network().blockchain,
                "network": self.scatter.network(),
                "origin": self.scatter.origin(),
            });
            self.scatter.request_signature(payload).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScatterConfig;
    use crate::storage::{MemoryStorage, StorageProvider, KEY_IDENTITY};
    use scatter_protocol::types::{blockchains, Account, Identity, Network};

    fn eos_network() -> Network {
        Network::new(blockchains::EOSIO, "aca376f2", "nodes.get-scatter.com", 443, "https")
    }

    fn provider_with_identity(identity: Option<&Identity>) -> ScatterSignatureProvider {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(identity) = identity {
            let text = serde_json::to_string(identity).unwrap();
            storage.save(KEY_IDENTITY, &text).unwrap();
        }
        let scatter = Scatter::with_config(
            "demo-app",
            eos_network(),
            ScatterConfig::default(),
            storage,
        );
        ScatterSignatureProvider::new(Arc::new(scatter))
    }

    #[tokio::test]
    async fn test_available_keys_requires_an_identity() {
        let provider = provider_with_identity(None);
        assert!(matches!(
            provider.available_keys().await,
            Err(ScatterError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_available_keys_come_from_identity_accounts() {
        let identity = Identity {
            name: "alice".to_string(),
            accounts: vec![
                Account {
                    name: "first".to_string(),
                    public_key: "EOS_KEY_A".to_string(),
                    ..Account::default()
                },
                Account {
                    name: "second".to_string(),
                    public_key: "EOS_KEY_B".to_string(),
                    ..Account::default()
                },
                // Same key under a different authority appears once.
                Account {
                    name: "first".to_string(),
                    authority: "owner".to_string(),
                    public_key: "EOS_KEY_A".to_string(),
                    ..Account::default()
                },
            ],
            ..Identity::default()
        };

        let provider = provider_with_identity(Some(&identity));
        let keys = provider.available_keys().await.unwrap();
        assert_eq!(keys, vec!["EOS_KEY_A", "EOS_KEY_B"]);
    }

    #[tokio::test]
    async fn test_accounts_without_keys_are_skipped() {
        let identity = Identity {
            name: "alice".to_string(),
            accounts: vec![Account::default()],
            ..Identity::default()
        };

        let provider = provider_with_identity(Some(&identity));
        assert!(provider.available_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_fails_fast_without_a_connection() {
        let provider = provider_with_identity(None);
        let result = provider.sign(json!({"actions": []})).await;
        assert!(matches!(result, Err(ScatterError::NotConnected)));
    }
}
