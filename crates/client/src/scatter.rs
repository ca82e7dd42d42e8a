//! High-level wallet client.
//!
//! `Scatter` is the surface applications talk to: one strongly-typed method
//! per wallet operation, plus connection lifecycle. Each method fails fast
//! with `NotConnected` before touching the network, builds the operation
//! payload, submits it through the socket service, and maps the raw result
//! into its typed form. No method retries; callers decide what a failure
//! means for them.

use std::sync::Arc;

use scatter_protocol::types::{Identity, Network, RequiredFields, SignaturesResult};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ScatterConfig;
use crate::error::{Result, ScatterError};
use crate::session::SessionCache;
use crate::socket::SocketService;
use crate::storage::{MemoryStorage, StorageProvider, KEY_APPKEY};

/// Client handle for a wallet connection.
pub struct Scatter {
    origin: String,
    network: Network,
    config: ScatterConfig,
    storage: Arc<dyn StorageProvider>,
    session: SessionCache,
    socket: RwLock<Option<Arc<SocketService>>>,
}

impl Scatter {
    /// Create a client with the default configuration and in-memory
    /// storage. `origin` is the application name shown to the user;
    /// `network` is the chain the application operates on.
    pub fn new(origin: impl Into<String>, network: Network) -> Self {
        Self::with_config(
            origin,
            network,
            ScatterConfig::default(),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// Create a client with an explicit configuration and storage provider.
    pub fn with_config(
        origin: impl Into<String>,
        network: Network,
        config: ScatterConfig,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        let session = SessionCache::new(storage.clone());
        Self {
            origin: origin.into(),
            network,
            config,
            storage,
            session,
            socket: RwLock::new(None),
        }
    }

    /// The application name this client pairs under.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The network this client was created for.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Connect to the wallet, walking the configured endpoints in order.
    pub async fn connect(&self) -> Result<()> {
        self.connect_with(&CancellationToken::new()).await
    }

    /// Connect with a cancellation token; cancelling aborts the attempt.
    ///
    /// A previous pairing resumes silently: the stored app key is reused
    /// and the identity the wallet already granted is fetched into the
    /// session cache. Replaces any existing connection.
    pub async fn connect_with(&self, cancel: &CancellationToken) -> Result<()> {
        let (appkey, known) = self.load_or_create_appkey()?;
        let socket = SocketService::connect(
            &self.config,
            &self.origin,
            &appkey,
            known,
            self.storage.clone(),
            cancel,
        )
        .await?;

        {
            let mut guard = self.socket.write().await;
            if let Some(previous) = guard.take() {
                previous.dispose();
            }
            *guard = Some(Arc::new(socket));
        }

        // Resume the identity a previous pairing granted, if any. The
        // connection is usable either way.
        match self.identity_from_permissions().await {
            Ok(Some(identity)) => {
                tracing::debug!(name = %identity.name, "resumed granted identity");
            }
            Ok(None) => {}
            Err(error) => tracing::warn!(%error, "failed to fetch permitted identity"),
        }

        Ok(())
    }

    /// Close the connection, failing any requests still pending.
    pub async fn disconnect(&self) {
        if let Some(socket) = self.socket.write().await.take() {
            socket.dispose();
        }
    }

    /// Whether a paired connection is currently up.
    pub async fn is_connected(&self) -> bool {
        match self.socket.read().await.as_ref() {
            Some(socket) => socket.is_connected(),
            None => false,
        }
    }

    /// The cached identity, if the wallet granted one.
    pub async fn identity(&self) -> Option<Identity> {
        self.session.get().await
    }

    // Wallet operations

    /// Version string of the connected wallet.
    pub async fn get_version(&self) -> Result<String> {
        let result = self
            .request("getVersion", json!({"origin": self.origin}))
            .await?;
        decode(result)
    }

    /// Request an identity holding an account on the configured network,
    /// prompting the user if none was granted yet.
    pub async fn get_identity(&self) -> Result<Identity> {
        self.get_identity_with_fields(RequiredFields::with_accounts(vec![self.network.clone()]))
            .await
    }

    /// Request an identity satisfying explicit field requirements.
    /// The granted identity is cached for later calls.
    pub async fn get_identity_with_fields(&self, fields: RequiredFields) -> Result<Identity> {
        let result = self
            .request(
                "getOrRequestIdentity",
                json!({"origin": self.origin, "fields": fields}),
            )
            .await?;
        let identity: Identity = decode(result)?;
        self.session.set(identity.clone()).await;
        Ok(identity)
    }

    /// Fetch the identity the wallet already granted to this origin, if
    /// any, without prompting the user. Caches the identity when present.
    pub async fn identity_from_permissions(&self) -> Result<Option<Identity>> {
        let result = self
            .request("identityFromPermissions", json!({"origin": self.origin}))
            .await?;
        // The wallet answers `null` or `false` when nothing was granted.
        if result.is_null() || result == Value::Bool(false) {
            return Ok(None);
        }
        let identity: Identity = decode(result)?;
        self.session.set(identity.clone()).await;
        Ok(Some(identity))
    }

    /// Ask the wallet to revoke this origin's identity permissions and
    /// drop the cached identity.
    pub async fn forget_identity(&self) -> Result<bool> {
        let result = self
            .request("forgetIdentity", json!({"origin": self.origin}))
            .await?;
        let forgotten: bool = decode(result)?;
        self.session.clear().await;
        Ok(forgotten)
    }

    /// Prove ownership of the granted identity by signing a nonce.
    pub async fn authenticate(&self, nonce: &str) -> Result<String> {
        let result = self
            .request(
                "authenticate",
                json!({"origin": self.origin, "nonce": nonce}),
            )
            .await?;
        decode(result)
    }

    /// Request a signature over arbitrary data with the given key.
    pub async fn get_arbitrary_signature(
        &self,
        public_key: &str,
        data: &str,
        whatfor: &str,
        is_hash: bool,
    ) -> Result<String> {
        let result = self
            .request(
                "requestArbitrarySignature",
                json!({
                    "origin": self.origin,
                    "publicKey": public_key,
                    "data": data,
                    "whatfor": whatfor,
                    "isHash": is_hash,
                }),
            )
            .await?;
        decode(result)
    }

    /// Ask the wallet to create or select a public key on a blockchain.
    pub async fn get_public_key(&self, blockchain: &str) -> Result<String> {
        let result = self
            .request(
                "getPublicKey",
                json!({"origin": self.origin, "blockchain": blockchain}),
            )
            .await?;
        decode(result)
    }

    /// Link an existing key to an account on the given network.
    pub async fn link_account(&self, public_key: &str, network: &Network) -> Result<bool> {
        let result = self
            .request(
                "linkAccount",
                json!({
                    "origin": self.origin,
                    "publicKey": public_key,
                    "network": network,
                }),
            )
            .await?;
        decode(result)
    }

    /// Whether the wallet holds an account for the given network.
    pub async fn has_account_for(&self, network: &Network) -> Result<bool> {
        let result = self
            .request(
                "hasAccountFor",
                json!({"origin": self.origin, "network": network}),
            )
            .await?;
        decode(result)
    }

    /// Suggest that the wallet add a network it may not know yet.
    pub async fn suggest_network(&self, network: &Network) -> Result<bool> {
        let result = self
            .request(
                "requestAddNetwork",
                json!({"origin": self.origin, "network": network}),
            )
            .await?;
        decode(result)
    }

    /// Ask the wallet to build, confirm, and sign a token transfer.
    pub async fn request_transfer(
        &self,
        network: &Network,
        to: &str,
        amount: &str,
        options: Value,
    ) -> Result<Value> {
        self.request(
            "requestTransfer",
            json!({
                "origin": self.origin,
                "network": network,
                "to": to,
                "amount": amount,
                "options": options,
            }),
        )
        .await
    }

    /// Request signatures for a transaction payload.
    ///
    /// The payload is sent exactly as given; signing providers build it for
    /// their blockchain.
    pub async fn request_signature(&self, payload: Value) -> Result<SignaturesResult> {
        let result = self.request("requestSignature", payload).await?;
        decode(result)
    }

    /// Derive a shared encryption key between two public keys.
    pub async fn get_encryption_key(
        &self,
        from_public_key: &str,
        to_public_key: &str,
        nonce: u64,
    ) -> Result<String> {
        let result = self
            .request(
                "getEncryptionKey",
                json!({
                    "origin": self.origin,
                    "fromPublicKey": from_public_key,
                    "toPublicKey": to_public_key,
                    "nonce": nonce,
                }),
            )
            .await?;
        decode(result)
    }

    /// Submit one request through the live socket.
    async fn request(&self, kind: &str, payload: Value) -> Result<Value> {
        let socket = self
            .socket
            .read()
            .await
            .clone()
            .ok_or(ScatterError::NotConnected)?;
        socket.request(kind, payload).await
    }

    /// Load the persisted app key, generating and persisting a fresh one on
    /// first run. The boolean reports whether the key already existed, which
    /// lets the wallet skip the pairing prompt on reconnects.
    fn load_or_create_appkey(&self) -> Result<(String, bool)> {
        if let Some(appkey) = self.storage.load(KEY_APPKEY)? {
            if !appkey.is_empty() {
                return Ok((appkey, true));
            }
        }
        let appkey = format!("appkey:{}", Uuid::new_v4());
        self.storage.save(KEY_APPKEY, &appkey)?;
        Ok((appkey, false))
    }
}

impl std::fmt::Debug for Scatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scatter")
            .field("origin", &self.origin)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(ScatterError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatter_protocol::types::blockchains;

    fn eos_network() -> Network {
        Network::new(
            blockchains::EOSIO,
            "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906",
            "nodes.get-scatter.com",
            443,
            "https",
        )
    }

    #[tokio::test]
    async fn test_operations_fail_fast_when_never_connected() {
        let scatter = Scatter::new("demo-app", eos_network());

        assert!(!scatter.is_connected().await);
        assert!(matches!(
            scatter.get_version().await,
            Err(ScatterError::NotConnected)
        ));
        assert!(matches!(
            scatter.get_identity().await,
            Err(ScatterError::NotConnected)
        ));
        assert!(matches!(
            scatter.request_signature(json!({})).await,
            Err(ScatterError::NotConnected)
        ));
        assert!(matches!(
            scatter.authenticate("nonce").await,
            Err(ScatterError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_a_no_op() {
        let scatter = Scatter::new("demo-app", eos_network());
        scatter.disconnect().await;
        assert!(!scatter.is_connected().await);
    }

    #[tokio::test]
    async fn test_identity_is_empty_before_any_grant() {
        let scatter = Scatter::new("demo-app", eos_network());
        assert!(scatter.identity().await.is_none());
    }

    #[test]
    fn test_first_run_generates_and_persists_an_appkey() {
        let storage = Arc::new(MemoryStorage::new());
        let scatter = Scatter::with_config(
            "demo-app",
            eos_network(),
            ScatterConfig::default(),
            storage.clone(),
        );

        let (appkey, known) = scatter.load_or_create_appkey().unwrap();
        assert!(appkey.starts_with("appkey:"));
        assert!(!known);
        assert_eq!(storage.load(KEY_APPKEY).unwrap().as_deref(), Some(&*appkey));
    }

    #[test]
    fn test_stored_appkey_is_reused_for_passthrough() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(KEY_APPKEY, "appkey:existing").unwrap();
        let scatter = Scatter::with_config(
            "demo-app",
            eos_network(),
            ScatterConfig::default(),
            storage,
        );

        let (appkey, known) = scatter.load_or_create_appkey().unwrap();
        assert_eq!(appkey, "appkey:existing");
        assert!(known);
    }

    #[test]
    fn test_empty_stored_appkey_is_regenerated() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(KEY_APPKEY, "").unwrap();
        let scatter = Scatter::with_config(
            "demo-app",
            eos_network(),
            ScatterConfig::default(),
            storage,
        );

        let (appkey, known) = scatter.load_or_create_appkey().unwrap();
        assert!(appkey.starts_with("appkey:"));
        assert!(!known);
    }

    #[test]
    fn test_session_survives_client_reconstruction() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(KEY_APPKEY, "appkey:persisted").unwrap();
        drop(Scatter::with_config(
            "demo-app",
            eos_network(),
            ScatterConfig::default(),
            storage.clone(),
        ));

        let scatter =
            Scatter::with_config("demo-app", eos_network(), ScatterConfig::default(), storage);
        let (appkey, known) = scatter.load_or_create_appkey().unwrap();
        assert_eq!(appkey, "appkey:persisted");
        assert!(known);
    }
}
