//! Provider seams for the host environment.
//!
//! Browsers inject wallet providers as globals; here each injected surface is
//! a trait object carried by [`WalletEnvironment`]. An absent provider models
//! an uninstalled extension, which is exactly what the installation probe and
//! the adapters check for.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::error::ProviderError;
use super::solana_rpc_url;

/// Injected EVM provider (the `window.ethereum` surface).
#[async_trait]
pub trait EvmProvider: Send + Sync {
    /// Raw JSON-RPC style request against the provider.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Whether the injected provider identifies as MetaMask.
    fn is_metamask(&self) -> bool;
}

/// Injected Solana provider (the `window.solana` surface).
#[async_trait]
pub trait SolanaProvider: Send + Sync {
    /// Whether the injected provider identifies as Phantom.
    fn is_phantom(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Public key of the connected account, if any.
    fn public_key(&self) -> Option<String>;

    /// Prompt for connection, returning the account public key.
    async fn connect(&self) -> Result<String, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Sign an arbitrary message, returning the raw signature bytes.
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, ProviderError>;
}

/// Solana cluster RPC used for balance queries, which the injected provider
/// does not serve itself.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Balance of the account in lamports.
    async fn get_balance(&self, pubkey: &str) -> Result<u64, ProviderError>;
}

/// Relay-based multi-wallet bridge (the WalletConnect surface). Unlike the
/// injected providers it is always reachable, and it reports decimal chain
/// ids.
#[async_trait]
pub trait RelayProvider: Send + Sync {
    /// Open the relay session, returning connected accounts.
    async fn enable(&self) -> Result<Vec<String>, ProviderError>;

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    fn chain_id(&self) -> u64;
}

/// The set of providers present in the host environment.
///
/// All slots are optional: a missing slot is an uninstalled wallet. The
/// environment is cheap to clone and is shared by the service and every
/// adapter it creates.
#[derive(Clone, Default)]
pub struct WalletEnvironment {
    pub ethereum: Option<Arc<dyn EvmProvider>>,
    pub solana: Option<Arc<dyn SolanaProvider>>,
    pub solana_rpc: Option<Arc<dyn SolanaRpc>>,
    pub relay: Option<Arc<dyn RelayProvider>>,
}

impl WalletEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ethereum(mut self, provider: Arc<dyn EvmProvider>) -> Self {
        self.ethereum = Some(provider);
        self
    }

    /// Register a Solana provider. Supplies the cluster RPC for balance
    /// queries unless one was already set.
    pub fn with_solana(mut self, provider: Arc<dyn SolanaProvider>) -> Self {
        self.solana = Some(provider);
        if self.solana_rpc.is_none() {
            self.solana_rpc = Some(Arc::new(HttpSolanaRpc::mainnet()));
        }
        self
    }

    pub fn with_solana_rpc(mut self, rpc: Arc<dyn SolanaRpc>) -> Self {
        self.solana_rpc = Some(rpc);
        self
    }

    pub fn with_relay(mut self, provider: Arc<dyn RelayProvider>) -> Self {
        self.relay = Some(provider);
        self
    }
}

impl std::fmt::Debug for WalletEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletEnvironment")
            .field("ethereum", &self.ethereum.is_some())
            .field("solana", &self.solana.is_some())
            .field("solana_rpc", &self.solana_rpc.is_some())
            .field("relay", &self.relay.is_some())
            .finish()
    }
}

/// JSON-RPC client for a Solana cluster endpoint.
pub struct HttpSolanaRpc {
    client: reqwest::Client,
    url: String,
}

impl HttpSolanaRpc {
    pub fn new(url: impl Into<String>) -> Self {
        HttpSolanaRpc {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(solana_rpc_url(super::SOLANA_NETWORK))
    }
}

#[async_trait]
impl SolanaRpc for HttpSolanaRpc {
    async fn get_balance(&self, pubkey: &str) -> Result<u64, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [pubkey],
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(-32000, format!("rpc request failed: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::new(-32000, format!("rpc response malformed: {e}")))?;

        if let Some(err) = payload.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-32000);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown rpc error");
            return Err(ProviderError::new(code, message));
        }

        payload
            .pointer("/result/value")
            .and_then(Value::as_u64)
            .ok_or_else(|| ProviderError::new(-32000, "rpc response missing result.value"))
    }
}
