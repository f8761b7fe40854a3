use std::sync::Arc;

use super::format_units;
use crate::wallet::error::WalletError;
use crate::wallet::provider::{SolanaProvider, SolanaRpc};
use crate::wallet::{ChainId, NetworkType, SOLANA_NETWORK};

/// Adapter for the injected Solana browser extension (Phantom).
///
/// Balance queries go through the cluster RPC because the injected provider
/// only signs and manages the session.
pub struct SolanaAdapter {
    provider: Option<Arc<dyn SolanaProvider>>,
    rpc: Option<Arc<dyn SolanaRpc>>,
    address: Option<String>,
}

impl SolanaAdapter {
    pub fn new(provider: Option<Arc<dyn SolanaProvider>>, rpc: Option<Arc<dyn SolanaRpc>>) -> Self {
        SolanaAdapter {
            provider,
            rpc,
            address: None,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn SolanaProvider>, WalletError> {
        match &self.provider {
            Some(p) if p.is_phantom() => Ok(p),
            _ => Err(WalletError::NotInstalled("Phantom")),
        }
    }

    fn connected_address(&self) -> Result<&str, WalletError> {
        self.address.as_deref().ok_or(WalletError::NotConnected)
    }

    pub async fn connect(&mut self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let pubkey = provider.connect().await?;
        self.address = Some(pubkey.clone());
        Ok(pubkey)
    }

    /// Re-attach to a session the extension kept alive, without prompting.
    pub async fn resume(&mut self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        if !provider.is_connected() {
            return Err(WalletError::NotConnected);
        }
        let pubkey = provider.public_key().ok_or(WalletError::NotConnected)?;
        self.address = Some(pubkey.clone());
        Ok(pubkey)
    }

    /// Best-effort: the local session is forgotten even when the extension
    /// refuses the remote disconnect.
    pub async fn disconnect(&mut self) {
        if let Ok(provider) = self.provider() {
            if let Err(err) = provider.disconnect().await {
                tracing::warn!("Phantom disconnect failed: {}", err);
            }
        }
        self.address = None;
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.connected_address()?;
        let provider = self.provider()?;
        let signature = provider.sign_message(message.as_bytes()).await?;
        Ok(hex::encode(signature))
    }

    pub async fn get_balance(&self) -> Result<String, WalletError> {
        let pubkey = self.connected_address()?.to_owned();
        let rpc = self
            .rpc
            .as_ref()
            .ok_or_else(|| WalletError::Provider("Solana RPC is not configured".into()))?;
        let lamports = rpc.get_balance(&pubkey).await?;
        Ok(format_units(lamports as u128, 9))
    }

    /// The cluster is fixed by configuration, so this only reports it while
    /// a session is active.
    pub fn get_chain_id(&self) -> Result<ChainId, WalletError> {
        self.connected_address()?;
        Ok(ChainId::Name(SOLANA_NETWORK.to_owned()))
    }

    pub fn switch_network(&self, _network: NetworkType) -> Result<(), WalletError> {
        Err(WalletError::Unsupported(
            "Phantom wallet only supports Solana network".into(),
        ))
    }
}

impl std::fmt::Debug for SolanaAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaAdapter")
            .field("address", &self.address)
            .finish()
    }
}
