use std::sync::Arc;

use serde_json::json;

use super::{format_units, parse_hex_u128};
use crate::wallet::error::WalletError;
use crate::wallet::provider::RelayProvider;
use crate::wallet::{ChainId, NetworkType};

/// Adapter for the relay-based multi-wallet bridge (WalletConnect).
///
/// Speaks the same JSON-RPC dialect as the EVM adapter but through a relay
/// session instead of an injected extension, and reports decimal chain ids.
pub struct RelayAdapter {
    provider: Option<Arc<dyn RelayProvider>>,
    address: Option<String>,
}

impl RelayAdapter {
    pub fn new(provider: Option<Arc<dyn RelayProvider>>) -> Self {
        RelayAdapter {
            provider,
            address: None,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn RelayProvider>, WalletError> {
        self.provider
            .as_ref()
            .ok_or(WalletError::NotInstalled("WalletConnect"))
    }

    fn connected_address(&self) -> Result<&str, WalletError> {
        self.address.as_deref().ok_or(WalletError::NotConnected)
    }

    pub async fn connect(&mut self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let accounts = provider.enable().await?;
        let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
        self.address = Some(address.clone());
        Ok(address)
    }

    /// Relay sessions are re-established by pairing, never silently.
    pub async fn resume(&mut self) -> Result<String, WalletError> {
        Err(WalletError::NotConnected)
    }

    pub async fn disconnect(&mut self) {
        if let Some(provider) = &self.provider {
            if let Err(err) = provider.disconnect().await {
                tracing::warn!("WalletConnect disconnect failed: {}", err);
            }
        }
        self.address = None;
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let address = self.connected_address()?.to_owned();
        let provider = self.provider()?;
        let signature = provider
            .request("personal_sign", json!([message, address]))
            .await?;
        signature
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| WalletError::Provider("personal_sign returned a non-string".into()))
    }

    pub async fn get_balance(&self) -> Result<String, WalletError> {
        let address = self.connected_address()?.to_owned();
        let provider = self.provider()?;
        let balance = provider
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        let wei = balance
            .as_str()
            .ok_or_else(|| WalletError::Provider("eth_getBalance returned a non-string".into()))?;
        Ok(format_units(parse_hex_u128(wei)?, 18))
    }

    pub fn get_chain_id(&self) -> Result<ChainId, WalletError> {
        self.connected_address()?;
        let provider = self.provider()?;
        Ok(ChainId::Decimal(provider.chain_id()))
    }

    pub fn switch_network(&self, _network: NetworkType) -> Result<(), WalletError> {
        Err(WalletError::Unsupported(
            "Network switching is not supported for WalletConnect".into(),
        ))
    }
}

impl std::fmt::Debug for RelayAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayAdapter")
            .field("address", &self.address)
            .finish()
    }
}
