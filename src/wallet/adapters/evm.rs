use std::sync::Arc;

use serde_json::{json, Value};

use super::{format_units, parse_hex_u128};
use crate::wallet::error::{ProviderError, WalletError};
use crate::wallet::provider::EvmProvider;
use crate::wallet::{network_config, ChainId, NetworkType};

/// Provider error code meaning the requested chain is not registered with
/// the wallet yet.
const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Adapter for the injected EVM browser extension (MetaMask).
pub struct EvmAdapter {
    provider: Option<Arc<dyn EvmProvider>>,
    address: Option<String>,
}

impl EvmAdapter {
    pub fn new(provider: Option<Arc<dyn EvmProvider>>) -> Self {
        EvmAdapter {
            provider,
            address: None,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn EvmProvider>, WalletError> {
        match &self.provider {
            Some(p) if p.is_metamask() => Ok(p),
            _ => Err(WalletError::NotInstalled("MetaMask")),
        }
    }

    fn connected_address(&self) -> Result<&str, WalletError> {
        self.address.as_deref().ok_or(WalletError::NotConnected)
    }

    pub async fn connect(&mut self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let accounts = provider.request("eth_requestAccounts", json!([])).await?;
        let address = first_account(&accounts).ok_or(WalletError::NoAccounts)?;
        self.address = Some(address.clone());
        Ok(address)
    }

    /// Re-attach without prompting. `eth_accounts` returns the already
    /// authorized accounts and never opens a wallet popup.
    pub async fn resume(&mut self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let accounts = provider.request("eth_accounts", json!([])).await?;
        let address = first_account(&accounts).ok_or(WalletError::NotConnected)?;
        self.address = Some(address.clone());
        Ok(address)
    }

    /// EVM extensions expose no programmatic disconnect; forgetting the
    /// account locally is all there is.
    pub fn disconnect(&mut self) {
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

    pub async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
        let provider = self.provider()?;
        let chain_id = provider.request("eth_chainId", json!([])).await?;
        chain_id
            .as_str()
            .map(|s| ChainId::Hex(s.to_owned()))
            .ok_or_else(|| WalletError::Provider("eth_chainId returned a non-string".into()))
    }

    /// Switch the wallet to `network`, registering the chain first if the
    /// wallet does not know it yet (error 4902).
    pub async fn switch_network(&self, network: NetworkType) -> Result<(), WalletError> {
        let config = network_config(network).ok_or_else(|| {
            WalletError::Unsupported(format!("Unsupported network: {network}"))
        })?;
        let provider = self.provider()?;

        let switch = provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": config.chain_id }]),
            )
            .await;

        match switch {
            Ok(_) => Ok(()),
            Err(ProviderError { code, .. }) if code == UNRECOGNIZED_CHAIN => {
                provider
                    .request(
                        "wallet_addEthereumChain",
                        json!([{
                            "chainId": config.chain_id,
                            "chainName": config.chain_name,
                            "nativeCurrency": {
                                "name": config.currency_name,
                                "symbol": config.currency_symbol,
                                "decimals": config.currency_decimals,
                            },
                            "rpcUrls": config.rpc_urls,
                            "blockExplorerUrls": config.block_explorer_urls,
                        }]),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn first_account(accounts: &Value) -> Option<String> {
    accounts
        .as_array()
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .map(str::to_owned)
}

impl std::fmt::Debug for EvmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmAdapter")
            .field("address", &self.address)
            .finish()
    }
}
