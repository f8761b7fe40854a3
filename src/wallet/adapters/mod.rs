//! Wallet adapters.
//!
//! One adapter per supported wallet family, dispatched through the closed
//! [`WalletAdapter`] enum. The capability surface is identical across
//! families; family-specific quirks (no programmatic EVM disconnect, no
//! Solana network switching, relay decimal chain ids) live inside the
//! variants.

use super::error::WalletError;
use super::{ChainId, NetworkType, WalletType};

mod evm;
mod relay;
mod solana;

pub use evm::EvmAdapter;
pub use relay::RelayAdapter;
pub use solana::SolanaAdapter;

/// A connected (or connectable) wallet of one of the supported families.
#[derive(Debug)]
pub enum WalletAdapter {
    Evm(EvmAdapter),
    Solana(SolanaAdapter),
    Relay(RelayAdapter),
}

impl WalletAdapter {
    pub fn wallet_type(&self) -> WalletType {
        match self {
            WalletAdapter::Evm(_) => WalletType::Metamask,
            WalletAdapter::Solana(_) => WalletType::Phantom,
            WalletAdapter::Relay(_) => WalletType::Walletconnect,
        }
    }

    /// Prompt the wallet for connection, returning the active address.
    pub async fn connect(&mut self) -> Result<String, WalletError> {
        match self {
            WalletAdapter::Evm(a) => a.connect().await,
            WalletAdapter::Solana(a) => a.connect().await,
            WalletAdapter::Relay(a) => a.connect().await,
        }
    }

    /// Re-attach to an existing wallet session without prompting.
    pub async fn resume(&mut self) -> Result<String, WalletError> {
        match self {
            WalletAdapter::Evm(a) => a.resume().await,
            WalletAdapter::Solana(a) => a.resume().await,
            WalletAdapter::Relay(a) => a.resume().await,
        }
    }

    /// Tear down the connection. Always clears local state; remote failures
    /// are logged and swallowed.
    pub async fn disconnect(&mut self) {
        match self {
            WalletAdapter::Evm(a) => a.disconnect(),
            WalletAdapter::Solana(a) => a.disconnect().await,
            WalletAdapter::Relay(a) => a.disconnect().await,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            WalletAdapter::Evm(a) => a.address(),
            WalletAdapter::Solana(a) => a.address(),
            WalletAdapter::Relay(a) => a.address(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address().is_some()
    }

    /// Sign a message with the active account, returning the signature as a
    /// hex string.
    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        match self {
            WalletAdapter::Evm(a) => a.sign_message(message).await,
            WalletAdapter::Solana(a) => a.sign_message(message).await,
            WalletAdapter::Relay(a) => a.sign_message(message).await,
        }
    }

    /// Balance of the active account in the chain's display unit (ETH, MATIC
    /// or SOL), formatted as a decimal string.
    pub async fn get_balance(&self) -> Result<String, WalletError> {
        match self {
            WalletAdapter::Evm(a) => a.get_balance().await,
            WalletAdapter::Solana(a) => a.get_balance().await,
            WalletAdapter::Relay(a) => a.get_balance().await,
        }
    }

    /// Chain identifier in the family's native representation.
    pub async fn get_chain_id(&self) -> Result<ChainId, WalletError> {
        match self {
            WalletAdapter::Evm(a) => a.get_chain_id().await,
            WalletAdapter::Solana(a) => a.get_chain_id(),
            WalletAdapter::Relay(a) => a.get_chain_id(),
        }
    }

    /// Ask the wallet to switch to another network. Only the EVM adapter can
    /// honor this.
    pub async fn switch_network(&self, network: NetworkType) -> Result<(), WalletError> {
        match self {
            WalletAdapter::Evm(a) => a.switch_network(network).await,
            WalletAdapter::Solana(a) => a.switch_network(network),
            WalletAdapter::Relay(a) => a.switch_network(network),
        }
    }
}

/// Parse a hex quantity (with or without `0x` prefix) into a u128.
pub(crate) fn parse_hex_u128(value: &str) -> Result<u128, WalletError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| WalletError::Provider(format!("malformed hex quantity: {value}")))
}

/// Format a base-unit amount (wei, lamports) as a decimal string in the
/// display unit, trimming trailing zeros: 1_500_000_000_000_000_000 wei
/// formats as "1.5", zero as "0".
pub(crate) fn format_units(amount: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}
