//! Multi-wallet connection core
//!
//! A closed set of wallet integrations (browser-injected EVM extension,
//! injected Solana extension, relay-based multi-wallet bridge) behind one
//! capability surface, orchestrated by [`WalletService`] with at most one
//! adapter active at a time. [`WalletContext`] is the reactive facade the UI
//! layer reads; it never lets an error cross the boundary as anything other
//! than a human-readable string on the session.

use serde::{Deserialize, Serialize};

pub mod adapters;
pub mod error;
pub mod provider;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use adapters::WalletAdapter;
pub use error::{ProviderError, WalletError};
pub use provider::{EvmProvider, RelayProvider, SolanaProvider, SolanaRpc, WalletEnvironment};
pub use service::WalletService;
pub use session::{WalletContext, WalletSession};

/// Supported wallet integrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    Metamask,
    Phantom,
    Walletconnect,
}

impl WalletType {
    pub fn name(&self) -> &'static str {
        match self {
            WalletType::Metamask => "MetaMask",
            WalletType::Phantom => "Phantom",
            WalletType::Walletconnect => "WalletConnect",
        }
    }

    /// Networks this wallet family can operate on
    pub fn supported_networks(&self) -> &'static [NetworkType] {
        match self {
            WalletType::Metamask => &[NetworkType::Ethereum, NetworkType::Polygon],
            WalletType::Phantom => &[NetworkType::Solana],
            WalletType::Walletconnect => &[NetworkType::Ethereum, NetworkType::Polygon],
        }
    }
}

impl std::fmt::Display for WalletType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Ethereum,
    Polygon,
    Solana,
}

impl NetworkType {
    /// Map an adapter-reported chain identifier to a network.
    ///
    /// EVM adapters report hex chain ids ("0x1", "0x89"), the relay bridge
    /// reports decimal ids (1, 137) and the Solana adapter reports the
    /// cluster name ("mainnet-beta").
    pub fn from_chain_id(chain_id: &ChainId) -> Option<NetworkType> {
        match chain_id {
            ChainId::Hex(s) if s == "0x1" => Some(NetworkType::Ethereum),
            ChainId::Hex(s) if s == "0x89" => Some(NetworkType::Polygon),
            ChainId::Decimal(1) => Some(NetworkType::Ethereum),
            ChainId::Decimal(137) => Some(NetworkType::Polygon),
            ChainId::Name(s) if s == SOLANA_NETWORK => Some(NetworkType::Solana),
            _ => None,
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetworkType::Ethereum => "ethereum",
            NetworkType::Polygon => "polygon",
            NetworkType::Solana => "solana",
        };
        f.write_str(s)
    }
}

/// Chain identifier in the representation native to each adapter family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainId {
    /// EVM hex id, e.g. "0x1"
    Hex(String),
    /// Relay-bridge decimal id, e.g. 137
    Decimal(u64),
    /// Solana cluster name, e.g. "mainnet-beta"
    Name(String),
}

/// Static descriptor for one supported wallet
#[derive(Debug, Clone, Serialize)]
pub struct WalletInfo {
    pub id: WalletType,
    pub name: &'static str,
    pub description: &'static str,
    pub networks: &'static [NetworkType],
    pub install_url: Option<&'static str>,
}

/// The closed list of wallets the platform offers
pub const SUPPORTED_WALLETS: &[WalletInfo] = &[
    WalletInfo {
        id: WalletType::Metamask,
        name: "MetaMask",
        description: "Connect with the MetaMask browser extension",
        networks: &[NetworkType::Ethereum, NetworkType::Polygon],
        install_url: Some("https://metamask.io/download/"),
    },
    WalletInfo {
        id: WalletType::Phantom,
        name: "Phantom",
        description: "Connect with the Phantom browser extension",
        networks: &[NetworkType::Solana],
        install_url: Some("https://phantom.app/download"),
    },
    WalletInfo {
        id: WalletType::Walletconnect,
        name: "WalletConnect",
        description: "Connect any mobile wallet over the relay bridge",
        networks: &[NetworkType::Ethereum, NetworkType::Polygon],
        install_url: None,
    },
];

/// Parameters needed to register an EVM chain with a wallet
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub chain_id: &'static str,
    pub chain_name: &'static str,
    pub currency_name: &'static str,
    pub currency_symbol: &'static str,
    pub currency_decimals: u8,
    pub rpc_urls: &'static [&'static str],
    pub block_explorer_urls: &'static [&'static str],
}

const ETHEREUM_CONFIG: NetworkConfig = NetworkConfig {
    chain_id: "0x1",
    chain_name: "Ethereum Mainnet",
    currency_name: "Ether",
    currency_symbol: "ETH",
    currency_decimals: 18,
    rpc_urls: &["https://mainnet.infura.io/v3/"],
    block_explorer_urls: &["https://etherscan.io"],
};

const POLYGON_CONFIG: NetworkConfig = NetworkConfig {
    chain_id: "0x89",
    chain_name: "Polygon Mainnet",
    currency_name: "MATIC",
    currency_symbol: "MATIC",
    currency_decimals: 18,
    rpc_urls: &["https://polygon-rpc.com/"],
    block_explorer_urls: &["https://polygonscan.com/"],
};

/// Chain registration parameters for the EVM networks; Solana has no
/// equivalent (clusters are chosen in the wallet, not the dapp).
pub fn network_config(network: NetworkType) -> Option<&'static NetworkConfig> {
    match network {
        NetworkType::Ethereum => Some(&ETHEREUM_CONFIG),
        NetworkType::Polygon => Some(&POLYGON_CONFIG),
        NetworkType::Solana => None,
    }
}

/// Solana cluster the platform targets
pub const SOLANA_NETWORK: &str = "mainnet-beta";

/// JSON-RPC endpoint for a Solana cluster name
pub fn solana_rpc_url(network: &str) -> &'static str {
    match network {
        "mainnet-beta" => "https://api.mainnet-beta.solana.com",
        "devnet" => "https://api.devnet.solana.com",
        "testnet" => "https://api.testnet.solana.com",
        _ => "https://api.mainnet-beta.solana.com",
    }
}
