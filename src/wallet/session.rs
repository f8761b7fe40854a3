use serde::Serialize;

use super::error::WalletError;
use super::service::WalletService;
use super::{NetworkType, WalletInfo, WalletType, SUPPORTED_WALLETS};

/// Snapshot of the wallet connection as the UI layer sees it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalletSession {
    pub connected: bool,
    pub address: Option<String>,
    pub wallet_type: Option<WalletType>,
    pub balance: Option<String>,
    pub network_type: Option<NetworkType>,
    pub connecting: bool,
    pub last_error: Option<String>,
}

/// Facade over [`WalletService`] that keeps a [`WalletSession`] snapshot in
/// sync, absorbing every error into `last_error` so nothing fallible crosses
/// this boundary.
#[derive(Debug)]
pub struct WalletContext {
    service: WalletService,
    session: WalletSession,
}

impl WalletContext {
    pub fn new(service: WalletService) -> Self {
        WalletContext {
            service,
            session: WalletSession::default(),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn service(&self) -> &WalletService {
        &self.service
    }

    /// Populate the session from a service that is already connected, e.g.
    /// after a silent resume. Balance and network are refreshed best-effort;
    /// fetch failures are logged and leave the fields unset.
    pub async fn hydrate(&mut self) {
        if !self.service.is_connected() {
            return;
        }
        self.session.connected = true;
        self.session.address = self.service.address().map(str::to_owned);
        self.session.wallet_type = self.service.current_wallet_type();

        match self.service.get_balance().await {
            Ok(balance) => self.session.balance = Some(balance),
            Err(err) => tracing::warn!("balance refresh failed during hydrate: {}", err),
        }
        match self.service.current_network().await {
            Ok(network) => self.session.network_type = network,
            Err(err) => tracing::warn!("network detection failed during hydrate: {}", err),
        }
    }

    /// Connect a wallet and commit the full session snapshot, or record the
    /// error and leave the previous snapshot untouched. Returns whether the
    /// connection succeeded.
    pub async fn connect(&mut self, wallet_type: WalletType) -> bool {
        self.session.connecting = true;
        self.session.last_error = None;

        let outcome = self.connect_and_gather(wallet_type).await;
        self.session.connecting = false;

        match outcome {
            Ok((address, balance, network)) => {
                self.session.connected = true;
                self.session.address = Some(address);
                self.session.wallet_type = Some(wallet_type);
                self.session.balance = Some(balance);
                self.session.network_type = network;
                true
            }
            Err(err) => {
                tracing::warn!(wallet = %wallet_type, "wallet connection failed: {}", err);
                self.session.last_error = Some(err.to_string());
                false
            }
        }
    }

    async fn connect_and_gather(
        &mut self,
        wallet_type: WalletType,
    ) -> Result<(String, String, Option<NetworkType>), WalletError> {
        let address = self.service.connect(wallet_type).await?;
        let balance = self.service.get_balance().await?;
        let network = self.service.current_network().await?;
        Ok((address, balance, network))
    }

    pub async fn disconnect(&mut self) {
        self.service.disconnect().await;
        self.session = WalletSession::default();
    }

    /// Sign with the connected wallet; on failure the error lands on the
    /// session and `None` is returned.
    pub async fn sign_message(&mut self, message: &str) -> Option<String> {
        match self.service.sign_message(message).await {
            Ok(signature) => Some(signature),
            Err(err) => {
                self.session.last_error = Some(err.to_string());
                None
            }
        }
    }

    /// Switch networks, updating the session on success. Returns whether the
    /// switch succeeded.
    pub async fn switch_network(&mut self, network: NetworkType) -> bool {
        match self.service.switch_network(network).await {
            Ok(()) => {
                self.session.network_type = Some(network);
                true
            }
            Err(err) => {
                self.session.last_error = Some(err.to_string());
                false
            }
        }
    }

    /// The subset of supported wallets whose provider is actually present.
    pub fn installed_wallets(&self) -> Vec<&'static WalletInfo> {
        SUPPORTED_WALLETS
            .iter()
            .filter(|info| self.service.is_wallet_installed(info.id))
            .collect()
    }
}
