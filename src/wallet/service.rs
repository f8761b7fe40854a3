use super::adapters::{EvmAdapter, RelayAdapter, SolanaAdapter, WalletAdapter};
use super::error::WalletError;
use super::provider::WalletEnvironment;
use super::{ChainId, NetworkType, WalletType};

/// Orchestrates the wallet adapters, holding at most one active connection.
///
/// Connecting a new wallet always tears down the previous one first, so a
/// failed connection leaves the service with no active adapter rather than a
/// half-open one.
#[derive(Debug)]
pub struct WalletService {
    env: WalletEnvironment,
    current: Option<WalletAdapter>,
}

impl WalletService {
    pub fn new(env: WalletEnvironment) -> Self {
        WalletService { env, current: None }
    }

    pub fn environment(&self) -> &WalletEnvironment {
        &self.env
    }

    fn build_adapter(&self, wallet_type: WalletType) -> WalletAdapter {
        match wallet_type {
            WalletType::Metamask => WalletAdapter::Evm(EvmAdapter::new(self.env.ethereum.clone())),
            WalletType::Phantom => WalletAdapter::Solana(SolanaAdapter::new(
                self.env.solana.clone(),
                self.env.solana_rpc.clone(),
            )),
            WalletType::Walletconnect => {
                WalletAdapter::Relay(RelayAdapter::new(self.env.relay.clone()))
            }
        }
    }

    /// Connect a wallet of the given type, disconnecting any active one
    /// first.
    pub async fn connect(&mut self, wallet_type: WalletType) -> Result<String, WalletError> {
        if let Some(mut previous) = self.current.take() {
            previous.disconnect().await;
        }
        let mut adapter = self.build_adapter(wallet_type);
        let address = adapter.connect().await?;
        tracing::info!(wallet = %wallet_type, %address, "wallet connected");
        self.current = Some(adapter);
        Ok(address)
    }

    /// Silently re-attach to a wallet session left over from a previous run.
    pub async fn resume(&mut self, wallet_type: WalletType) -> Result<String, WalletError> {
        if let Some(mut previous) = self.current.take() {
            previous.disconnect().await;
        }
        let mut adapter = self.build_adapter(wallet_type);
        let address = adapter.resume().await?;
        tracing::info!(wallet = %wallet_type, %address, "wallet session resumed");
        self.current = Some(adapter);
        Ok(address)
    }

    pub async fn disconnect(&mut self) {
        if let Some(mut adapter) = self.current.take() {
            adapter.disconnect().await;
            tracing::info!("wallet disconnected");
        }
    }

    fn active(&self) -> Result<&WalletAdapter, WalletError> {
        self.current.as_ref().ok_or(WalletError::NotConnected)
    }

    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.active()?.sign_message(message).await
    }

    pub async fn get_balance(&self) -> Result<String, WalletError> {
        self.active()?.get_balance().await
    }

    /// Chain id of the active connection, `None` when no adapter is active.
    pub async fn get_chain_id(&self) -> Result<Option<ChainId>, WalletError> {
        match &self.current {
            Some(adapter) => adapter.get_chain_id().await.map(Some),
            None => Ok(None),
        }
    }

    /// Network of the active connection, `None` when disconnected or when
    /// the wallet reports a chain the platform does not recognize.
    pub async fn current_network(&self) -> Result<Option<NetworkType>, WalletError> {
        let chain_id = self.get_chain_id().await?;
        Ok(chain_id.as_ref().and_then(NetworkType::from_chain_id))
    }

    /// Switch the active wallet to another network.
    ///
    /// The compatibility matrix is enforced here: Solana is reachable only
    /// through Phantom and Phantom reaches nothing else. Targets that pass
    /// it are delegated to the adapter, so a Solana switch on Phantom still
    /// fails with the adapter's fixed unsupported error.
    pub async fn switch_network(&mut self, network: NetworkType) -> Result<(), WalletError> {
        let adapter = self.current.as_ref().ok_or(WalletError::NotConnected)?;
        match network {
            NetworkType::Solana if adapter.wallet_type() != WalletType::Phantom => {
                Err(WalletError::IncompatibleNetwork(
                    "Please connect Phantom wallet for Solana network".into(),
                ))
            }
            NetworkType::Ethereum | NetworkType::Polygon
                if adapter.wallet_type() == WalletType::Phantom =>
            {
                Err(WalletError::IncompatibleNetwork(
                    "Phantom wallet only supports Solana network".into(),
                ))
            }
            _ => adapter.switch_network(network).await,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.current.as_ref().and_then(WalletAdapter::address)
    }

    pub fn is_connected(&self) -> bool {
        self.current.as_ref().is_some_and(WalletAdapter::is_connected)
    }

    pub fn current_wallet_type(&self) -> Option<WalletType> {
        self.current.as_ref().map(WalletAdapter::wallet_type)
    }

    /// Whether the wallet's provider is present in the environment. The
    /// relay bridge needs no extension, so it always counts as installed.
    pub fn is_wallet_installed(&self, wallet_type: WalletType) -> bool {
        match wallet_type {
            WalletType::Metamask => self
                .env
                .ethereum
                .as_ref()
                .is_some_and(|p| p.is_metamask()),
            WalletType::Phantom => self.env.solana.as_ref().is_some_and(|p| p.is_phantom()),
            WalletType::Walletconnect => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::wallet::mock::{full_environment, MockEvmProvider, MockSolanaProvider};

    #[tokio::test]
    async fn test_connecting_second_wallet_disconnects_first() {
        let (env, evm, solana, _) = full_environment();
        let mut service = WalletService::new(env);

        service.connect(WalletType::Phantom).await.unwrap();
        assert_eq!(service.current_wallet_type(), Some(WalletType::Phantom));

        let address = service.connect(WalletType::Metamask).await.unwrap();
        assert_eq!(address, evm.address());
        assert_eq!(service.current_wallet_type(), Some(WalletType::Metamask));
        assert_eq!(solana.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_active_adapter() {
        let evm = Arc::new(MockEvmProvider::with_random_key().failing_with(4001));
        let solana = Arc::new(MockSolanaProvider::new("pubkey11111111111111111111111111"));
        let env = WalletEnvironment::new()
            .with_ethereum(evm)
            .with_solana(solana.clone());
        let mut service = WalletService::new(env);

        service.connect(WalletType::Phantom).await.unwrap();
        let err = service.connect(WalletType::Metamask).await.unwrap_err();
        assert!(matches!(err, WalletError::UserRejected));

        assert!(!service.is_connected());
        assert_eq!(service.current_wallet_type(), None);
        assert_eq!(solana.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn test_switch_matrix_rejects_solana_without_phantom() {
        let (env, _, _, _) = full_environment();
        let mut service = WalletService::new(env);
        service.connect(WalletType::Metamask).await.unwrap();

        let err = service.switch_network(NetworkType::Solana).await.unwrap_err();
        match err {
            WalletError::IncompatibleNetwork(msg) => {
                assert_eq!(msg, "Please connect Phantom wallet for Solana network")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_switch_matrix_rejects_evm_targets_on_phantom() {
        let (env, _, _, _) = full_environment();
        let mut service = WalletService::new(env);
        service.connect(WalletType::Phantom).await.unwrap();

        let err = service.switch_network(NetworkType::Polygon).await.unwrap_err();
        match err {
            WalletError::IncompatibleNetwork(msg) => {
                assert_eq!(msg, "Phantom wallet only supports Solana network")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_switch_to_solana_on_phantom_fails_unsupported() {
        let (env, _, solana, _) = full_environment();
        let mut service = WalletService::new(env);
        service.connect(WalletType::Phantom).await.unwrap();

        let err = service.switch_network(NetworkType::Solana).await.unwrap_err();
        assert!(matches!(err, WalletError::Unsupported(_)));

        // The failed switch leaves the session standing.
        assert!(service.is_connected());
        assert_eq!(solana.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn test_switch_evm_network_updates_chain() {
        let (env, _, _, _) = full_environment();
        let mut service = WalletService::new(env);
        service.connect(WalletType::Metamask).await.unwrap();

        service.switch_network(NetworkType::Polygon).await.unwrap();
        assert_eq!(
            service.get_chain_id().await.unwrap(),
            Some(ChainId::Hex("0x89".into()))
        );
        assert_eq!(
            service.current_network().await.unwrap(),
            Some(NetworkType::Polygon)
        );
    }

    #[tokio::test]
    async fn test_chain_id_is_none_when_disconnected() {
        let (env, _, _, _) = full_environment();
        let service = WalletService::new(env);
        assert_eq!(service.get_chain_id().await.unwrap(), None);
        assert_eq!(service.current_network().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_switch_without_connection_fails() {
        let (env, _, _, _) = full_environment();
        let mut service = WalletService::new(env);
        let err = service.switch_network(NetworkType::Ethereum).await.unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
    }

    #[tokio::test]
    async fn test_installation_probe() {
        let (env, _, _, _) = full_environment();
        let service = WalletService::new(env);
        assert!(service.is_wallet_installed(WalletType::Metamask));
        assert!(service.is_wallet_installed(WalletType::Phantom));
        assert!(service.is_wallet_installed(WalletType::Walletconnect));

        let empty = WalletService::new(WalletEnvironment::new());
        assert!(!empty.is_wallet_installed(WalletType::Metamask));
        assert!(!empty.is_wallet_installed(WalletType::Phantom));
        // Relay needs no extension.
        assert!(empty.is_wallet_installed(WalletType::Walletconnect));
    }

    #[tokio::test]
    async fn test_probe_rejects_foreign_evm_provider() {
        let evm = Arc::new(MockEvmProvider::with_random_key().metamask(false));
        let env = WalletEnvironment::new().with_ethereum(evm);
        let service = WalletService::new(env);
        assert!(!service.is_wallet_installed(WalletType::Metamask));
    }

    #[tokio::test]
    async fn test_resume_does_not_prompt() {
        let (env, evm, _, _) = full_environment();
        let mut service = WalletService::new(env);

        let address = service.resume(WalletType::Metamask).await.unwrap();
        assert_eq!(address, evm.address());
        assert!(evm.saw_method("eth_accounts"));
        assert!(!evm.saw_method("eth_requestAccounts"));
    }

    #[tokio::test]
    async fn test_sign_without_connection_fails() {
        let (env, _, _, _) = full_environment();
        let service = WalletService::new(env);
        let err = service.sign_message("hello").await.unwrap_err();
        assert!(matches!(err, WalletError::NotConnected));
    }
}
