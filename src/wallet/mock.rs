//! Provider doubles for tests. The EVM mock signs with a real secp256k1 key
//! so signature verification paths can be exercised end to end.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};

use super::error::ProviderError;
use super::provider::{EvmProvider, RelayProvider, SolanaProvider, SolanaRpc};

fn eth_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let digest: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();
    format!("0x{}", hex::encode(&digest[12..]))
}

#[derive(Default)]
struct MockEvmState {
    chain_id: String,
    added_chains: Vec<String>,
    calls: Vec<String>,
}

pub(crate) struct MockEvmProvider {
    key: SigningKey,
    address: String,
    is_metamask: bool,
    has_accounts: bool,
    authorized: bool,
    fail_code: Option<i64>,
    unrecognized_chains: bool,
    balance_wei: u128,
    state: Mutex<MockEvmState>,
}

impl MockEvmProvider {
    pub fn with_random_key() -> Self {
        Self::with_key(SigningKey::random(&mut OsRng))
    }

    pub fn with_key(key: SigningKey) -> Self {
        let address = eth_address(key.verifying_key());
        MockEvmProvider {
            key,
            address,
            is_metamask: true,
            has_accounts: true,
            authorized: true,
            fail_code: None,
            unrecognized_chains: false,
            balance_wei: 0,
            state: Mutex::new(MockEvmState {
                chain_id: "0x1".into(),
                ..Default::default()
            }),
        }
    }

    pub fn metamask(mut self, yes: bool) -> Self {
        self.is_metamask = yes;
        self
    }

    /// Every request fails with the given provider code.
    pub fn failing_with(mut self, code: i64) -> Self {
        self.fail_code = Some(code);
        self
    }

    pub fn without_accounts(mut self) -> Self {
        self.has_accounts = false;
        self
    }

    /// `eth_accounts` returns nothing until a fresh `eth_requestAccounts`.
    pub fn unauthorized(mut self) -> Self {
        self.authorized = false;
        self
    }

    /// Chain switches fail with 4902 until the chain has been registered.
    pub fn unrecognized_chains(mut self) -> Self {
        self.unrecognized_chains = true;
        self
    }

    pub fn balance_wei(mut self, wei: u128) -> Self {
        self.balance_wei = wei;
        self
    }

    pub fn address(&self) -> String {
        self.address.clone()
    }

    pub fn saw_method(&self, method: &str) -> bool {
        self.state.lock().unwrap().calls.iter().any(|m| m == method)
    }

    pub fn calls_of(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|m| *m == method)
            .count()
    }

    fn accounts(&self) -> Value {
        if self.has_accounts {
            json!([self.address])
        } else {
            json!([])
        }
    }

    fn personal_sign(&self, message: &str) -> String {
        let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
        let digest: [u8; 32] = Keccak256::digest(prefixed.as_bytes()).into();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .expect("signing cannot fail with a valid key");
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }
}

#[async_trait]
impl EvmProvider for MockEvmProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.state.lock().unwrap().calls.push(method.to_owned());
        if let Some(code) = self.fail_code {
            return Err(ProviderError::new(code, "mock failure"));
        }

        match method {
            "eth_requestAccounts" => Ok(self.accounts()),
            "eth_accounts" => {
                if self.authorized {
                    Ok(self.accounts())
                } else {
                    Ok(json!([]))
                }
            }
            "personal_sign" => {
                let message = params
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::new(-32602, "missing message param"))?;
                Ok(json!(self.personal_sign(message)))
            }
            "eth_getBalance" => Ok(json!(format!("0x{:x}", self.balance_wei))),
            "eth_chainId" => {
                let chain_id = self.state.lock().unwrap().chain_id.clone();
                Ok(json!(chain_id))
            }
            "wallet_switchEthereumChain" => {
                let target = params
                    .pointer("/0/chainId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::new(-32602, "missing chainId param"))?
                    .to_owned();
                let mut state = self.state.lock().unwrap();
                if self.unrecognized_chains && !state.added_chains.contains(&target) {
                    return Err(ProviderError::new(4902, "Unrecognized chain ID"));
                }
                state.chain_id = target;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let target = params
                    .pointer("/0/chainId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::new(-32602, "missing chainId param"))?
                    .to_owned();
                let mut state = self.state.lock().unwrap();
                state.added_chains.push(target.clone());
                state.chain_id = target;
                Ok(Value::Null)
            }
            other => Err(ProviderError::new(-32601, format!("method not found: {other}"))),
        }
    }

    fn is_metamask(&self) -> bool {
        self.is_metamask
    }
}

pub(crate) struct MockSolanaProvider {
    pubkey: String,
    is_phantom: bool,
    connected: AtomicBool,
    fail_disconnect: bool,
    disconnect_calls: AtomicUsize,
}

impl MockSolanaProvider {
    pub fn new(pubkey: &str) -> Self {
        MockSolanaProvider {
            pubkey: pubkey.to_owned(),
            is_phantom: true,
            connected: AtomicBool::new(false),
            fail_disconnect: false,
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    pub fn phantom(mut self, yes: bool) -> Self {
        self.is_phantom = yes;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SolanaProvider for MockSolanaProvider {
    fn is_phantom(&self) -> bool {
        self.is_phantom
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn public_key(&self) -> Option<String> {
        if self.is_connected() {
            Some(self.pubkey.clone())
        } else {
            None
        }
    }

    async fn connect(&self) -> Result<String, ProviderError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.pubkey.clone())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        if self.fail_disconnect {
            Err(ProviderError::new(-32000, "mock disconnect failure"))
        } else {
            Ok(())
        }
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        Ok(Keccak256::digest(message).to_vec())
    }
}

pub(crate) struct MockSolanaRpc {
    lamports: u64,
}

impl MockSolanaRpc {
    pub fn new(lamports: u64) -> Self {
        MockSolanaRpc { lamports }
    }
}

#[async_trait]
impl SolanaRpc for MockSolanaRpc {
    async fn get_balance(&self, _pubkey: &str) -> Result<u64, ProviderError> {
        Ok(self.lamports)
    }
}

pub(crate) struct MockRelayProvider {
    address: String,
    chain_id: u64,
    balance_wei: u128,
    disconnect_calls: AtomicUsize,
}

impl MockRelayProvider {
    pub fn new(address: &str, chain_id: u64) -> Self {
        MockRelayProvider {
            address: address.to_owned(),
            chain_id,
            balance_wei: 0,
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    pub fn balance_wei(mut self, wei: u128) -> Self {
        self.balance_wei = wei;
        self
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayProvider for MockRelayProvider {
    async fn enable(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec![self.address.clone()])
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "personal_sign" => {
                let message = params
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::new(-32602, "missing message param"))?;
                let digest: [u8; 32] = Keccak256::digest(message.as_bytes()).into();
                Ok(json!(format!("0x{}", hex::encode(digest))))
            }
            "eth_getBalance" => Ok(json!(format!("0x{:x}", self.balance_wei))),
            other => Err(ProviderError::new(-32601, format!("method not found: {other}"))),
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// Environment with every provider slot filled, for service-level tests.
pub(crate) fn full_environment() -> (
    super::WalletEnvironment,
    Arc<MockEvmProvider>,
    Arc<MockSolanaProvider>,
    Arc<MockRelayProvider>,
) {
    let evm = Arc::new(MockEvmProvider::with_random_key());
    let solana = Arc::new(MockSolanaProvider::new(
        "7sPmVzqXBpvVEbGyZ3AsXN1TmJtPjFEKsYz4BGQWBCWf",
    ));
    let relay = Arc::new(MockRelayProvider::new(
        "0x9fc3da866e7df3a1c57ade1a97c9f00a70f010c8",
        1,
    ));
    let env = super::WalletEnvironment::new()
        .with_ethereum(evm.clone())
        .with_solana(solana.clone())
        .with_solana_rpc(Arc::new(MockSolanaRpc::new(0)))
        .with_relay(relay.clone());
    (env, evm, solana, relay)
}
