//! Wallet-based authentication.
//!
//! Identity is the lowercased wallet address. A login proves control of the
//! address by signing a nonce challenge with `personal_sign`; the signature
//! is verified by recovering the secp256k1 public key from the EIP-191
//! prefixed hash and comparing the derived address. Users are created on
//! first login with names derived from the address suffix.

use std::sync::Arc;

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use sqlx::PgPool;
use thiserror::Error;

use crate::models::User;
use crate::wallet::provider::EvmProvider;
use crate::wallet::WalletError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No wallet found. Please install MetaMask to continue.")]
    NoWalletFound,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User store error: {0}")]
    Store(String),

    #[error("Signature was not produced by {address}")]
    SignatureMismatch { address: String },

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
}

/// Persistence seam for user records keyed by wallet address.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_wallet(&self, address: &str) -> Result<Option<User>, AuthError>;

    async fn create_from_wallet(
        &self,
        address: &str,
        username: &str,
        display_name: &str,
    ) -> Result<User, AuthError>;
}

/// Postgres-backed user store.
///
/// `wallet_address` carries a unique key, so two racing first logins for the
/// same address surface as a database error on the slower insert instead of
/// a duplicate row.
pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgUserStore { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_wallet(&self, address: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE wallet_address = $1")
            .bind(address)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(user)
    }

    async fn create_from_wallet(
        &self,
        address: &str,
        username: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (wallet_address, username, display_name)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(address)
        .bind(username)
        .bind(display_name)
        .fetch_one(&*self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub user: User,
    pub is_new_user: bool,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    ethereum: Option<Arc<dyn EvmProvider>>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, ethereum: Option<Arc<dyn EvmProvider>>) -> Self {
        AuthService { store, ethereum }
    }

    fn provider(&self) -> Result<&Arc<dyn EvmProvider>, AuthError> {
        let provider = self.ethereum.as_ref().ok_or(AuthError::NoWalletFound)?;
        if !provider.is_metamask() {
            return Err(WalletError::NotInstalled("MetaMask").into());
        }
        Ok(provider)
    }

    /// Full wallet login: connect, challenge, verify, and create the user on
    /// first login.
    pub async fn login(&self) -> Result<LoginResult, AuthError> {
        let provider = self.provider()?;

        let accounts = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(WalletError::from)?;
        let address = first_account(&accounts)
            .ok_or(WalletError::NoAccounts)?
            .to_lowercase();

        let existing = self.store.find_by_wallet(&address).await?;
        let is_new_user = existing.is_none();

        let nonce = generate_nonce();
        let message = challenge_message(&nonce);
        let signature = self.sign_challenge(&message).await?;
        verify_personal_sign(&address, &message, &signature)?;

        let user = match existing {
            Some(user) => user,
            None => self.create_user(&address).await?,
        };
        tracing::info!(wallet = %address, is_new_user, "wallet login succeeded");
        Ok(LoginResult { user, is_new_user })
    }

    /// Server-side half of the flow: verify a signature produced elsewhere
    /// and log the address in, creating the user on first login.
    pub async fn verify_and_login(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<LoginResult, AuthError> {
        let address = address.to_lowercase();
        verify_personal_sign(&address, message, signature)?;

        let existing = self.store.find_by_wallet(&address).await?;
        let is_new_user = existing.is_none();
        let user = match existing {
            Some(user) => user,
            None => self.create_user(&address).await?,
        };
        tracing::info!(wallet = %address, is_new_user, "wallet login verified");
        Ok(LoginResult { user, is_new_user })
    }

    /// Look up the user behind the wallet's already-authorized account
    /// without prompting. Never fails; any error means "nobody logged in".
    pub async fn current_user(&self) -> Option<User> {
        let provider = self.provider().ok()?;
        let accounts = provider.request("eth_accounts", json!([])).await.ok()?;
        let address = first_account(&accounts)?.to_lowercase();
        match self.store.find_by_wallet(&address).await {
            Ok(user) => user,
            Err(err) => {
                tracing::debug!("current_user lookup failed: {}", err);
                None
            }
        }
    }

    async fn sign_challenge(&self, message: &str) -> Result<String, AuthError> {
        let provider = self.provider()?;
        let accounts = provider
            .request("eth_accounts", json!([]))
            .await
            .map_err(WalletError::from)?;
        let account = first_account(&accounts).ok_or(WalletError::NoAccounts)?;
        let signature = provider
            .request("personal_sign", json!([message, account]))
            .await
            .map_err(WalletError::from)?;
        signature
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| WalletError::Provider("personal_sign returned a non-string".into()).into())
    }

    async fn create_user(&self, address: &str) -> Result<User, AuthError> {
        let username = format!("user_{}", address_suffix(address, 6));
        let display_name = format!("User {}", address_suffix(address, 4));
        self.store
            .create_from_wallet(address, &username, &display_name)
            .await
    }
}

fn first_account(accounts: &Value) -> Option<String> {
    accounts
        .as_array()
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn address_suffix(address: &str, len: usize) -> &str {
    &address[address.len().saturating_sub(len)..]
}

/// Per-attempt login nonce: 16 bytes from the OS RNG plus a millisecond
/// timestamp.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    format!(
        "saya-auth-{}-{}",
        hex::encode(bytes),
        chrono::Utc::now().timestamp_millis()
    )
}

/// The fixed challenge template the wallet is asked to sign.
pub fn challenge_message(nonce: &str) -> String {
    format!("Welcome to Saya!\n\nSign this message to authenticate.\n\nNonce: {nonce}")
}

/// Check that `signature` is a valid `personal_sign` signature over
/// `message` by `address`.
///
/// The signature is the 65-byte `r || s || v` form produced by EVM wallets;
/// `v` is accepted both raw (0/1) and with the legacy +27 offset. The public
/// key is recovered from the EIP-191 prefixed Keccak-256 hash and reduced to
/// an address, compared case-insensitively.
pub fn verify_personal_sign(
    address: &str,
    message: &str,
    signature: &str,
) -> Result<(), AuthError> {
    let raw = hex::decode(signature.trim_start_matches("0x"))
        .map_err(|e| AuthError::MalformedSignature(format!("invalid hex: {e}")))?;
    if raw.len() != 65 {
        return Err(AuthError::MalformedSignature(format!(
            "expected 65 bytes, got {}",
            raw.len()
        )));
    }

    let mut v = raw[64];
    if v >= 27 {
        v -= 27;
    }
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| AuthError::MalformedSignature(format!("invalid recovery id {}", raw[64])))?;
    let signature = Signature::from_slice(&raw[..64])
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    let prehash = eip191_hash(message);
    let verifying_key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    let recovered = ethereum_address(&verifying_key);
    if recovered.eq_ignore_ascii_case(address) {
        Ok(())
    } else {
        Err(AuthError::SignatureMismatch {
            address: address.to_owned(),
        })
    }
}

/// Keccak-256 over the EIP-191 personal-message envelope.
fn eip191_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()));
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Last 20 bytes of the Keccak-256 of the uncompressed public key.
fn ethereum_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let digest: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();
    format!("0x{}", hex::encode(&digest[12..]))
}
