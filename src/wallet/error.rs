use thiserror::Error;

/// Error surfaced by a raw provider call, carrying the provider's
/// numeric error code when one was given.
#[derive(Debug, Clone, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ProviderError {
            code,
            message: message.into(),
        }
    }
}

/// Wallet operation failures. Provider error codes are normalized here so
/// callers never have to match on raw numbers: 4001 is a user rejection,
/// -32002 means a request for the same wallet is already pending.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("{0} is not installed. Please install it to continue.")]
    NotInstalled(&'static str),

    #[error("Connection request was rejected")]
    UserRejected,

    #[error("Connection request already pending. Please check your wallet.")]
    AlreadyPending,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("{0}")]
    IncompatibleNetwork(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("No accounts returned by wallet")]
    NoAccounts,

    #[error("Wallet provider error: {0}")]
    Provider(String),
}

impl WalletError {
    /// Normalize a raw provider error into the wallet taxonomy.
    pub fn from_provider(err: ProviderError) -> WalletError {
        match err.code {
            4001 => WalletError::UserRejected,
            -32002 => WalletError::AlreadyPending,
            _ => WalletError::Provider(err.message),
        }
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        WalletError::from_provider(err)
    }
}
