// ============================================================================
// WORD-PAYMENTS - Error Types & Result Normalization
// ============================================================================
// One error taxonomy for the whole crate, plus the OperationResult shape that
// every submitting operation returns: {id, status_code, error_message}.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistributionError {
    // ==================== Key Errors ====================
    #[error("Invalid Stellar address: {0}")]
    InvalidAddress(String),

    #[error("Invalid secret seed")]
    InvalidSecretSeed,

    // ==================== Account Errors ====================
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // ==================== Provisioning Errors ====================
    #[error("Account provisioning failed: {0}")]
    Provision(String),

    #[error("No provisioning strategy for network {0}")]
    UnsupportedNetwork(String),

    // ==================== Trustline Errors ====================
    #[error("Trustline for {asset_code} not established: {reason}")]
    TrustEstablish { asset_code: String, reason: String },

    // ==================== Payment Errors ====================
    #[error("Payment failed: {0}")]
    Payment(String),

    // ==================== Transaction Errors ====================
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Transaction rejected: {reason}")]
    TransactionRejected { status: u16, reason: String },

    #[error("Transaction timeout")]
    TransactionTimeout,

    // ==================== Network Errors ====================
    #[error("Horizon HTTP {status}: {detail}")]
    Transport { status: u16, detail: String },

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Network request failed: {0}")]
    Network(String),

    // ==================== Configuration Errors ====================
    #[error("Distribution account not configured")]
    DistributionNotConfigured,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DistributionError {
    /// HTTP-style status carried by the error, 500 when the failure has no
    /// transport status of its own.
    pub fn status_code(&self) -> u16 {
        match self {
            DistributionError::Transport { status, .. } => *status,
            DistributionError::TransactionRejected { status, .. } => *status,
            DistributionError::AccountNotFound(_) => 404,
            DistributionError::RateLimited => 429,
            DistributionError::TransactionTimeout => 504,
            _ => 500,
        }
    }

    /// Server-provided detail string, when the ledger sent one back.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            DistributionError::Transport { detail, .. } => Some(detail),
            DistributionError::TransactionRejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DistributionError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => DistributionError::Transport {
                status: status.as_u16(),
                detail: err.to_string(),
            },
            None => DistributionError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for DistributionError {
    fn from(err: serde_json::Error) -> Self {
        DistributionError::Serialization(err.to_string())
    }
}

// ============================================================================
// OPERATION RESULT
// ============================================================================

/// Uniform outcome of a submitting operation.
///
/// Successful submissions carry the transaction hash in `id` with status 200;
/// failures carry the transport status (500 when none) and a message built
/// from the error display plus any server-provided detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    /// Transaction hash, absent on failure
    pub id: Option<String>,

    pub status_code: u16,

    pub error_message: String,
}

impl OperationResult {
    /// Successful submission with a transaction hash
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status_code: 200,
            error_message: "No error".to_string(),
        }
    }

    /// Successful step that produced no transaction of its own
    pub fn ok() -> Self {
        Self {
            id: None,
            status_code: 200,
            error_message: "No error".to_string(),
        }
    }

    /// Normalize an error into the uniform result shape
    pub fn failure(err: &DistributionError) -> Self {
        let message = err.to_string();
        let error_message = match err.server_detail() {
            Some(detail) if !message.contains(detail) => format!("{} - {}", message, detail),
            _ if message.is_empty() => "Unknown Error".to_string(),
            _ => message,
        };

        Self {
            id: None,
            status_code: err.status_code(),
            error_message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
