// ============================================================================
// WORD-PAYMENTS - Horizon API Client
// ============================================================================
// HTTP client for Stellar's Horizon API, behind the Ledger trait so the
// workflow components can be driven against a fake ledger in tests.
// Handles account queries, fee stats, transaction submission, and friendbot.
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StellarConfig;
use crate::error::DistributionError;
use crate::Result;

// ============================================================================
// DATA TYPES
// ============================================================================

/// Account balance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// Asset type: "native" for XLM, "credit_alphanum4" or "credit_alphanum12" for tokens
    pub asset_type: String,

    /// Asset code (empty for native XLM)
    #[serde(default)]
    pub asset_code: String,

    /// Asset issuer (empty for native XLM)
    #[serde(default)]
    pub asset_issuer: String,

    /// Balance amount as string (Stellar uses string for precision)
    pub balance: String,

    /// Trustline limit (for non-native assets)
    #[serde(default)]
    pub limit: Option<String>,
}

impl Balance {
    /// Check if this is native XLM
    pub fn is_native(&self) -> bool {
        self.asset_type == "native"
    }

    /// Get balance as f64
    pub fn amount(&self) -> f64 {
        self.balance.parse().unwrap_or(0.0)
    }

    /// Check if this matches a specific asset
    pub fn matches_asset(&self, code: &str, issuer: &str) -> bool {
        self.asset_code == code && self.asset_issuer == issuer
    }
}

/// Stellar account information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account public key (G... address)
    pub id: String,

    /// Current sequence number
    pub sequence: String,

    /// Account balances
    pub balances: Vec<Balance>,

    /// Number of subentries (affects minimum balance)
    #[serde(default)]
    pub subentry_count: u32,
}

impl AccountInfo {
    /// Get XLM balance
    pub fn xlm_balance(&self) -> f64 {
        self.balances
            .iter()
            .find(|b| b.is_native())
            .map(|b| b.amount())
            .unwrap_or(0.0)
    }

    /// Get balance for a specific asset
    pub fn asset_balance(&self, code: &str, issuer: &str) -> Option<f64> {
        self.balances
            .iter()
            .find(|b| b.matches_asset(code, issuer))
            .map(|b| b.amount())
    }

    /// Check if account has a trustline for an asset
    pub fn has_trustline(&self, code: &str, issuer: &str) -> bool {
        self.balances.iter().any(|b| b.matches_asset(code, issuer))
    }

    /// Current trustline limit for an asset, if trusted
    pub fn trustline_limit(&self, code: &str, issuer: &str) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| b.matches_asset(code, issuer))
            .and_then(|b| b.limit.as_deref())
    }
}

/// Transaction submission result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub hash: String,

    #[serde(default)]
    pub ledger: u64,

    #[serde(default)]
    pub successful: bool,

    #[serde(default)]
    pub fee_charged: String,
}

/// Fee statistics (only the fields the crate consumes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStats {
    pub last_ledger: String,
    pub last_ledger_base_fee: String,
}

/// Horizon error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonErrorResponse {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub extras: Option<HorizonErrorExtras>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonErrorExtras {
    pub result_codes: Option<ResultCodes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCodes {
    pub transaction: Option<String>,
    pub operations: Option<Vec<String>>,
}

// ============================================================================
// LEDGER TRAIT
// ============================================================================

/// The remote ledger surface the workflow components depend on.
///
/// [`HorizonClient`] is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Load account information, sequence number included
    async fn load_account(&self, address: &str) -> Result<AccountInfo>;

    /// Check if the account exists on the ledger
    async fn account_exists(&self, address: &str) -> Result<bool>;

    /// Current per-operation base fee in stroops
    async fn fetch_base_fee(&self) -> Result<u32>;

    /// Submit a signed transaction envelope (base64 XDR)
    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<TransactionResponse>;

    /// Fund a new account via the network faucet (testnet only)
    async fn friendbot_fund(&self, address: &str) -> Result<()>;
}

// ============================================================================
// HORIZON CLIENT
// ============================================================================

/// Client for Stellar's Horizon API
pub struct HorizonClient {
    config: StellarConfig,
    http: Client,
}

impl HorizonClient {
    /// Create new Horizon client
    pub fn new(config: StellarConfig) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, http }
    }

    /// Create client for testnet
    pub fn testnet() -> Self {
        Self::new(StellarConfig::testnet())
    }

    /// Create client for the public network
    pub fn pubnet() -> Self {
        Self::new(StellarConfig::pubnet())
    }

    /// Get configuration
    pub fn config(&self) -> &StellarConfig {
        &self.config
    }

    fn unexpected_status(status: u16, body: String) -> DistributionError {
        DistributionError::Transport {
            status,
            detail: body,
        }
    }
}

#[async_trait]
impl Ledger for HorizonClient {
    async fn load_account(&self, address: &str) -> Result<AccountInfo> {
        let url = format!("{}/accounts/{}", self.config.horizon_url, address);

        debug!("Loading account: {}", address);

        let response = self.http.get(&url).send().await?;

        match response.status().as_u16() {
            200 => {
                let account: AccountInfo = response.json().await?;
                Ok(account)
            }
            404 => Err(DistributionError::AccountNotFound(address.to_string())),
            429 => Err(DistributionError::RateLimited),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Self::unexpected_status(status, error_text))
            }
        }
    }

    async fn account_exists(&self, address: &str) -> Result<bool> {
        let url = format!("{}/accounts/{}", self.config.horizon_url, address);

        let response = self.http.get(&url).send().await?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            429 => Err(DistributionError::RateLimited),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Self::unexpected_status(status, error_text))
            }
        }
    }

    async fn fetch_base_fee(&self) -> Result<u32> {
        let url = format!("{}/fee_stats", self.config.horizon_url);

        let response = self.http.get(&url).send().await?;

        match response.status().as_u16() {
            200 => {
                let stats: FeeStats = response.json().await?;
                stats.last_ledger_base_fee.parse::<u32>().map_err(|_| {
                    DistributionError::Serialization(format!(
                        "Unparseable base fee: {}",
                        stats.last_ledger_base_fee
                    ))
                })
            }
            429 => Err(DistributionError::RateLimited),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Self::unexpected_status(status, error_text))
            }
        }
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<TransactionResponse> {
        let url = format!("{}/transactions", self.config.horizon_url);

        debug!("Submitting transaction...");

        let response = self
            .http
            .post(&url)
            .form(&[("tx", envelope_xdr)])
            .send()
            .await?;

        match response.status().as_u16() {
            200 => {
                let tx_response: TransactionResponse = response.json().await?;
                debug!("Transaction successful: {}", tx_response.hash);
                Ok(tx_response)
            }
            status @ 400 => {
                let error: HorizonErrorResponse = response.json().await?;
                let reason = error
                    .extras
                    .and_then(|e| e.result_codes)
                    .map(|rc| format!("tx: {:?}, ops: {:?}", rc.transaction, rc.operations))
                    .unwrap_or_else(|| error.detail.unwrap_or_default());

                warn!("Transaction rejected: {}", reason);
                Err(DistributionError::TransactionRejected { status, reason })
            }
            429 => Err(DistributionError::RateLimited),
            504 => Err(DistributionError::TransactionTimeout),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Self::unexpected_status(status, error_text))
            }
        }
    }

    async fn friendbot_fund(&self, address: &str) -> Result<()> {
        let friendbot_url = self.config.friendbot_url().ok_or_else(|| {
            DistributionError::UnsupportedNetwork(self.config.network.to_string())
        })?;

        let url = format!("{}?addr={}", friendbot_url, address);

        debug!("Requesting friendbot funding for: {}", address);

        let response = self.http.get(&url).send().await?;

        match response.status().as_u16() {
            200 => {
                debug!("Friendbot funded account: {}", address);
                Ok(())
            }
            429 => Err(DistributionError::RateLimited),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Self::unexpected_status(status, error_text))
            }
        }
    }
}
