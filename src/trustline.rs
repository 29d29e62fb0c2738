// ============================================================================
// WORD-PAYMENTS - Asset Trust Establisher
// ============================================================================
// Submits change-trust operations so an account can hold a word asset.
// Like every submitting operation, the outcome is a normalized
// OperationResult; callers never have to catch.

use tracing::{info, warn};

use crate::config::StellarConfig;
use crate::error::{DistributionError, OperationResult};
use crate::horizon::Ledger;
use crate::keys::Keypair;
use crate::transaction::{Asset, TransactionBuilder};
use crate::Result;

/// Request to open (or resize) a trustline
#[derive(Debug, Clone)]
pub struct TrustlineRequest {
    /// Asset code of the word to trust
    pub asset_code: String,

    /// Trust limit as a decimal string, must be positive
    pub limit: String,

    /// Secret seed of the trusting account
    pub signing_secret: String,
}

impl TrustlineRequest {
    pub fn new(asset_code: &str, limit: &str, signing_secret: &str) -> Self {
        Self {
            asset_code: asset_code.to_string(),
            limit: limit.to_string(),
            signing_secret: signing_secret.to_string(),
        }
    }
}

/// Establishes trustlines for word assets
pub struct TrustEstablisher<'a> {
    ledger: &'a dyn Ledger,
    config: &'a StellarConfig,
}

impl<'a> TrustEstablisher<'a> {
    pub fn new(ledger: &'a dyn Ledger, config: &'a StellarConfig) -> Self {
        Self { ledger, config }
    }

    /// Open a trustline for the requested asset, signed by the trusting
    /// account. Always submits: trustline limits are last-write-wins on the
    /// ledger, so repeating a request with a new limit resizes the line.
    pub async fn establish(&self, request: &TrustlineRequest) -> OperationResult {
        match self.try_establish(request).await {
            Ok(hash) => {
                info!(
                    "Trustline established for {} (limit {})",
                    request.asset_code, request.limit
                );
                OperationResult::success(hash)
            }
            Err(e) => {
                warn!("Trustline for {} failed: {}", request.asset_code, e);
                OperationResult::failure(&e)
            }
        }
    }

    async fn try_establish(&self, request: &TrustlineRequest) -> Result<String> {
        let limit: f64 = request.limit.parse().map_err(|_| {
            DistributionError::TrustEstablish {
                asset_code: request.asset_code.clone(),
                reason: format!("limit is not a decimal: {}", request.limit),
            }
        })?;

        if limit <= 0.0 {
            return Err(DistributionError::TrustEstablish {
                asset_code: request.asset_code.clone(),
                reason: format!("limit must be positive, got {}", request.limit),
            });
        }

        let asset = Asset::from_word(&request.asset_code, &self.config.issuer)?;
        let keypair = Keypair::from_secret_seed(&request.signing_secret)?;
        let address = keypair.public_key();

        // Sequence number must be current at build time
        let account = self.ledger.load_account(&address).await?;
        let fee = self.ledger.fetch_base_fee().await?;

        let signed = TransactionBuilder::new(self.config, &account)
            .fee(fee)
            .change_trust(asset, Some(&request.limit))
            .build()?
            .sign(&keypair)?;

        let response = self.ledger.submit_transaction(&signed.envelope_xdr).await?;
        Ok(response.hash)
    }
}
