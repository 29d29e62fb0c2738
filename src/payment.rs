// ============================================================================
// WORD-PAYMENTS - Payment Issuer
// ============================================================================
// Builds, signs, and submits single-operation payments. Failures come back as
// normalized OperationResults; this path never raises to its caller.

use tracing::{info, warn};

use crate::config::StellarConfig;
use crate::error::{DistributionError, OperationResult};
use crate::horizon::Ledger;
use crate::keys::Keypair;
use crate::transaction::{Asset, TransactionBuilder};
use crate::Result;

/// A single payment to submit
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Source account address (G...)
    pub origin: String,

    /// Destination account address (G...)
    pub destination: String,

    /// Amount as a decimal string
    pub amount: String,

    /// Asset to move; native XLM unless set otherwise
    pub asset: Asset,

    /// Optional text memo
    pub memo: Option<String>,
}

impl PaymentRequest {
    /// Payment of native XLM
    pub fn new(origin: &str, destination: &str, amount: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            amount: amount.to_string(),
            asset: Asset::native(),
            memo: None,
        }
    }

    /// Pay a non-native asset instead
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.asset = asset;
        self
    }

    /// Attach a text memo
    pub fn with_memo(mut self, memo: &str) -> Self {
        self.memo = Some(memo.to_string());
        self
    }
}

/// Issues payments from an origin account
pub struct PaymentIssuer<'a> {
    ledger: &'a dyn Ledger,
    config: &'a StellarConfig,
}

impl<'a> PaymentIssuer<'a> {
    pub fn new(ledger: &'a dyn Ledger, config: &'a StellarConfig) -> Self {
        Self { ledger, config }
    }

    /// Submit a payment signed with the given secret seed.
    ///
    /// Never returns an error: every failure is normalized into the result's
    /// status code and message, with the transport status preserved when the
    /// ledger supplied one.
    pub async fn pay(&self, request: &PaymentRequest, signing_secret: &str) -> OperationResult {
        match self.try_pay(request, signing_secret).await {
            Ok(hash) => {
                info!(
                    "Paid {} of {:?} to {}",
                    request.amount, request.asset, request.destination
                );
                OperationResult::success(hash)
            }
            Err(e) => {
                warn!("Payment to {} failed: {}", request.destination, e);
                OperationResult::failure(&e)
            }
        }
    }

    async fn try_pay(&self, request: &PaymentRequest, signing_secret: &str) -> Result<String> {
        let keypair = Keypair::from_secret_seed(signing_secret)?;

        // Sequence number must be current at build time
        let account = self.ledger.load_account(&request.origin).await?;
        let fee = self.ledger.fetch_base_fee().await?;

        let mut builder = TransactionBuilder::new(self.config, &account).fee(fee);

        // A native payment to an address with no account yet becomes a
        // create-account operation; non-native assets need the destination
        // to exist and trust the asset first.
        let create_destination =
            request.asset.is_native() && !self.ledger.account_exists(&request.destination).await?;

        if create_destination {
            let amount: f64 = request.amount.parse().unwrap_or(0.0);
            if amount < 1.0 {
                return Err(DistributionError::Payment(format!(
                    "New accounts require a starting balance of at least 1 XLM, got {}",
                    request.amount
                )));
            }
            builder = builder.create_account(&request.destination, &request.amount);
        } else {
            builder =
                builder.payment(&request.destination, request.asset.clone(), &request.amount);
        }

        if let Some(memo) = &request.memo {
            builder = builder.memo_text(memo);
        }

        let signed = builder.build()?.sign(&keypair)?;

        let response = self.ledger.submit_transaction(&signed.envelope_xdr).await?;
        Ok(response.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DistributionError;
    use crate::horizon::{AccountInfo, TransactionResponse};
    use async_trait::async_trait;

    /// Ledger whose submissions always bounce with a server detail
    struct RejectingLedger;

    #[async_trait]
    impl Ledger for RejectingLedger {
        async fn load_account(&self, address: &str) -> Result<AccountInfo> {
            Ok(AccountInfo {
                id: address.to_string(),
                sequence: "7".to_string(),
                balances: vec![],
                subentry_count: 0,
            })
        }

        async fn account_exists(&self, _address: &str) -> Result<bool> {
            Ok(true)
        }

        async fn fetch_base_fee(&self) -> Result<u32> {
            Ok(100)
        }

        async fn submit_transaction(&self, _envelope_xdr: &str) -> Result<TransactionResponse> {
            Err(DistributionError::TransactionRejected {
                status: 400,
                reason: "tx: Some(\"tx_failed\"), ops: Some([\"op_underfunded\"])".to_string(),
            })
        }

        async fn friendbot_fund(&self, _address: &str) -> Result<()> {
            Ok(())
        }
    }

    fn request_between(origin: &Keypair, destination: &Keypair) -> PaymentRequest {
        PaymentRequest::new(&origin.public_key(), &destination.public_key(), "1")
    }

    #[tokio::test]
    async fn test_rejection_is_normalized_not_raised() {
        let config = StellarConfig::testnet();
        let issuer = PaymentIssuer::new(&RejectingLedger, &config);

        let origin = Keypair::from_seed_bytes(&[1u8; 32]).unwrap();
        let destination = Keypair::from_seed_bytes(&[2u8; 32]).unwrap();

        let result = issuer
            .pay(&request_between(&origin, &destination), &origin.secret_seed())
            .await;

        assert!(!result.is_success());
        assert_eq!(result.status_code, 400);
        assert!(result.error_message.contains("op_underfunded"));
        assert!(result.id.is_none());
    }

    /// Ledger where no destination account exists yet
    struct EmptyLedger;

    #[async_trait]
    impl Ledger for EmptyLedger {
        async fn load_account(&self, address: &str) -> Result<AccountInfo> {
            Ok(AccountInfo {
                id: address.to_string(),
                sequence: "7".to_string(),
                balances: vec![],
                subentry_count: 0,
            })
        }

        async fn account_exists(&self, _address: &str) -> Result<bool> {
            Ok(false)
        }

        async fn fetch_base_fee(&self) -> Result<u32> {
            Ok(100)
        }

        async fn submit_transaction(&self, _envelope_xdr: &str) -> Result<TransactionResponse> {
            Ok(TransactionResponse {
                hash: "a".repeat(64),
                ledger: 1,
                successful: true,
                fee_charged: "100".to_string(),
            })
        }

        async fn friendbot_fund(&self, _address: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_new_destination_needs_one_xlm() {
        let config = StellarConfig::testnet();
        let issuer = PaymentIssuer::new(&EmptyLedger, &config);

        let origin = Keypair::from_seed_bytes(&[1u8; 32]).unwrap();
        let destination = Keypair::from_seed_bytes(&[2u8; 32]).unwrap();

        let mut request = request_between(&origin, &destination);
        request.amount = "0.5".to_string();

        let result = issuer.pay(&request, &origin.secret_seed()).await;

        assert!(!result.is_success());
        assert_eq!(result.status_code, 500);
        assert!(result.error_message.contains("at least 1 XLM"));
    }

    #[tokio::test]
    async fn test_new_destination_funded_by_payment() {
        let config = StellarConfig::testnet();
        let issuer = PaymentIssuer::new(&EmptyLedger, &config);

        let origin = Keypair::from_seed_bytes(&[1u8; 32]).unwrap();
        let destination = Keypair::from_seed_bytes(&[2u8; 32]).unwrap();

        let mut request = request_between(&origin, &destination);
        request.amount = "2".to_string();

        let result = issuer.pay(&request, &origin.secret_seed()).await;
        assert!(result.is_success());
        assert!(result.id.is_some());
    }

    #[tokio::test]
    async fn test_bad_secret_is_normalized() {
        let config = StellarConfig::testnet();
        let issuer = PaymentIssuer::new(&RejectingLedger, &config);

        let origin = Keypair::from_seed_bytes(&[1u8; 32]).unwrap();
        let destination = Keypair::from_seed_bytes(&[2u8; 32]).unwrap();

        let result = issuer
            .pay(&request_between(&origin, &destination), "not-a-seed")
            .await;

        assert!(!result.is_success());
        assert_eq!(result.status_code, 500);
        assert!(!result.error_message.is_empty());
    }
}
