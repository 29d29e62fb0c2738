// ============================================================================
// WORD-PAYMENTS - Stellar Integration
// ============================================================================
// Stellar integration for distributing "word tokens": every word is a custom
// asset issued by a configured issuer account, handed out one token at a time.
//
// Features:
// - Provision funded testnet accounts via friendbot
// - Establish trustlines for word assets
// - Send XLM and word-token payments
// - Trust-then-pay distribution workflow with per-step outcomes
// ============================================================================

pub mod config;
pub mod error;
pub mod horizon;
pub mod keys;
pub mod payment;
pub mod provision;
pub mod strkey;
pub mod transaction;
pub mod trustline;
pub mod workflow;

pub use config::{Network, StellarConfig};
pub use error::{DistributionError, OperationResult};
pub use horizon::{AccountInfo, Balance, HorizonClient, Ledger, TransactionResponse};
pub use keys::Keypair;
pub use payment::{PaymentIssuer, PaymentRequest};
pub use provision::{Account, AccountProvisioner};
pub use transaction::{Asset, Memo, Operation, SignedTransaction, TransactionBuilder};
pub use trustline::{TrustEstablisher, TrustlineRequest};
pub use workflow::{
    StepOutcome, WordTokenWorkflow, WorkflowReport, WorkflowState, WorkflowStep,
};

/// Re-export for convenience
pub type Result<T> = std::result::Result<T, DistributionError>;
