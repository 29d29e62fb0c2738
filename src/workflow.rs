// ============================================================================
// WORD-PAYMENTS - Token Distribution Workflow
// ============================================================================
// High-level entry points for handing out word tokens: mint a word, send it
// to an existing account, or provision a brand-new account and send it there.
//
// Multi-step flows are sequential and non-transactional. Each invocation
// returns a WorkflowReport recording the outcome of every step, so a caller
// can see exactly where a run stopped and retry just that step. No
// compensating transactions are submitted for steps that already landed.
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::config::StellarConfig;
use crate::error::{DistributionError, OperationResult};
use crate::horizon::{HorizonClient, Ledger};
use crate::keys::Keypair;
use crate::payment::{PaymentIssuer, PaymentRequest};
use crate::provision::{Account, AccountProvisioner};
use crate::transaction::Asset;
use crate::trustline::{TrustEstablisher, TrustlineRequest};
use crate::Result;

/// Pause between funding a new account and the first transaction signed by
/// it, giving the network time to surface the account
const PROPAGATION_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

// ============================================================================
// WORKFLOW REPORT
// ============================================================================

/// A step of a distribution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStep {
    Provision,
    Trust,
    Pay,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStep::Provision => write!(f, "provision"),
            WorkflowStep::Trust => write!(f, "trust"),
            WorkflowStep::Pay => write!(f, "pay"),
        }
    }
}

/// Where a distribution run ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Created,
    Provisioned,
    Trusted,
    Paid,
    Done,
    Failed,
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: WorkflowStep,
    pub result: OperationResult,
}

/// Per-step record of a distribution run.
///
/// The first failed step moves the run to `Failed` and stops it; earlier
/// steps keep their on-ledger effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub state: WorkflowState,
    pub steps: Vec<StepOutcome>,

    /// Account provisioned for this run, when the run created one.
    /// Handed to the caller; the crate keeps no copy.
    pub account: Option<Account>,
}

impl WorkflowReport {
    fn new() -> Self {
        Self {
            state: WorkflowState::Created,
            steps: Vec::new(),
            account: None,
        }
    }

    /// Record a step outcome; advances to `next_state` on success, `Failed`
    /// otherwise. Returns whether the run may continue.
    fn record(
        &mut self,
        step: WorkflowStep,
        result: OperationResult,
        next_state: WorkflowState,
    ) -> bool {
        let ok = result.is_success();
        self.steps.push(StepOutcome { step, result });
        self.state = if ok { next_state } else { WorkflowState::Failed };
        ok
    }

    /// Outcome of a given step, if it ran
    pub fn step_result(&self, step: WorkflowStep) -> Option<&OperationResult> {
        self.steps
            .iter()
            .find(|outcome| outcome.step == step)
            .map(|outcome| &outcome.result)
    }

    pub fn succeeded(&self) -> bool {
        self.state == WorkflowState::Done
    }
}

// ============================================================================
// WORD TOKEN WORKFLOW
// ============================================================================

/// Composes provisioning, trustlines, and payments into word distribution.
///
/// The ledger client is injected, so the whole workflow runs unchanged
/// against a fake ledger in tests.
pub struct WordTokenWorkflow {
    config: StellarConfig,
    ledger: Box<dyn Ledger>,
    distribution_key: Option<Keypair>,
}

impl WordTokenWorkflow {
    /// Create a workflow talking to Horizon
    pub fn new(config: StellarConfig) -> Self {
        let ledger = Box::new(HorizonClient::new(config.clone()));
        Self::with_ledger(config, ledger)
    }

    /// Create a workflow over an explicit ledger client
    pub fn with_ledger(config: StellarConfig, ledger: Box<dyn Ledger>) -> Self {
        Self {
            config,
            ledger,
            distribution_key: None,
        }
    }

    /// Build a workflow from the environment.
    ///
    /// Configuration comes from [`StellarConfig::from_env`]; the distribution
    /// account is loaded from `DISTRIBUTION_SECRET` when set.
    pub fn from_env() -> Result<Self> {
        let config = StellarConfig::from_env()?;
        let workflow = Self::new(config);

        match std::env::var("DISTRIBUTION_SECRET") {
            Ok(secret) => workflow.with_distribution_secret(&secret),
            Err(_) => Ok(workflow),
        }
    }

    /// Load the distribution account from its secret seed
    pub fn with_distribution_secret(mut self, secret_seed: &str) -> Result<Self> {
        let keypair = Keypair::from_secret_seed(secret_seed)?;
        info!("Distribution account loaded: {}", keypair.public_key());
        self.distribution_key = Some(keypair);
        Ok(self)
    }

    /// Get configuration
    pub fn config(&self) -> &StellarConfig {
        &self.config
    }

    /// Address of the configured distribution account
    pub fn distribution_address(&self) -> Option<String> {
        self.distribution_key.as_ref().map(|key| key.public_key())
    }

    // ==================== Module-boundary operations ====================

    /// Provision a funded account on the configured network
    pub async fn create_account(&self) -> Result<Account> {
        AccountProvisioner::new(self.ledger.as_ref(), self.config.network)
            .create_account()
            .await
    }

    /// Submit a payment signed with the given secret seed
    pub async fn pay_to(&self, request: &PaymentRequest, signing_secret: &str) -> OperationResult {
        PaymentIssuer::new(self.ledger.as_ref(), &self.config)
            .pay(request, signing_secret)
            .await
    }

    /// Mint a word token: the distribution account trusts the word asset.
    ///
    /// Safe to repeat; the trustline limit on the ledger is last-write-wins.
    pub async fn mint_word_token(&self, word: &str) -> OperationResult {
        let key = match &self.distribution_key {
            Some(key) => key,
            None => {
                return OperationResult::failure(&DistributionError::DistributionNotConfigured)
            }
        };

        let request =
            TrustlineRequest::new(word, &self.config.word_trust_limit, &key.secret_seed());
        TrustEstablisher::new(self.ledger.as_ref(), &self.config)
            .establish(&request)
            .await
    }

    /// Open a trustline for `word` on the recipient account, then pay it one
    /// word token from the distribution account
    pub async fn send_word_to_existing_account(
        &self,
        recipient_secret: &str,
        word: &str,
    ) -> WorkflowReport {
        let mut report = WorkflowReport::new();
        self.trust_then_pay(&mut report, recipient_secret, word).await;
        report
    }

    /// Provision a funded account, then trust-then-pay `word` to it
    pub async fn send_word_to_new_account(&self, word: &str) -> WorkflowReport {
        let mut report = WorkflowReport::new();

        let provisioner = AccountProvisioner::new(self.ledger.as_ref(), self.config.network);
        let account = match provisioner.create_account().await {
            Ok(account) => account,
            Err(e) => {
                warn!("Provisioning step failed: {}", e);
                report.record(
                    WorkflowStep::Provision,
                    OperationResult::failure(&e),
                    WorkflowState::Provisioned,
                );
                return report;
            }
        };

        report.account = Some(account.clone());
        report.record(
            WorkflowStep::Provision,
            OperationResult::ok(),
            WorkflowState::Provisioned,
        );

        tokio::time::sleep(PROPAGATION_DELAY).await;

        self.trust_then_pay(&mut report, &account.secret_seed, word).await;
        report
    }

    // ==================== Steps ====================

    async fn trust_then_pay(&self, report: &mut WorkflowReport, recipient_secret: &str, word: &str) {
        let trustline =
            TrustlineRequest::new(word, &self.config.word_trust_limit, recipient_secret);
        let trusted = TrustEstablisher::new(self.ledger.as_ref(), &self.config)
            .establish(&trustline)
            .await;

        if !report.record(WorkflowStep::Trust, trusted, WorkflowState::Trusted) {
            return;
        }

        // The trust step parsed this same seed, so this only fails if it did
        let recipient = match Keypair::from_secret_seed(recipient_secret) {
            Ok(pair) => pair,
            Err(e) => {
                report.record(
                    WorkflowStep::Pay,
                    OperationResult::failure(&e),
                    WorkflowState::Paid,
                );
                return;
            }
        };

        let paid = self.pay_word(&recipient.public_key(), word).await;
        if report.record(WorkflowStep::Pay, paid, WorkflowState::Paid) {
            report.state = WorkflowState::Done;
            info!("Distributed word token {:?} to {}", word, recipient.public_key());
        }
    }

    async fn pay_word(&self, recipient: &str, word: &str) -> OperationResult {
        let key = match &self.distribution_key {
            Some(key) => key,
            None => {
                return OperationResult::failure(&DistributionError::DistributionNotConfigured)
            }
        };

        let asset = match Asset::from_word(word, &self.config.issuer) {
            Ok(asset) => asset,
            Err(e) => return OperationResult::failure(&e),
        };

        let request = PaymentRequest::new(&key.public_key(), recipient, &self.config.word_amount)
            .with_asset(asset)
            .with_memo(word);

        PaymentIssuer::new(self.ledger.as_ref(), &self.config)
            .pay(&request, &key.secret_seed())
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
