// ============================================================================
// WORD-PAYMENTS - Account Provisioner
// ============================================================================
// Creates fresh keypairs and funds them through the network faucet. Only the
// testnet has a provisioning strategy; the public network costs real money.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::config::Network;
use crate::error::DistributionError;
use crate::horizon::Ledger;
use crate::keys::Keypair;
use crate::Result;

/// A freshly provisioned account.
///
/// The secret seed lives only as long as the caller needs it; it is never
/// persisted or logged by this crate.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account address (G...)
    pub public_key: String,

    /// Secret seed (S...)
    pub secret_seed: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("public_key", &self.public_key)
            .field("secret_seed", &"<redacted>")
            .finish()
    }
}

/// Provisions funded accounts on networks that support it
pub struct AccountProvisioner<'a> {
    ledger: &'a dyn Ledger,
    network: Network,
}

impl<'a> AccountProvisioner<'a> {
    pub fn new(ledger: &'a dyn Ledger, network: Network) -> Self {
        Self { ledger, network }
    }

    /// Generate a keypair and fund it with a starting balance.
    ///
    /// Dispatch is exhaustive over [`Network`]: adding a network without a
    /// provisioning decision is a compile error, not a runtime surprise.
    pub async fn create_account(&self) -> Result<Account> {
        match self.network {
            Network::Testnet => self.create_testnet_account().await,
            Network::Public => Err(DistributionError::UnsupportedNetwork(
                self.network.to_string(),
            )),
        }
    }

    async fn create_testnet_account(&self) -> Result<Account> {
        let pair = Keypair::random();
        let public_key = pair.public_key();

        if let Err(e) = self.ledger.friendbot_fund(&public_key).await {
            warn!("Friendbot funding failed for {}: {}", public_key, e);
            return Err(DistributionError::Provision(e.to_string()));
        }

        info!("Provisioned funded testnet account: {}", public_key);

        Ok(Account {
            public_key,
            secret_seed: pair.secret_seed(),
        })
    }
}
