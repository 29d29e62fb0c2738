// ============================================================================
// WORD-PAYMENTS - Configuration
// ============================================================================
// Network configuration for Stellar testnet and the public network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DistributionError;

/// Network selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Testnet,
    Public,
}

impl Default for Network {
    fn default() -> Self {
        // Word tokens are a testnet toy first
        #[cfg(feature = "testnet")]
        return Network::Testnet;

        #[cfg(all(feature = "pubnet", not(feature = "testnet")))]
        return Network::Public;

        #[cfg(not(any(feature = "testnet", feature = "pubnet")))]
        return Network::Testnet;
    }
}

impl Network {
    /// Network passphrase used when hashing transactions for signing
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Public => "Public Global Stellar Network ; September 2015",
        }
    }

    /// Default Horizon endpoint for this network
    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Public => "https://horizon.stellar.org",
        }
    }

    /// Faucet endpoint (testnet only)
    pub fn friendbot_url(&self) -> Option<&'static str> {
        match self {
            Network::Testnet => Some("https://friendbot.stellar.org"),
            Network::Public => None,
        }
    }
}

impl FromStr for Network {
    type Err = DistributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TESTNET" => Ok(Network::Testnet),
            "PUBLIC" => Ok(Network::Public),
            other => Err(DistributionError::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "TESTNET"),
            Network::Public => write!(f, "PUBLIC"),
        }
    }
}

/// Stellar network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StellarConfig {
    /// Network (testnet or public)
    pub network: Network,

    /// Horizon API URL
    pub horizon_url: String,

    /// Network passphrase for transaction signing
    pub network_passphrase: String,

    /// Word-token issuer (Stellar address)
    pub issuer: String,

    /// Fallback base fee in stroops (1 XLM = 10,000,000 stroops)
    pub base_fee: u32,

    /// Amount of a word token issued per distribution
    pub word_amount: String,

    /// Trustline limit requested when trusting a word asset
    pub word_trust_limit: String,

    /// Transaction time bound in seconds
    pub tx_timeout_secs: u64,
}

impl StellarConfig {
    /// Create testnet configuration
    pub fn testnet() -> Self {
        Self::for_network(Network::Testnet)
    }

    /// Create public network configuration
    pub fn pubnet() -> Self {
        Self::for_network(Network::Public)
    }

    /// Build configuration for a network
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            horizon_url: network.default_horizon_url().to_string(),
            network_passphrase: network.passphrase().to_string(),
            issuer: "GDBPN236GYLNI62PY3WWMEYGFHLNCKLTRSCXNDRMI4FETQTDG6DURM7T".to_string(),
            base_fee: 100, // 0.00001 XLM
            word_amount: "1".to_string(),
            word_trust_limit: "1".to_string(),
            tx_timeout_secs: 100,
        }
    }

    /// Build configuration from the environment.
    ///
    /// Reads `NETWORK` (TESTNET | PUBLIC), `STELLAR_URL`, and
    /// `ISSUER_PUBLIC_KEY`, falling back to the compiled-in defaults for the
    /// selected network when a variable is unset.
    pub fn from_env() -> crate::Result<Self> {
        let network = match std::env::var("NETWORK") {
            Ok(name) => name.parse::<Network>()?,
            Err(_) => Network::default(),
        };

        let mut config = Self::for_network(network);

        if let Ok(url) = std::env::var("STELLAR_URL") {
            config.horizon_url = url;
        }
        if let Ok(issuer) = std::env::var("ISSUER_PUBLIC_KEY") {
            config.issuer = issuer;
        }

        Ok(config)
    }

    /// Faucet URL for this configuration's network (testnet only)
    pub fn friendbot_url(&self) -> Option<&'static str> {
        self.network.friendbot_url()
    }

    /// Check if this is the public network
    pub fn is_pubnet(&self) -> bool {
        self.network == Network::Public
    }
}

impl Default for StellarConfig {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}
