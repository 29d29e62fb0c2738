// ============================================================================
// WORD-PAYMENTS - Transaction Builder
// ============================================================================
// Build and sign Stellar transactions for payments, account creation, and
// trustlines.
//
// Stellar transactions consist of:
// - Source account
// - Sequence number (incremented each transaction)
// - Fee
// - Time bounds
// - Memo (optional)
// - Operations (payment, create account, change trust)
// - Signatures
// ============================================================================

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::StellarConfig;
use crate::error::DistributionError;
use crate::horizon::AccountInfo;
use crate::keys::Keypair;
use crate::strkey::decode_account_id;
use crate::Result;

/// Limit written for a change-trust operation when none is requested
/// (INT64_MAX in 7-decimal asset units)
const MAX_TRUST_LIMIT: &str = "922337203685.4775807";

// ============================================================================
// TRANSACTION TYPES
// ============================================================================

/// Transaction operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Create a new account with starting balance
    CreateAccount {
        destination: String,
        starting_balance: String,
    },

    /// Payment of native XLM or any asset
    Payment {
        destination: String,
        asset: Asset,
        amount: String,
    },

    /// Create or modify trustline
    ChangeTrust { asset: Asset, limit: Option<String> },
}

/// Stellar asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    Native,
    CreditAlphaNum4 { code: String, issuer: String },
    CreditAlphaNum12 { code: String, issuer: String },
}

impl Asset {
    /// Create native XLM asset
    pub fn native() -> Self {
        Asset::Native
    }

    /// Create custom asset; the XDR form follows from the code length
    pub fn credit(code: &str, issuer: &str) -> Self {
        if code.len() <= 4 {
            Asset::CreditAlphaNum4 {
                code: code.to_string(),
                issuer: issuer.to_string(),
            }
        } else {
            Asset::CreditAlphaNum12 {
                code: code.to_string(),
                issuer: issuer.to_string(),
            }
        }
    }

    /// Create a word-token asset, validating the word as an asset code.
    ///
    /// Stellar asset codes are 1-12 alphanumeric characters.
    pub fn from_word(word: &str, issuer: &str) -> Result<Self> {
        if word.is_empty() || word.len() > 12 {
            return Err(DistributionError::InvalidAsset(format!(
                "Word must be 1-12 characters, got {}",
                word.len()
            )));
        }

        if !word.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DistributionError::InvalidAsset(format!(
                "Word must be alphanumeric: {}",
                word
            )));
        }

        Ok(Asset::credit(word, issuer))
    }

    /// Check if native
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }
}

/// Transaction memo
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum Memo {
    #[default]
    None,
    Text(String),
}

/// Signed transaction ready for submission
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub hash: String,
    pub envelope_xdr: String,
}

// ============================================================================
// TRANSACTION BUILDER
// ============================================================================

/// Builder for Stellar transactions
pub struct TransactionBuilder {
    network_passphrase: String,
    source_account: String,
    sequence: u64,
    fee: u32,
    operations: Vec<Operation>,
    memo: Memo,
    timeout_seconds: u64,
}

impl TransactionBuilder {
    /// Create new transaction builder from freshly loaded account state.
    ///
    /// The sequence number comes straight from the account document; loading
    /// the account immediately before building keeps it current.
    pub fn new(config: &StellarConfig, source_account: &AccountInfo) -> Self {
        Self {
            network_passphrase: config.network_passphrase.clone(),
            source_account: source_account.id.clone(),
            sequence: source_account.sequence.parse::<u64>().unwrap_or(0) + 1,
            fee: config.base_fee,
            operations: Vec::new(),
            memo: Memo::None,
            timeout_seconds: config.tx_timeout_secs,
        }
    }

    /// Set fee per operation (in stroops)
    pub fn fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    /// Set text memo
    pub fn memo_text(mut self, text: &str) -> Self {
        self.memo = Memo::Text(text.to_string());
        self
    }

    /// Set time bound
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Add operation
    pub fn add_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Add create account operation
    pub fn create_account(self, destination: &str, starting_balance: &str) -> Self {
        self.add_operation(Operation::CreateAccount {
            destination: destination.to_string(),
            starting_balance: starting_balance.to_string(),
        })
    }

    /// Add payment operation
    pub fn payment(self, destination: &str, asset: Asset, amount: &str) -> Self {
        self.add_operation(Operation::Payment {
            destination: destination.to_string(),
            asset,
            amount: amount.to_string(),
        })
    }

    /// Add change trust operation (create or resize a trustline)
    pub fn change_trust(self, asset: Asset, limit: Option<&str>) -> Self {
        self.add_operation(Operation::ChangeTrust {
            asset,
            limit: limit.map(|s| s.to_string()),
        })
    }

    /// Build the transaction, ready for signing
    pub fn build(self) -> Result<UnsignedTransaction> {
        if self.operations.is_empty() {
            return Err(DistributionError::InvalidTransaction(
                "Transaction must have at least one operation".to_string(),
            ));
        }

        // Total fee is per-operation
        let total_fee = self.fee * self.operations.len() as u32;

        let max_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| DistributionError::InvalidTransaction(e.to_string()))?
            .as_secs()
            + self.timeout_seconds;

        Ok(UnsignedTransaction {
            network_passphrase: self.network_passphrase,
            source_account: self.source_account,
            sequence: self.sequence,
            fee: total_fee,
            min_time: 0,
            max_time,
            operations: self.operations,
            memo: self.memo,
        })
    }
}

// ============================================================================
// UNSIGNED TRANSACTION
// ============================================================================

/// Unsigned transaction ready for signing
pub struct UnsignedTransaction {
    network_passphrase: String,
    source_account: String,
    sequence: u64,
    fee: u32,
    min_time: u64,
    max_time: u64,
    operations: Vec<Operation>,
    memo: Memo,
}

impl UnsignedTransaction {
    /// Sign the transaction, producing a base64 envelope for submission.
    ///
    /// Stellar signs sha256(network_id + ENVELOPE_TYPE_TX + tx_xdr), where
    /// network_id = sha256(network passphrase).
    pub fn sign(self, keypair: &Keypair) -> Result<SignedTransaction> {
        let tx_xdr = self.to_xdr()?;

        let network_id = {
            let mut hasher = Sha256::new();
            hasher.update(self.network_passphrase.as_bytes());
            hasher.finalize()
        };

        let mut payload = Vec::new();
        payload.extend_from_slice(&network_id);
        payload.extend_from_slice(&[0, 0, 0, 2]); // ENVELOPE_TYPE_TX = 2
        payload.extend_from_slice(&tx_xdr);

        let tx_hash = {
            let mut hasher = Sha256::new();
            hasher.update(&payload);
            hasher.finalize()
        };

        let signature = keypair.sign(&tx_hash);

        let envelope_xdr =
            self.build_envelope_xdr(&tx_xdr, keypair.public_key_bytes(), &signature)?;

        Ok(SignedTransaction {
            hash: hex::encode(tx_hash),
            envelope_xdr: base64_encode(&envelope_xdr),
        })
    }

    /// Build transaction XDR (without envelope)
    fn to_xdr(&self) -> Result<Vec<u8>> {
        let mut xdr = Vec::new();

        // Source account (MuxedAccount)
        write_muxed_account(&mut xdr, &self.source_account)?;

        // Fee
        xdr.extend_from_slice(&self.fee.to_be_bytes());

        // Sequence number
        xdr.extend_from_slice(&self.sequence.to_be_bytes());

        // Preconditions: PRECOND_TIME = 1, then TimeBounds
        xdr.extend_from_slice(&[0, 0, 0, 1]);
        xdr.extend_from_slice(&self.min_time.to_be_bytes());
        xdr.extend_from_slice(&self.max_time.to_be_bytes());

        // Memo
        write_memo(&mut xdr, &self.memo);

        // Operations array
        xdr.extend_from_slice(&(self.operations.len() as u32).to_be_bytes());
        for op in &self.operations {
            write_operation(&mut xdr, op)?;
        }

        // Ext (reserved for future)
        xdr.extend_from_slice(&[0, 0, 0, 0]);

        Ok(xdr)
    }

    fn build_envelope_xdr(
        &self,
        tx_xdr: &[u8],
        public_key_bytes: &[u8; 32],
        signature: &[u8],
    ) -> Result<Vec<u8>> {
        let mut envelope = Vec::new();

        // ENVELOPE_TYPE_TX = 2
        envelope.extend_from_slice(&[0, 0, 0, 2]);

        // Transaction
        envelope.extend_from_slice(tx_xdr);

        // Signatures array (1 signature)
        envelope.extend_from_slice(&[0, 0, 0, 1]);

        // DecoratedSignature: hint (last 4 bytes of public key) + opaque sig
        envelope.extend_from_slice(&public_key_bytes[28..32]);
        envelope.extend_from_slice(&(signature.len() as u32).to_be_bytes());
        envelope.extend_from_slice(signature);
        let padding = (4 - (signature.len() % 4)) % 4;
        for _ in 0..padding {
            envelope.push(0);
        }

        Ok(envelope)
    }
}

// ============================================================================
// XDR WRITERS
// ============================================================================

fn write_muxed_account(xdr: &mut Vec<u8>, address: &str) -> Result<()> {
    let key_bytes = decode_account_id(address)?;

    // KEY_TYPE_ED25519 = 0
    xdr.extend_from_slice(&[0, 0, 0, 0]);
    xdr.extend_from_slice(&key_bytes);

    Ok(())
}

fn write_account_id(xdr: &mut Vec<u8>, address: &str) -> Result<()> {
    let key_bytes = decode_account_id(address)?;

    // PUBLIC_KEY_TYPE_ED25519 = 0
    xdr.extend_from_slice(&[0, 0, 0, 0]);
    xdr.extend_from_slice(&key_bytes);

    Ok(())
}

fn write_memo(xdr: &mut Vec<u8>, memo: &Memo) {
    match memo {
        Memo::None => {
            // MEMO_NONE = 0
            xdr.extend_from_slice(&[0, 0, 0, 0]);
        }
        Memo::Text(text) => {
            // MEMO_TEXT = 1, string with length prefix, padded to 4 bytes
            xdr.extend_from_slice(&[0, 0, 0, 1]);
            let bytes = text.as_bytes();
            let padded_len = (bytes.len() + 3) / 4 * 4;
            xdr.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            xdr.extend_from_slice(bytes);
            for _ in 0..(padded_len - bytes.len()) {
                xdr.push(0);
            }
        }
    }
}

fn write_operation(xdr: &mut Vec<u8>, op: &Operation) -> Result<()> {
    // Source account (optional - none means same as tx source)
    xdr.extend_from_slice(&[0, 0, 0, 0]);

    match op {
        Operation::CreateAccount {
            destination,
            starting_balance,
        } => {
            // CREATE_ACCOUNT = 0
            xdr.extend_from_slice(&[0, 0, 0, 0]);
            write_account_id(xdr, destination)?;
            write_amount(xdr, starting_balance)?;
        }

        Operation::Payment {
            destination,
            asset,
            amount,
        } => {
            // PAYMENT = 1
            xdr.extend_from_slice(&[0, 0, 0, 1]);
            write_muxed_account(xdr, destination)?;
            write_asset(xdr, asset)?;
            write_amount(xdr, amount)?;
        }

        Operation::ChangeTrust { asset, limit } => {
            // CHANGE_TRUST = 6
            xdr.extend_from_slice(&[0, 0, 0, 6]);
            // ChangeTrustAsset is the same as Asset for credit assets
            write_asset(xdr, asset)?;
            let limit_value = limit.as_deref().unwrap_or(MAX_TRUST_LIMIT);
            write_amount(xdr, limit_value)?;
        }
    }

    Ok(())
}

fn write_asset(xdr: &mut Vec<u8>, asset: &Asset) -> Result<()> {
    match asset {
        Asset::Native => {
            // ASSET_TYPE_NATIVE = 0
            xdr.extend_from_slice(&[0, 0, 0, 0]);
        }
        Asset::CreditAlphaNum4 { code, issuer } => {
            // ASSET_TYPE_CREDIT_ALPHANUM4 = 1
            xdr.extend_from_slice(&[0, 0, 0, 1]);
            write_asset_code(xdr, code, 4);
            write_account_id(xdr, issuer)?;
        }
        Asset::CreditAlphaNum12 { code, issuer } => {
            // ASSET_TYPE_CREDIT_ALPHANUM12 = 2
            xdr.extend_from_slice(&[0, 0, 0, 2]);
            write_asset_code(xdr, code, 12);
            write_account_id(xdr, issuer)?;
        }
    }
    Ok(())
}

fn write_asset_code(xdr: &mut Vec<u8>, code: &str, width: usize) {
    // Asset codes are fixed-width, zero-padded
    let mut code_bytes = vec![0u8; width];
    let code_slice = code.as_bytes();
    let len = code_slice.len().min(width);
    code_bytes[..len].copy_from_slice(&code_slice[..len]);
    xdr.extend_from_slice(&code_bytes);
}

fn write_amount(xdr: &mut Vec<u8>, amount: &str) -> Result<()> {
    // Amount strings are decimal; the wire format is int64 stroops
    // (7 decimal places)
    let parsed: f64 = amount
        .parse()
        .map_err(|_| DistributionError::InvalidTransaction(format!("Invalid amount: {}", amount)))?;

    if parsed < 0.0 {
        return Err(DistributionError::InvalidTransaction(format!(
            "Negative amount: {}",
            amount
        )));
    }

    let stroops = (parsed * 10_000_000.0) as i64;
    xdr.extend_from_slice(&stroops.to_be_bytes());
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn base64_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose, Engine as _};
    general_purpose::STANDARD.encode(data)
}
