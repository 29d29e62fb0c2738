// ============================================================================
// WORD-PAYMENTS - Ed25519 Keypairs
// ============================================================================
// Keypair generation, seed import, and transaction-hash signing. An account's
// address is its StrKey-encoded public key; the secret seed is the 32-byte
// Ed25519 seed in S... form.

use ed25519_dalek::{Keypair as DalekKeypair, PublicKey, SecretKey, Signer};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

use crate::error::DistributionError;
use crate::strkey;
use crate::Result;

/// An Ed25519 keypair addressing a Stellar account.
///
/// Not serializable: exporting the secret half is a deliberate act, done
/// through [`Keypair::secret_seed`].
pub struct Keypair {
    inner: DalekKeypair,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG
    pub fn random() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);

        let secret = SecretKey::from_bytes(&seed)
            .expect("32 random bytes are always a valid Ed25519 seed");
        let public = PublicKey::from(&secret);

        Self {
            inner: DalekKeypair { secret, public },
        }
    }

    /// Import a keypair from a Stellar S... secret seed
    pub fn from_secret_seed(secret_seed: &str) -> Result<Self> {
        let seed_bytes = strkey::decode_secret_seed(secret_seed)?;
        Self::from_seed_bytes(&seed_bytes)
    }

    /// Import a keypair from raw Ed25519 seed bytes
    pub fn from_seed_bytes(seed_bytes: &[u8; 32]) -> Result<Self> {
        let secret = SecretKey::from_bytes(seed_bytes)
            .map_err(|_| DistributionError::InvalidSecretSeed)?;
        let public = PublicKey::from(&secret);

        Ok(Self {
            inner: DalekKeypair { secret, public },
        })
    }

    /// Account address (G...) for this keypair
    pub fn public_key(&self) -> String {
        strkey::encode_account_id(self.inner.public.as_bytes())
    }

    /// Raw public key bytes
    pub fn public_key_bytes(&self) -> &[u8; 32] {
        self.inner.public.as_bytes()
    }

    /// Secret seed (S...) for this keypair
    pub fn secret_seed(&self) -> String {
        strkey::encode_secret_seed(self.inner.secret.as_bytes())
    }

    /// Sign a message (a transaction hash) with this keypair
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.inner.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .field("secret_seed", &"<redacted>")
            .finish()
    }
}
