//! The CryptoNote primitive capability.
//!
//! The wallet core never performs curve arithmetic itself; everything it
//! needs from the CryptoNote layer is behind [`CryptoOps`]. Implementations
//! wrap an ed25519/keccak library; tests substitute a deterministic fake.

use crate::error::WalletError;
use turtle_types::keys::{KeyDerivation, KeyImage, PublicKey, SecretKey};

/// An address broken into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub public_spend_key: PublicKey,
    pub public_view_key: PublicKey,
    /// Present only for integrated addresses.
    pub payment_id: Option<String>,
}

impl DecodedAddress {
    pub fn is_integrated(&self) -> bool {
        self.payment_id.is_some()
    }
}

/// CryptoNote primitives consumed by the wallet.
pub trait CryptoOps: Send + Sync {
    /// Shared secret between sender and receiver:
    /// `D = a * R` for tx public key `R` and private view key `a`.
    fn generate_key_derivation(
        &self,
        tx_public_key: &PublicKey,
        private_view_key: &SecretKey,
    ) -> Result<KeyDerivation, WalletError>;

    /// Strip the one-time component from an output key, recovering the
    /// public spend key it was built for.
    fn underive_public_key(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        output_key: &PublicKey,
    ) -> Result<PublicKey, WalletError>;

    /// The double-spend marker for an output we own.
    fn generate_key_image(
        &self,
        public_spend_key: &PublicKey,
        private_spend_key: &SecretKey,
        derivation: &KeyDerivation,
        output_index: u64,
    ) -> Result<KeyImage, WalletError>;

    /// `P = s * G`.
    fn secret_key_to_public_key(&self, secret_key: &SecretKey)
        -> Result<PublicKey, WalletError>;

    /// Fresh random spend key pair for a new (sub)wallet.
    fn generate_spend_key_pair(&self) -> (PublicKey, SecretKey);

    /// The deterministic private view key derived from a private spend
    /// key (first derivation of the seed).
    fn derive_view_key(&self, private_spend_key: &SecretKey) -> SecretKey;

    /// Recover the private spend key from a 25-word mnemonic.
    fn mnemonic_to_private_spend_key(&self, mnemonic: &str) -> Result<SecretKey, WalletError>;

    /// Render a private spend key as its 25-word mnemonic.
    fn private_spend_key_to_mnemonic(
        &self,
        private_spend_key: &SecretKey,
    ) -> Result<String, WalletError>;

    /// Base58-encode a standard address from its key halves.
    fn encode_address(
        &self,
        public_spend_key: &PublicKey,
        public_view_key: &PublicKey,
    ) -> Result<String, WalletError>;

    /// Decode and checksum-verify an address.
    fn decode_address(&self, address: &str) -> Result<DecodedAddress, WalletError>;

    /// Whether the bytes are a canonical curve point.
    fn check_key(&self, key: &PublicKey) -> bool;
}
