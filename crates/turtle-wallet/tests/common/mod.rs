//! Shared test fixtures: a deterministic CryptoNote fake and a scripted
//! in-memory daemon.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use turtle_rpc::wire::{Block, CoinbaseTransaction, RawInput, RawOutput, StandardTransaction};
use turtle_rpc::{Daemon, DaemonInfo, FeeInfo, RpcError, TransactionsStatus};
use turtle_types::keys::{KeyDerivation, KeyImage, PublicKey, SecretKey, TxHash};
use turtle_types::WalletConfig;
use turtle_wallet::crypto::{CryptoOps, DecodedAddress};
use turtle_wallet::WalletError;

// =============================================================================
// Fake crypto
// =============================================================================

/// Deterministic stand-in for the CryptoNote primitives.
///
/// The "curve" is xor arithmetic: `underive` is its own inverse, so the
/// fixture can mint outputs the scanner will recognize, while keys that
/// were not built for the wallet never match.
pub struct FakeCrypto;

/// Transactions carrying this tx public key make the fake derivation
/// fail, for exercising the skip-on-error path.
pub const POISON_TX_PUBLIC_KEY: PublicKey = [0xEE; 32];

fn mask(derivation: &KeyDerivation, index: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (j, byte) in out.iter_mut().enumerate() {
        *byte = derivation[j]
            ^ (index as u8)
                .wrapping_mul(31)
                .wrapping_add((j as u8).wrapping_mul(7))
                .wrapping_add(13);
    }
    out
}

impl FakeCrypto {
    /// Build the one-time output key the scanner will underive back to
    /// `spend_public_key`.
    pub fn derive_output_key(
        derivation: &KeyDerivation,
        index: u64,
        spend_public_key: &PublicKey,
    ) -> PublicKey {
        let mask = mask(derivation, index);
        let mut out = [0u8; 32];
        for j in 0..32 {
            out[j] = spend_public_key[j] ^ mask[j];
        }
        out
    }
}

impl CryptoOps for FakeCrypto {
    fn generate_key_derivation(
        &self,
        tx_public_key: &PublicKey,
        private_view_key: &SecretKey,
    ) -> Result<KeyDerivation, WalletError> {
        if tx_public_key == &POISON_TX_PUBLIC_KEY {
            return Err(WalletError::InvalidKey);
        }
        let mut out = [0u8; 32];
        for j in 0..32 {
            out[j] = tx_public_key[j] ^ private_view_key[j] ^ 0x5A;
        }
        Ok(out)
    }

    fn underive_public_key(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        output_key: &PublicKey,
    ) -> Result<PublicKey, WalletError> {
        Ok(Self::derive_output_key(derivation, output_index, output_key))
    }

    fn generate_key_image(
        &self,
        public_spend_key: &PublicKey,
        private_spend_key: &SecretKey,
        derivation: &KeyDerivation,
        output_index: u64,
    ) -> Result<KeyImage, WalletError> {
        let mask = mask(derivation, output_index);
        let mut out = [0u8; 32];
        for j in 0..32 {
            out[j] = public_spend_key[j] ^ private_spend_key[j] ^ mask[j] ^ 0xC3;
        }
        Ok(out)
    }

    fn secret_key_to_public_key(
        &self,
        secret_key: &SecretKey,
    ) -> Result<PublicKey, WalletError> {
        if secret_key == &[0u8; 32] {
            return Err(WalletError::InvalidKey);
        }
        let mut out = [0u8; 32];
        for j in 0..32 {
            out[j] = secret_key[j] ^ 0x99;
        }
        Ok(out)
    }

    fn generate_spend_key_pair(&self) -> (PublicKey, SecretKey) {
        let secret: SecretKey = rand::random();
        let public = self
            .secret_key_to_public_key(&secret)
            .expect("random key is non-zero");
        (public, secret)
    }

    fn derive_view_key(&self, private_spend_key: &SecretKey) -> SecretKey {
        let mut out = [0u8; 32];
        for j in 0..32 {
            out[j] = private_spend_key[j].wrapping_add(3);
        }
        out
    }

    fn mnemonic_to_private_spend_key(&self, mnemonic: &str) -> Result<SecretKey, WalletError> {
        turtle_types::keys::hex_to_32(mnemonic.trim())
            .ok_or_else(|| WalletError::InvalidMnemonic("not a test mnemonic".into()))
    }

    fn private_spend_key_to_mnemonic(
        &self,
        private_spend_key: &SecretKey,
    ) -> Result<String, WalletError> {
        Ok(hex::encode(private_spend_key))
    }

    fn encode_address(
        &self,
        public_spend_key: &PublicKey,
        public_view_key: &PublicKey,
    ) -> Result<String, WalletError> {
        Ok(format!(
            "TRTL{}{}",
            hex::encode(public_spend_key),
            hex::encode(public_view_key),
        ))
    }

    fn decode_address(&self, address: &str) -> Result<DecodedAddress, WalletError> {
        let body = address
            .strip_prefix("TRTL")
            .ok_or_else(|| WalletError::AddressNotValid("missing prefix".into()))?;

        let (keys, payment_id) = match body.len() {
            128 => (body, None),
            192 => (&body[..128], Some(body[128..].to_string())),
            _ => {
                return Err(WalletError::AddressNotValid("wrong length".into()));
            }
        };

        let public_spend_key = turtle_types::keys::hex_to_32(&keys[..64])
            .ok_or_else(|| WalletError::AddressNotValid("bad spend key".into()))?;
        let public_view_key = turtle_types::keys::hex_to_32(&keys[64..])
            .ok_or_else(|| WalletError::AddressNotValid("bad view key".into()))?;

        Ok(DecodedAddress {
            public_spend_key,
            public_view_key,
            payment_id,
        })
    }

    fn check_key(&self, key: &PublicKey) -> bool {
        key != &[0u8; 32]
    }
}

/// A config whose address lengths match the fake encoding.
pub fn test_config() -> WalletConfig {
    WalletConfig {
        standard_address_length: 132,
        integrated_address_length: 196,
        ..WalletConfig::default()
    }
}

// =============================================================================
// Scripted daemon
// =============================================================================

/// In-memory daemon: hand it batches and answers, then tick the wallet.
#[derive(Default)]
pub struct MockDaemon {
    pub info: Mutex<DaemonInfo>,
    pub fee: Mutex<Option<FeeInfo>>,
    pub sync_batches: Mutex<VecDeque<Vec<Block>>>,
    pub global_indexes: Mutex<HashMap<TxHash, Vec<u64>>>,
    pub unknown_transactions: Mutex<Vec<TxHash>>,
    pub offline: Mutex<bool>,
}

impl MockDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_heights(&self, local: u64, network: u64) {
        let mut info = self.info.lock().unwrap();
        info.height = local;
        info.network_height = network;
    }

    pub fn push_batch(&self, blocks: Vec<Block>) {
        self.sync_batches.lock().unwrap().push_back(blocks);
    }

    pub fn set_global_indexes(&self, tx_hash: TxHash, indexes: Vec<u64>) {
        self.global_indexes.lock().unwrap().insert(tx_hash, indexes);
    }

    pub fn set_unknown_transactions(&self, hashes: Vec<TxHash>) {
        *self.unknown_transactions.lock().unwrap() = hashes;
    }

    fn check_online(&self) -> Result<(), RpcError> {
        if *self.offline.lock().unwrap() {
            return Err(RpcError::Timeout {
                endpoint: "/mock".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Daemon for MockDaemon {
    async fn info(&self) -> Result<DaemonInfo, RpcError> {
        self.check_online()?;
        Ok(self.info.lock().unwrap().clone())
    }

    async fn fee(&self) -> Result<FeeInfo, RpcError> {
        self.check_online()?;
        self.fee
            .lock()
            .unwrap()
            .clone()
            .ok_or(RpcError::NoResult {
                endpoint: "/fee".into(),
            })
    }

    async fn get_wallet_sync_data(
        &self,
        _block_hash_checkpoints: Vec<TxHash>,
        _start_height: u64,
        _start_timestamp: u64,
    ) -> Result<Vec<Block>, RpcError> {
        self.check_online()?;
        Ok(self
            .sync_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn get_global_indexes_for_range(
        &self,
        _start_height: u64,
        _end_height: u64,
    ) -> Result<HashMap<TxHash, Vec<u64>>, RpcError> {
        self.check_online()?;
        Ok(self.global_indexes.lock().unwrap().clone())
    }

    async fn get_transactions_status(
        &self,
        transaction_hashes: Vec<TxHash>,
    ) -> Result<TransactionsStatus, RpcError> {
        self.check_online()?;
        let unknown = self.unknown_transactions.lock().unwrap();
        Ok(TransactionsStatus {
            transactions_unknown: transaction_hashes
                .into_iter()
                .filter(|h| unknown.contains(h))
                .collect(),
        })
    }
}

// =============================================================================
// Block builders
// =============================================================================

pub fn block_hash(height: u64) -> TxHash {
    let mut hash = [0xB0u8; 32];
    hash[..8].copy_from_slice(&height.to_le_bytes());
    hash
}

pub fn empty_block(height: u64) -> Block {
    Block {
        height,
        hash: block_hash(height),
        timestamp: 1_600_000_000 + height,
        coinbase_tx: None,
        txs: Vec::new(),
    }
}

/// A block whose hash differs from the canonical one, for fork tests.
pub fn forked_block(height: u64) -> Block {
    let mut block = empty_block(height);
    block.hash[31] = 0xFE;
    block
}

/// A standard transaction paying `amount` to `recipient_spend_pub`,
/// with one foreign input covering amount + fee.
pub fn tx_paying(
    crypto: &FakeCrypto,
    private_view_key: &SecretKey,
    recipient_spend_pub: &PublicKey,
    amount: u64,
    fee: u64,
    seed: u8,
    unlock_time: u64,
) -> StandardTransaction {
    let tx_public_key = [seed; 32];
    let derivation = crypto
        .generate_key_derivation(&tx_public_key, private_view_key)
        .unwrap();

    StandardTransaction {
        hash: [seed ^ 0xFF; 32],
        tx_public_key,
        unlock_time,
        outputs: vec![RawOutput {
            key: FakeCrypto::derive_output_key(&derivation, 0, recipient_spend_pub),
            amount,
            global_index: Some(1000 + seed as u64),
        }],
        payment_id: None,
        inputs: vec![RawInput {
            amount: amount + fee,
            key_image: [seed ^ 0xA5; 32],
            output_offsets: vec![1, 2, 3],
        }],
    }
}

/// A transaction spending one of our key images, paying a stranger.
pub fn tx_spending(key_image: KeyImage, amount: u64, fee: u64, seed: u8) -> StandardTransaction {
    StandardTransaction {
        hash: [seed ^ 0xFF; 32],
        tx_public_key: [seed; 32],
        unlock_time: 0,
        outputs: vec![RawOutput {
            key: [0x42; 32],
            amount: amount - fee,
            global_index: Some(2000 + seed as u64),
        }],
        payment_id: None,
        inputs: vec![RawInput {
            amount,
            key_image,
            output_offsets: vec![4, 5, 6],
        }],
    }
}

/// A coinbase transaction paying `amount` to `recipient_spend_pub`.
pub fn coinbase_paying(
    crypto: &FakeCrypto,
    private_view_key: &SecretKey,
    recipient_spend_pub: &PublicKey,
    amount: u64,
    seed: u8,
    unlock_time: u64,
) -> CoinbaseTransaction {
    let tx_public_key = [seed; 32];
    let derivation = crypto
        .generate_key_derivation(&tx_public_key, private_view_key)
        .unwrap();

    CoinbaseTransaction {
        hash: [seed ^ 0xFF; 32],
        tx_public_key,
        unlock_time,
        outputs: vec![RawOutput {
            key: FakeCrypto::derive_output_key(&derivation, 0, recipient_spend_pub),
            amount,
            global_index: Some(3000 + seed as u64),
        }],
    }
}
