//! A single subwallet: one spend key pair sharing the wallet's view key.

use crate::crypto::CryptoOps;
use crate::error::WalletError;
use crate::types::{is_input_unlocked, now_seconds, TxInput, UnconfirmedInput};
use std::collections::HashSet;
use turtle_types::keys::{KeyDerivation, KeyImage, PublicKey, SecretKey, TxHash};

/// Per-spend-key store of received outputs and their spent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubWallet {
    public_spend_key: PublicKey,
    /// Absent for view-only subwallets.
    private_spend_key: Option<SecretKey>,
    address: String,
    /// Height to begin scanning from, once known.
    scan_height: u64,
    /// Used instead of `scan_height` until the daemon maps it to a height.
    creation_timestamp: u64,
    /// Outputs paid to this subwallet.
    inputs: Vec<TxInput>,
    /// Unconfirmed change from locally-issued sends.
    locked_inputs: Vec<UnconfirmedInput>,
    /// Key image membership for O(1) spend recognition.
    key_images: HashSet<KeyImage>,
}

impl SubWallet {
    pub fn new(
        public_spend_key: PublicKey,
        private_spend_key: Option<SecretKey>,
        address: String,
        scan_height: u64,
        creation_timestamp: u64,
    ) -> Self {
        Self {
            public_spend_key,
            private_spend_key,
            address,
            scan_height,
            creation_timestamp,
            inputs: Vec::new(),
            locked_inputs: Vec::new(),
            key_images: HashSet::new(),
        }
    }

    /// Rebuild from deserialized parts. The key-image set must already
    /// cover every input; the serialization layer verifies this.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        public_spend_key: PublicKey,
        private_spend_key: Option<SecretKey>,
        address: String,
        scan_height: u64,
        creation_timestamp: u64,
        inputs: Vec<TxInput>,
        locked_inputs: Vec<UnconfirmedInput>,
        key_images: HashSet<KeyImage>,
    ) -> Self {
        Self {
            public_spend_key,
            private_spend_key,
            address,
            scan_height,
            creation_timestamp,
            inputs,
            locked_inputs,
            key_images,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn public_spend_key(&self) -> PublicKey {
        self.public_spend_key
    }

    pub fn private_spend_key(&self) -> Option<SecretKey> {
        self.private_spend_key
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn scan_height(&self) -> u64 {
        self.scan_height
    }

    pub fn creation_timestamp(&self) -> u64 {
        self.creation_timestamp
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn locked_inputs(&self) -> &[UnconfirmedInput] {
        &self.locked_inputs
    }

    pub fn key_images(&self) -> &HashSet<KeyImage> {
        &self.key_images
    }

    pub fn has_key_image(&self, key_image: &KeyImage) -> bool {
        self.key_images.contains(key_image)
    }

    // ── Mutators ─────────────────────────────────────────────────────────

    /// Record a received output. The caller guarantees no duplicate
    /// `(parent_tx_hash, transaction_index)` pair is ever stored.
    pub fn store_input(&mut self, input: TxInput, is_view_wallet: bool) {
        if !is_view_wallet {
            self.key_images.insert(input.key_image);
        }
        self.inputs.push(input);
    }

    /// Record unconfirmed change from a locally-issued send.
    pub fn store_unconfirmed_input(&mut self, input: UnconfirmedInput) {
        self.locked_inputs.push(input);
    }

    /// Mark the input with this key image as spent at `spend_height`.
    ///
    /// The key image must belong to this subwallet; feeding one that
    /// does not is a caller bug.
    pub fn mark_input_as_spent(&mut self, key_image: &KeyImage, spend_height: u64) {
        let input = self
            .inputs
            .iter_mut()
            .find(|i| i.key_image == *key_image)
            .unwrap_or_else(|| {
                panic!(
                    "no input with key image {} in subwallet {}",
                    hex::encode(key_image),
                    hex::encode(self.public_spend_key),
                )
            });
        input.spend_height = spend_height;
    }

    /// `(unlocked, locked)` sums over unspent inputs at `current_height`.
    pub fn get_balance(&self, current_height: u64, unlock_threshold: u64) -> (u64, u64) {
        let now = now_seconds();
        let mut unlocked = 0u64;
        let mut locked = 0u64;

        for input in self.inputs.iter().filter(|i| i.is_unspent()) {
            if is_input_unlocked(input.unlock_time, current_height, unlock_threshold, now) {
                unlocked += input.amount;
            } else {
                locked += input.amount;
            }
        }

        (unlocked, locked)
    }

    /// Unwind a chain fork: drop inputs received at or above
    /// `fork_height`, and make inputs spent there spendable again.
    pub fn remove_forked_inputs(&mut self, fork_height: u64) {
        self.inputs.retain(|i| i.block_height < fork_height);
        // Surviving inputs whose spend was orphaned become spendable.
        for input in &mut self.inputs {
            if input.spend_height >= fork_height {
                input.spend_height = 0;
            }
        }
        let kept: HashSet<KeyImage> = self.inputs.iter().map(|i| i.key_image).collect();
        self.key_images.retain(|ki| kept.contains(ki));
    }

    /// Drop unconfirmed change belonging to a cancelled send.
    pub fn remove_cancelled_transaction(&mut self, hash: &TxHash) {
        self.locked_inputs.retain(|i| i.parent_tx_hash != *hash);
    }

    /// Promote unconfirmed change once its parent appears on-chain.
    pub fn remove_confirmed_unconfirmed_input(&mut self, parent_tx_hash: &TxHash) {
        self.locked_inputs.retain(|i| i.parent_tx_hash != *parent_tx_hash);
    }

    /// Once the daemon has mapped our creation timestamp to a height,
    /// scan decisions use the height instead.
    pub fn convert_sync_timestamp_to_height(&mut self, timestamp: u64, height: u64) {
        if self.creation_timestamp == timestamp {
            self.creation_timestamp = 0;
            self.scan_height = height;
        }
    }

    /// Key image for the output at `output_index` of a transaction we
    /// received through `derivation`. View-only subwallets have no spend
    /// key and store an all-zero marker instead.
    pub fn get_tx_input_key_image(
        &self,
        crypto: &dyn CryptoOps,
        derivation: &KeyDerivation,
        output_index: u64,
    ) -> Result<KeyImage, WalletError> {
        match self.private_spend_key {
            Some(ref private_spend_key) => crypto.generate_key_image(
                &self.public_spend_key,
                private_spend_key,
                derivation,
                output_index,
            ),
            None => Ok([0u8; 32]),
        }
    }
}
