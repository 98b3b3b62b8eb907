//! The whole-wallet aggregate: every subwallet plus the transaction lists.
//!
//! Subwallets live in a creation-ordered vector with a spend-key index
//! map, so cross-subwallet operations stay on the aggregate and no
//! subwallet ever needs a pointer back to it.

use crate::subwallet::SubWallet;
use crate::types::{Transaction, TxInput, UnconfirmedInput};
use std::collections::HashMap;
use turtle_types::keys::{KeyImage, PublicKey, SecretKey, TxHash};

/// Owns all subwallets, the confirmed/locked transactions, the private
/// view key, and the per-send transaction private keys.
#[derive(Debug, Clone)]
pub struct SubWallets {
    /// Creation order; element 0 is the primary subwallet.
    wallets: Vec<SubWallet>,
    /// Spend key -> position in `wallets`.
    index: HashMap<PublicKey, usize>,
    /// Transactions observed on-chain.
    transactions: Vec<Transaction>,
    /// Locally-issued sends not yet observed on-chain.
    locked_transactions: Vec<Transaction>,
    private_view_key: SecretKey,
    is_view_wallet: bool,
    /// Private keys of transactions this wallet sent.
    tx_private_keys: HashMap<TxHash, SecretKey>,
}

impl SubWallets {
    /// Build the aggregate around its first (primary) subwallet.
    pub fn new(private_view_key: SecretKey, is_view_wallet: bool, primary: SubWallet) -> Self {
        let mut this = Self {
            wallets: Vec::new(),
            index: HashMap::new(),
            transactions: Vec::new(),
            locked_transactions: Vec::new(),
            private_view_key,
            is_view_wallet,
            tx_private_keys: HashMap::new(),
        };
        this.add_sub_wallet(primary);
        this
    }

    /// Rebuild from deserialized parts; the serialization layer has
    /// already validated the invariants.
    pub(crate) fn from_parts(
        wallets: Vec<SubWallet>,
        transactions: Vec<Transaction>,
        locked_transactions: Vec<Transaction>,
        private_view_key: SecretKey,
        is_view_wallet: bool,
        tx_private_keys: HashMap<TxHash, SecretKey>,
    ) -> Self {
        let index = wallets
            .iter()
            .enumerate()
            .map(|(i, w)| (w.public_spend_key(), i))
            .collect();
        Self {
            wallets,
            index,
            transactions,
            locked_transactions,
            private_view_key,
            is_view_wallet,
            tx_private_keys,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn private_view_key(&self) -> SecretKey {
        self.private_view_key
    }

    pub fn is_view_wallet(&self) -> bool {
        self.is_view_wallet
    }

    /// Public spend keys in creation order.
    pub fn public_spend_keys(&self) -> Vec<PublicKey> {
        self.wallets.iter().map(|w| w.public_spend_key()).collect()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.wallets.iter().map(|w| w.address().to_string()).collect()
    }

    pub fn sub_wallet_count(&self) -> usize {
        self.wallets.len()
    }

    pub fn get(&self, public_spend_key: &PublicKey) -> Option<&SubWallet> {
        self.index.get(public_spend_key).map(|&i| &self.wallets[i])
    }

    pub fn get_mut(&mut self, public_spend_key: &PublicKey) -> Option<&mut SubWallet> {
        match self.index.get(public_spend_key) {
            Some(&i) => Some(&mut self.wallets[i]),
            None => None,
        }
    }

    pub fn sub_wallets(&self) -> &[SubWallet] {
        &self.wallets
    }

    /// The first-created subwallet. A wallet with no subwallets cannot
    /// be constructed, so absence is a caller bug.
    pub fn get_primary_sub_wallet(&self) -> &SubWallet {
        self.wallets.first().expect("wallet has no primary subwallet")
    }

    pub fn get_primary_address(&self) -> String {
        self.get_primary_sub_wallet().address().to_string()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn locked_transactions(&self) -> &[Transaction] {
        &self.locked_transactions
    }

    pub fn locked_transaction_hashes(&self) -> Vec<TxHash> {
        self.locked_transactions.iter().map(|t| t.hash).collect()
    }

    pub fn get_tx_private_key(&self, hash: &TxHash) -> Option<SecretKey> {
        self.tx_private_keys.get(hash).copied()
    }

    pub(crate) fn tx_private_keys(&self) -> &HashMap<TxHash, SecretKey> {
        &self.tx_private_keys
    }

    // ── Mutators ─────────────────────────────────────────────────────────

    /// Register another subwallet. Duplicate spend keys are a caller bug.
    pub fn add_sub_wallet(&mut self, sub_wallet: SubWallet) {
        let key = sub_wallet.public_spend_key();
        assert!(
            !self.index.contains_key(&key),
            "subwallet {} already exists",
            hex::encode(key),
        );
        self.index.insert(key, self.wallets.len());
        self.wallets.push(sub_wallet);
    }

    /// Record a transaction observed on-chain. A locked copy with the
    /// same hash is promoted first: dropped from the locked list along
    /// with its unconfirmed change, which just arrived as real inputs.
    /// Re-adding a confirmed hash is a caller bug.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.locked_transactions.retain(|t| t.hash != transaction.hash);
        for wallet in &mut self.wallets {
            wallet.remove_confirmed_unconfirmed_input(&transaction.hash);
        }

        assert!(
            !self.transactions.iter().any(|t| t.hash == transaction.hash),
            "transaction {} is already confirmed",
            hex::encode(transaction.hash),
        );

        self.transactions.push(transaction);
    }

    /// Record a locally-issued send awaiting confirmation.
    pub fn add_unconfirmed_transaction(&mut self, transaction: Transaction) {
        assert!(
            !self.transactions.iter().any(|t| t.hash == transaction.hash)
                && !self.locked_transactions.iter().any(|t| t.hash == transaction.hash),
            "transaction {} is already known",
            hex::encode(transaction.hash),
        );
        self.locked_transactions.push(transaction);
    }

    pub fn store_tx_private_key(&mut self, hash: TxHash, key: SecretKey) {
        self.tx_private_keys.insert(hash, key);
    }

    /// Store a received output on its owning subwallet. The spend key
    /// must be known; `process_block` only produces known keys.
    pub fn store_input(&mut self, public_spend_key: &PublicKey, input: TxInput) {
        let is_view = self.is_view_wallet;
        let wallet = self
            .get_mut(public_spend_key)
            .unwrap_or_else(|| panic!("unknown subwallet {}", hex::encode(public_spend_key)));
        wallet.store_input(input, is_view);
    }

    /// Store unconfirmed change on its owning subwallet.
    pub fn store_unconfirmed_input(
        &mut self,
        public_spend_key: &PublicKey,
        input: UnconfirmedInput,
    ) {
        let wallet = self
            .get_mut(public_spend_key)
            .unwrap_or_else(|| panic!("unknown subwallet {}", hex::encode(public_spend_key)));
        wallet.store_unconfirmed_input(input);
    }

    /// Mark an input spent on its owning subwallet.
    pub fn mark_input_as_spent(
        &mut self,
        public_spend_key: &PublicKey,
        key_image: &KeyImage,
        spend_height: u64,
    ) {
        let wallet = self
            .get_mut(public_spend_key)
            .unwrap_or_else(|| panic!("unknown subwallet {}", hex::encode(public_spend_key)));
        wallet.mark_input_as_spent(key_image, spend_height);
    }

    /// Which subwallet, if any, owns this key image.
    ///
    /// View wallets store no real key images, so ownership is never
    /// claimed there.
    pub fn get_key_image_owner(&self, key_image: &KeyImage) -> Option<PublicKey> {
        if self.is_view_wallet {
            return None;
        }
        self.wallets
            .iter()
            .find(|w| w.has_key_image(key_image))
            .map(|w| w.public_spend_key())
    }

    /// `(unlocked, locked)` over `subset` or every subwallet.
    ///
    /// Keys in `subset` must be known; the facade validates user input
    /// before calling.
    pub fn get_balance(
        &self,
        current_height: u64,
        unlock_threshold: u64,
        subset: Option<&[PublicKey]>,
    ) -> (u64, u64) {
        let sum = |wallet: &SubWallet| wallet.get_balance(current_height, unlock_threshold);

        let (mut unlocked, mut locked) = (0u64, 0u64);
        match subset {
            Some(keys) => {
                for key in keys {
                    let wallet = self
                        .get(key)
                        .unwrap_or_else(|| panic!("unknown subwallet {}", hex::encode(key)));
                    let (u, l) = sum(wallet);
                    unlocked += u;
                    locked += l;
                }
            }
            None => {
                for wallet in &self.wallets {
                    let (u, l) = sum(wallet);
                    unlocked += u;
                    locked += l;
                }
            }
        }
        (unlocked, locked)
    }

    /// Forget a cancelled send everywhere: the locked list, every
    /// subwallet's unconfirmed change, and its stored private key.
    pub fn remove_cancelled_transaction(&mut self, hash: &TxHash) {
        self.locked_transactions.retain(|t| t.hash != *hash);
        for wallet in &mut self.wallets {
            wallet.remove_cancelled_transaction(hash);
        }
        self.tx_private_keys.remove(hash);
    }

    /// Unwind a chain fork at `fork_height`. Locked transactions are
    /// untouched; they were never on the forked chain.
    pub fn remove_forked_transactions(&mut self, fork_height: u64) {
        self.transactions.retain(|t| t.block_height < fork_height);
        for wallet in &mut self.wallets {
            wallet.remove_forked_inputs(fork_height);
        }
    }

    /// Propagate a timestamp-to-height resolution to every subwallet.
    pub fn convert_sync_timestamp_to_height(&mut self, timestamp: u64, height: u64) {
        for wallet in &mut self.wallets {
            wallet.convert_sync_timestamp_to_height(timestamp, height);
        }
    }
}
