//! Output recognition: turning raw blocks into wallet state changes.
//!
//! `process_block` never mutates the aggregate itself; it produces the
//! three lists of [`TransactionData`], which the sync loop applies
//! atomically. That keeps partial failures (a missing global index, a
//! malformed transaction) from leaving half a block behind.

use crate::crypto::CryptoOps;
use crate::error::WalletError;
use crate::subwallets::SubWallets;
use crate::sync_status::SynchronizationStatus;
use crate::types::{Transaction, TransactionData, TxInput};
use std::collections::HashMap;
use std::sync::Arc;
use turtle_rpc::wire::{Block, RawTransaction};
use turtle_types::keys::{KeyImage, PublicKey};
use turtle_types::WalletConfig;

/// One scanned transaction: the synthesized record, the outputs it pays
/// us, and the key images it spends from us.
type ScannedTransaction = (
    Transaction,
    Vec<(PublicKey, TxInput)>,
    Vec<(PublicKey, KeyImage)>,
);

/// Recognizes our outputs and spends in fetched blocks.
pub struct WalletSynchronizer {
    crypto: Arc<dyn CryptoOps>,
    scan_coinbase_transactions: bool,
}

impl WalletSynchronizer {
    pub fn new(crypto: Arc<dyn CryptoOps>, config: &WalletConfig) -> Self {
        Self {
            crypto,
            scan_coinbase_transactions: config.scan_coinbase_transactions,
        }
    }

    /// If this block cannot extend our committed tip, the chain forked.
    ///
    /// A batch anchored on our checkpoints only restarts at or below the
    /// tip when the daemon no longer recognizes our newest hashes, so a
    /// non-advancing height is the fork signal. The returned height is
    /// where unwinding must begin.
    pub fn check_fork(&self, block: &Block, sync_status: &SynchronizationStatus) -> Option<u64> {
        if sync_status.is_empty() {
            return None;
        }
        if block.height <= sync_status.last_known_block_height() {
            return Some(block.height);
        }
        None
    }

    /// Scan every transaction of `block` against the wallet.
    ///
    /// A transaction that fails recognition (malformed key, underive
    /// failure) is logged and skipped; the rest of the block proceeds.
    pub fn process_block(&self, block: &Block, sub_wallets: &SubWallets) -> TransactionData {
        let mut data = TransactionData::default();
        // Key images of outputs found earlier in this same block, so a
        // spend in a later transaction still resolves before anything
        // is applied to the aggregate.
        let mut pending_key_images: HashMap<KeyImage, PublicKey> = HashMap::new();

        for tx in block.transactions() {
            if tx.is_coinbase() && !self.scan_coinbase_transactions {
                continue;
            }

            match self.process_transaction(tx, block, sub_wallets, &mut pending_key_images) {
                Ok(Some((transaction, inputs, spent))) => {
                    data.inputs_to_add.extend(inputs);
                    data.key_images_to_mark_spent.extend(spent);
                    data.transactions_to_add.push(transaction);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        block_height = block.height,
                        tx_hash = %hex::encode(tx.hash()),
                        error = %e,
                        "skipping unscannable transaction",
                    );
                }
            }
        }

        data
    }

    /// Scan one transaction; `None` when it does not touch the wallet.
    fn process_transaction(
        &self,
        tx: RawTransaction<'_>,
        block: &Block,
        sub_wallets: &SubWallets,
        pending_key_images: &mut HashMap<KeyImage, PublicKey>,
    ) -> Result<Option<ScannedTransaction>, WalletError> {
        let derivation = self
            .crypto
            .generate_key_derivation(&tx.tx_public_key(), &sub_wallets.private_view_key())?;

        let mut transfers: HashMap<PublicKey, i64> = HashMap::new();
        let mut inputs = Vec::new();
        let mut spent = Vec::new();

        for (index, output) in tx.outputs().iter().enumerate() {
            let index = index as u64;
            let derived_spend_key =
                self.crypto
                    .underive_public_key(&derivation, index, &output.key)?;

            let Some(sub_wallet) = sub_wallets.get(&derived_spend_key) else {
                continue;
            };

            let key_image =
                sub_wallet.get_tx_input_key_image(&*self.crypto, &derivation, index)?;

            if !sub_wallets.is_view_wallet() {
                pending_key_images.insert(key_image, derived_spend_key);
            }

            inputs.push((
                derived_spend_key,
                TxInput {
                    key_image,
                    amount: output.amount,
                    block_height: block.height,
                    tx_public_key: tx.tx_public_key(),
                    transaction_index: index,
                    global_output_index: output.global_index,
                    key: output.key,
                    spend_height: 0,
                    unlock_time: tx.unlock_time(),
                    parent_tx_hash: tx.hash(),
                },
            ));

            *transfers.entry(derived_spend_key).or_insert(0) += output.amount as i64;
        }

        // Spends only exist on standard transactions.
        if let RawTransaction::Standard(stx) = tx {
            for input in &stx.inputs {
                let owner = sub_wallets
                    .get_key_image_owner(&input.key_image)
                    .or_else(|| pending_key_images.get(&input.key_image).copied());
                if let Some(public_spend_key) = owner {
                    spent.push((public_spend_key, input.key_image));
                    *transfers.entry(public_spend_key).or_insert(0) -= input.amount as i64;
                }
            }
        }

        if transfers.is_empty() {
            return Ok(None);
        }

        let (fee, payment_id) = match tx {
            RawTransaction::Coinbase(_) => (0, String::new()),
            RawTransaction::Standard(stx) => {
                (stx.fee(), stx.payment_id.clone().unwrap_or_default())
            }
        };

        let transaction = Transaction {
            hash: tx.hash(),
            transfers,
            fee,
            block_height: block.height,
            timestamp: block.timestamp,
            payment_id,
            unlock_time: tx.unlock_time(),
            is_coinbase: tx.is_coinbase(),
        };

        Ok(Some((transaction, inputs, spent)))
    }
}
