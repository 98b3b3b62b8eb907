//! Wallet-view data types.
//!
//! These are the shapes the wallet stores and serializes, as opposed to
//! the wire shapes in `turtle_rpc::wire` the daemon hands us.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use turtle_types::keys::{hex32, KeyImage, PublicKey, SecretKey, TxHash};

/// An output paid to one of our subwallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    #[serde(with = "hex32")]
    pub key_image: KeyImage,
    pub amount: u64,
    pub block_height: u64,
    #[serde(with = "hex32")]
    pub tx_public_key: PublicKey,
    /// Position of this output within its parent transaction.
    pub transaction_index: u64,
    /// Chain-wide output index, backfilled when the daemon omits it.
    pub global_output_index: Option<u64>,
    /// The one-time output key itself.
    #[serde(with = "hex32")]
    pub key: PublicKey,
    /// 0 while unspent.
    pub spend_height: u64,
    pub unlock_time: u64,
    #[serde(with = "hex32")]
    pub parent_tx_hash: TxHash,
}

impl TxInput {
    pub fn is_unspent(&self) -> bool {
        self.spend_height == 0
    }
}

/// Change from a locally-issued send, not yet observed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedInput {
    pub amount: u64,
    #[serde(with = "hex32")]
    pub key: PublicKey,
    #[serde(with = "hex32")]
    pub parent_tx_hash: TxHash,
}

/// A transaction as the wallet sees it: net value movement per subwallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: TxHash,
    /// Net delta per public spend key; negative entries are spends.
    pub transfers: HashMap<PublicKey, i64>,
    pub fee: u64,
    pub block_height: u64,
    pub timestamp: u64,
    /// Empty string when the transaction carries no payment ID.
    pub payment_id: String,
    pub unlock_time: u64,
    pub is_coinbase: bool,
}

impl Transaction {
    /// Net amount across every subwallet this transaction touches.
    pub fn total_amount(&self) -> i64 {
        self.transfers.values().sum()
    }

    /// Zero-fee non-coinbase self-transfers are fusion transactions.
    pub fn is_fusion(&self) -> bool {
        self.fee == 0 && !self.is_coinbase
    }
}

/// The three lists `process_block` produces, applied atomically.
#[derive(Debug, Default)]
pub struct TransactionData {
    pub transactions_to_add: Vec<Transaction>,
    pub inputs_to_add: Vec<(PublicKey, TxInput)>,
    pub key_images_to_mark_spent: Vec<(PublicKey, KeyImage)>,
}

impl TransactionData {
    pub fn is_empty(&self) -> bool {
        self.transactions_to_add.is_empty()
            && self.inputs_to_add.is_empty()
            && self.key_images_to_mark_spent.is_empty()
    }
}

/// A subwallet's key material, handed back by the facade.
#[derive(Debug, Clone)]
pub struct SpendKeys {
    pub public_spend_key: PublicKey,
    /// Absent for view-only subwallets.
    pub private_spend_key: Option<SecretKey>,
}

/// Current Unix time in seconds.
pub fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Whether an output with `unlock_time` is spendable.
///
/// Values below the threshold are block heights; at or above, Unix
/// seconds. `unlock_time == 0` is always unlocked.
pub fn is_input_unlocked(
    unlock_time: u64,
    current_height: u64,
    threshold: u64,
    now: u64,
) -> bool {
    if unlock_time < threshold {
        current_height >= unlock_time
    } else {
        now >= unlock_time
    }
}
