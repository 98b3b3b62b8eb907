//! Wire data model for wallet sync batches.
//!
//! Blocks arrive from `/getwalletsyncdata` pre-filtered to the fields a
//! view-key scan needs. Coinbase and standard transactions are distinct
//! types joined by the [`RawTransaction`] view so recognition logic can
//! pattern-match on the kind.

use serde::{Deserialize, Serialize};
use turtle_types::keys::{hex32, KeyImage, PublicKey, TxHash};

/// One block of the sync stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub height: u64,
    #[serde(with = "hex32")]
    pub hash: TxHash,
    pub timestamp: u64,
    /// Omitted by daemons that skip coinbase data for non-mining wallets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase_tx: Option<CoinbaseTransaction>,
    #[serde(default)]
    pub txs: Vec<StandardTransaction>,
}

impl Block {
    /// All transactions in daemon order, coinbase first.
    pub fn transactions(&self) -> impl Iterator<Item = RawTransaction<'_>> {
        self.coinbase_tx
            .iter()
            .map(RawTransaction::Coinbase)
            .chain(self.txs.iter().map(RawTransaction::Standard))
    }
}

/// Block-reward transaction. Carries no inputs or payment ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinbaseTransaction {
    #[serde(with = "hex32")]
    pub hash: TxHash,
    #[serde(with = "hex32")]
    pub tx_public_key: PublicKey,
    pub unlock_time: u64,
    pub outputs: Vec<RawOutput>,
}

/// User transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardTransaction {
    #[serde(with = "hex32")]
    pub hash: TxHash,
    #[serde(with = "hex32")]
    pub tx_public_key: PublicKey,
    pub unlock_time: u64,
    pub outputs: Vec<RawOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub inputs: Vec<RawInput>,
}

impl StandardTransaction {
    /// `sum(inputs) - sum(outputs)`, i.e. the fee paid to the network.
    pub fn fee(&self) -> u64 {
        let spent: u64 = self.inputs.iter().map(|i| i.amount).sum();
        let created: u64 = self.outputs.iter().map(|o| o.amount).sum();
        spent.saturating_sub(created)
    }
}

/// A single transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOutput {
    #[serde(with = "hex32")]
    pub key: PublicKey,
    pub amount: u64,
    /// Chain-wide output index; blockchain caches inline it, plain nodes
    /// leave it for a follow-up query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_index: Option<u64>,
}

/// A single transaction input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    pub amount: u64,
    #[serde(with = "hex32")]
    pub key_image: KeyImage,
    #[serde(default)]
    pub output_offsets: Vec<u64>,
}

/// Borrowed view over either transaction kind.
#[derive(Debug, Clone, Copy)]
pub enum RawTransaction<'a> {
    Coinbase(&'a CoinbaseTransaction),
    Standard(&'a StandardTransaction),
}

impl<'a> RawTransaction<'a> {
    pub fn hash(&self) -> TxHash {
        match self {
            RawTransaction::Coinbase(tx) => tx.hash,
            RawTransaction::Standard(tx) => tx.hash,
        }
    }

    pub fn tx_public_key(&self) -> PublicKey {
        match self {
            RawTransaction::Coinbase(tx) => tx.tx_public_key,
            RawTransaction::Standard(tx) => tx.tx_public_key,
        }
    }

    pub fn unlock_time(&self) -> u64 {
        match self {
            RawTransaction::Coinbase(tx) => tx.unlock_time,
            RawTransaction::Standard(tx) => tx.unlock_time,
        }
    }

    pub fn outputs(&self) -> &'a [RawOutput] {
        match *self {
            RawTransaction::Coinbase(tx) => &tx.outputs,
            RawTransaction::Standard(tx) => &tx.outputs,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, RawTransaction::Coinbase(_))
    }
}
