//! The wallet-file JSON contract.
//!
//! Field names here are canonical: other tools read these files. The
//! mirror structs deserialize leniently at the serde layer and the
//! conversion into domain types validates everything that matters, so a
//! corrupted or hand-edited file fails loudly instead of producing a
//! malformed wallet.

use crate::error::WalletError;
use crate::subwallet::SubWallet;
use crate::subwallets::SubWallets;
use crate::sync_status::SynchronizationStatus;
use crate::types::{Transaction, TxInput, UnconfirmedInput};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use turtle_types::constants::WALLET_FILE_FORMAT_VERSION;
use turtle_types::keys::{hex32, hex32_list, KeyImage, PublicKey, SecretKey, TxHash};
use turtle_types::WalletConfig;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletFileJson {
    wallet_file_format_version: u32,
    sub_wallets: SubWalletsJson,
    synchronization_status: SynchronizationStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubWalletsJson {
    #[serde(with = "hex32_list")]
    public_spend_keys: Vec<PublicKey>,
    sub_wallet: Vec<SubWalletJson>,
    transactions: Vec<TransactionJson>,
    locked_transactions: Vec<TransactionJson>,
    #[serde(with = "hex32")]
    private_view_key: SecretKey,
    is_view_wallet: bool,
    tx_private_keys: Vec<TxPrivateKeyJson>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubWalletJson {
    #[serde(with = "hex32")]
    public_spend_key: PublicKey,
    address: String,
    scan_height: u64,
    creation_timestamp: u64,
    /// All zeroes for view-only subwallets.
    #[serde(with = "hex32")]
    private_spend_key: SecretKey,
    inputs: Vec<TxInput>,
    locked_inputs: Vec<UnconfirmedInput>,
    #[serde(with = "hex32_list")]
    key_images: Vec<KeyImage>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionJson {
    transfers: Vec<TransferJson>,
    #[serde(with = "hex32")]
    hash: TxHash,
    fee: u64,
    block_height: u64,
    timestamp: u64,
    payment_id: String,
    unlock_time: u64,
    is_coinbase: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferJson {
    #[serde(with = "hex32")]
    public_key: PublicKey,
    amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxPrivateKeyJson {
    #[serde(with = "hex32")]
    transaction_hash: TxHash,
    #[serde(with = "hex32")]
    tx_private_key: SecretKey,
}

// ── Domain -> JSON ──────────────────────────────────────────────────────

fn transaction_to_json(tx: &Transaction) -> TransactionJson {
    let mut transfers: Vec<TransferJson> = tx
        .transfers
        .iter()
        .map(|(public_key, amount)| TransferJson {
            public_key: *public_key,
            amount: *amount,
        })
        .collect();
    // Deterministic output regardless of map iteration order.
    transfers.sort_by(|a, b| a.public_key.cmp(&b.public_key));

    TransactionJson {
        transfers,
        hash: tx.hash,
        fee: tx.fee,
        block_height: tx.block_height,
        timestamp: tx.timestamp,
        payment_id: tx.payment_id.clone(),
        unlock_time: tx.unlock_time,
        is_coinbase: tx.is_coinbase,
    }
}

fn sub_wallet_to_json(wallet: &SubWallet) -> SubWalletJson {
    let mut key_images: Vec<KeyImage> = wallet.key_images().iter().copied().collect();
    key_images.sort();

    SubWalletJson {
        public_spend_key: wallet.public_spend_key(),
        address: wallet.address().to_string(),
        scan_height: wallet.scan_height(),
        creation_timestamp: wallet.creation_timestamp(),
        private_spend_key: wallet.private_spend_key().unwrap_or([0u8; 32]),
        inputs: wallet.inputs().to_vec(),
        locked_inputs: wallet.locked_inputs().to_vec(),
        key_images,
    }
}

/// Serialize a wallet to the documented JSON shape.
pub fn to_json(sub_wallets: &SubWallets, sync_status: &SynchronizationStatus) -> String {
    let mut tx_private_keys: Vec<TxPrivateKeyJson> = sub_wallets
        .tx_private_keys()
        .iter()
        .map(|(hash, key)| TxPrivateKeyJson {
            transaction_hash: *hash,
            tx_private_key: *key,
        })
        .collect();
    tx_private_keys.sort_by(|a, b| a.transaction_hash.cmp(&b.transaction_hash));

    let file = WalletFileJson {
        wallet_file_format_version: WALLET_FILE_FORMAT_VERSION,
        sub_wallets: SubWalletsJson {
            public_spend_keys: sub_wallets.public_spend_keys(),
            sub_wallet: sub_wallets.sub_wallets().iter().map(sub_wallet_to_json).collect(),
            transactions: sub_wallets.transactions().iter().map(transaction_to_json).collect(),
            locked_transactions: sub_wallets
                .locked_transactions()
                .iter()
                .map(transaction_to_json)
                .collect(),
            private_view_key: sub_wallets.private_view_key(),
            is_view_wallet: sub_wallets.is_view_wallet(),
            tx_private_keys,
        },
        synchronization_status: sync_status.clone(),
    };

    serde_json::to_string_pretty(&file).expect("wallet state is always serializable")
}

// ── JSON -> Domain ──────────────────────────────────────────────────────

fn invalid(reason: impl Into<String>) -> WalletError {
    WalletError::InvalidWalletFile(reason.into())
}

fn transaction_from_json(
    json: TransactionJson,
    known_keys: &HashSet<PublicKey>,
) -> Result<Transaction, WalletError> {
    let mut transfers = HashMap::with_capacity(json.transfers.len());
    for transfer in json.transfers {
        if !known_keys.contains(&transfer.public_key) {
            return Err(invalid(format!(
                "transaction {} transfers to unknown spend key {}",
                hex::encode(json.hash),
                hex::encode(transfer.public_key),
            )));
        }
        if transfers.insert(transfer.public_key, transfer.amount).is_some() {
            return Err(invalid(format!(
                "transaction {} repeats a transfer key",
                hex::encode(json.hash),
            )));
        }
    }

    Ok(Transaction {
        hash: json.hash,
        transfers,
        fee: json.fee,
        block_height: json.block_height,
        timestamp: json.timestamp,
        payment_id: json.payment_id,
        unlock_time: json.unlock_time,
        is_coinbase: json.is_coinbase,
    })
}

fn sub_wallet_from_json(
    json: SubWalletJson,
    is_view_wallet: bool,
) -> Result<SubWallet, WalletError> {
    let private_spend_key = if json.private_spend_key == [0u8; 32] {
        if !is_view_wallet {
            return Err(invalid(format!(
                "subwallet {} has no private spend key but the wallet is not view-only",
                hex::encode(json.public_spend_key),
            )));
        }
        None
    } else {
        Some(json.private_spend_key)
    };

    let key_images: HashSet<KeyImage> = json.key_images.iter().copied().collect();
    if !is_view_wallet {
        for input in &json.inputs {
            if !key_images.contains(&input.key_image) {
                return Err(invalid(format!(
                    "input key image {} is missing from the key image set",
                    hex::encode(input.key_image),
                )));
            }
        }
    }

    Ok(SubWallet::from_parts(
        json.public_spend_key,
        private_spend_key,
        json.address,
        json.scan_height,
        json.creation_timestamp,
        json.inputs,
        json.locked_inputs,
        key_images,
    ))
}

/// Deserialize and validate a wallet file.
pub fn from_json(
    json: &str,
    config: &WalletConfig,
) -> Result<(SubWallets, SynchronizationStatus), WalletError> {
    let file: WalletFileJson =
        serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;

    if file.wallet_file_format_version != WALLET_FILE_FORMAT_VERSION {
        return Err(invalid(format!(
            "unsupported wallet file version {}",
            file.wallet_file_format_version,
        )));
    }

    let subs = file.sub_wallets;

    if subs.sub_wallet.is_empty() {
        return Err(invalid("wallet file contains no subwallets"));
    }

    let listed_keys: Vec<PublicKey> =
        subs.sub_wallet.iter().map(|w| w.public_spend_key).collect();
    if listed_keys != subs.public_spend_keys {
        return Err(invalid("publicSpendKeys does not match the subwallet list"));
    }
    let known_keys: HashSet<PublicKey> = listed_keys.iter().copied().collect();
    if known_keys.len() != listed_keys.len() {
        return Err(invalid("duplicate subwallet spend keys"));
    }

    let is_view_wallet = subs.is_view_wallet;
    let wallets = subs
        .sub_wallet
        .into_iter()
        .map(|w| sub_wallet_from_json(w, is_view_wallet))
        .collect::<Result<Vec<_>, _>>()?;

    let transactions = subs
        .transactions
        .into_iter()
        .map(|t| transaction_from_json(t, &known_keys))
        .collect::<Result<Vec<_>, _>>()?;
    let locked_transactions = subs
        .locked_transactions
        .into_iter()
        .map(|t| transaction_from_json(t, &known_keys))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen_hashes = HashSet::new();
    for tx in &transactions {
        if !seen_hashes.insert(tx.hash) {
            return Err(invalid(format!(
                "duplicate confirmed transaction {}",
                hex::encode(tx.hash),
            )));
        }
    }
    for tx in &locked_transactions {
        if seen_hashes.contains(&tx.hash) {
            return Err(invalid(format!(
                "transaction {} is both confirmed and locked",
                hex::encode(tx.hash),
            )));
        }
    }

    let tx_private_keys: HashMap<TxHash, SecretKey> = subs
        .tx_private_keys
        .into_iter()
        .map(|entry| (entry.transaction_hash, entry.tx_private_key))
        .collect();

    let sub_wallets = SubWallets::from_parts(
        wallets,
        transactions,
        locked_transactions,
        subs.private_view_key,
        subs.is_view_wallet,
        tx_private_keys,
    );

    let mut sync_status = file.synchronization_status;
    sync_status.apply_config(config);

    Ok((sub_wallets, sync_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_wallet() -> (SubWallets, SynchronizationStatus) {
        let config = WalletConfig::default();
        let mut primary = SubWallet::new([1; 32], Some([2; 32]), "TRTLprimary".into(), 0, 0);
        primary.store_input(
            TxInput {
                key_image: [0xE1; 32],
                amount: 500,
                block_height: 10,
                tx_public_key: [0xA0; 32],
                transaction_index: 0,
                global_output_index: Some(77),
                key: [0xB0; 32],
                spend_height: 0,
                unlock_time: 0,
                parent_tx_hash: [0xC0; 32],
            },
            false,
        );
        primary.store_unconfirmed_input(UnconfirmedInput {
            amount: 25,
            key: [0xB1; 32],
            parent_tx_hash: [0xC1; 32],
        });

        let mut subs = SubWallets::new([9; 32], false, primary);
        subs.add_sub_wallet(SubWallet::new([5; 32], Some([6; 32]), "TRTLsecond".into(), 0, 0));

        let mut transfers = HashMap::new();
        transfers.insert([1u8; 32], 500i64);
        subs.add_transaction(Transaction {
            hash: [0xC0; 32],
            transfers: transfers.clone(),
            fee: 10,
            block_height: 10,
            timestamp: 1_600_000_000,
            payment_id: "aa".repeat(32),
            unlock_time: 0,
            is_coinbase: false,
        });

        let mut locked_transfers = HashMap::new();
        locked_transfers.insert([1u8; 32], -100i64);
        subs.add_unconfirmed_transaction(Transaction {
            hash: [0xC1; 32],
            transfers: locked_transfers,
            fee: 10,
            block_height: 0,
            timestamp: 0,
            payment_id: String::new(),
            unlock_time: 0,
            is_coinbase: false,
        });
        subs.store_tx_private_key([0xC1; 32], [0x77; 32]);

        let mut status = SynchronizationStatus::new(0, 0, &config);
        for height in 1..=12 {
            let mut hash = [0u8; 32];
            hash[0] = height as u8;
            status.store_block_hash(height, hash);
        }

        (subs, status)
    }

    #[test]
    fn test_roundtrip_preserves_state() {
        let config = WalletConfig::default();
        let (subs, status) = sample_wallet();

        let json = to_json(&subs, &status);
        let (restored_subs, restored_status) = from_json(&json, &config).unwrap();

        assert_eq!(restored_status, status);
        assert_eq!(restored_subs.public_spend_keys(), subs.public_spend_keys());
        assert_eq!(restored_subs.is_view_wallet(), subs.is_view_wallet());
        assert_eq!(restored_subs.private_view_key(), subs.private_view_key());
        assert_eq!(restored_subs.transactions(), subs.transactions());
        assert_eq!(
            restored_subs.locked_transactions(),
            subs.locked_transactions()
        );
        assert_eq!(
            restored_subs.get_tx_private_key(&[0xC1; 32]),
            Some([0x77; 32])
        );
        assert_eq!(
            restored_subs.get(&[1; 32]).unwrap(),
            subs.get(&[1; 32]).unwrap()
        );

        // Serializing again is byte-stable.
        assert_eq!(to_json(&restored_subs, &restored_status), json);
    }

    #[test]
    fn test_canonical_field_names() {
        let (subs, status) = sample_wallet();
        let value: serde_json::Value =
            serde_json::from_str(&to_json(&subs, &status)).unwrap();

        assert_eq!(value["walletFileFormatVersion"], 1);
        assert!(value["subWallets"]["publicSpendKeys"].is_array());
        assert!(value["subWallets"]["subWallet"][0]["privateSpendKey"].is_string());
        assert!(value["subWallets"]["txPrivateKeys"][0]["transactionHash"].is_string());
        assert!(value["subWallets"]["transactions"][0]["transfers"][0]["publicKey"].is_string());
        assert!(value["synchronizationStatus"]["lastKnownBlockHeight"].is_number());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let config = WalletConfig::default();
        let (subs, status) = sample_wallet();
        let mut value: serde_json::Value =
            serde_json::from_str(&to_json(&subs, &status)).unwrap();
        value["walletFileFormatVersion"] = serde_json::json!(99);

        let err = from_json(&value.to_string(), &config).unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletFile(_)));
    }

    #[test]
    fn test_rejects_transfer_to_unknown_key() {
        let config = WalletConfig::default();
        let (subs, status) = sample_wallet();
        let mut value: serde_json::Value =
            serde_json::from_str(&to_json(&subs, &status)).unwrap();
        value["subWallets"]["transactions"][0]["transfers"][0]["publicKey"] =
            serde_json::json!("ff".repeat(32));

        let err = from_json(&value.to_string(), &config).unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletFile(_)));
    }

    #[test]
    fn test_rejects_input_missing_from_key_image_set() {
        let config = WalletConfig::default();
        let (subs, status) = sample_wallet();
        let mut value: serde_json::Value =
            serde_json::from_str(&to_json(&subs, &status)).unwrap();
        value["subWallets"]["subWallet"][0]["keyImages"] = serde_json::json!([]);

        let err = from_json(&value.to_string(), &config).unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletFile(_)));
    }

    #[test]
    fn test_rejects_missing_spend_key_on_full_wallet() {
        let config = WalletConfig::default();
        let (subs, status) = sample_wallet();
        let mut value: serde_json::Value =
            serde_json::from_str(&to_json(&subs, &status)).unwrap();
        value["subWallets"]["subWallet"][0]["privateSpendKey"] =
            serde_json::json!("00".repeat(32));

        let err = from_json(&value.to_string(), &config).unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletFile(_)));
    }

    #[test]
    fn test_rejects_hash_in_both_lists() {
        let config = WalletConfig::default();
        let (subs, status) = sample_wallet();
        let mut value: serde_json::Value =
            serde_json::from_str(&to_json(&subs, &status)).unwrap();
        let confirmed = value["subWallets"]["transactions"][0].clone();
        value["subWallets"]["lockedTransactions"]
            .as_array_mut()
            .unwrap()
            .push(confirmed);

        let err = from_json(&value.to_string(), &config).unwrap_err();
        assert!(matches!(err, WalletError::InvalidWalletFile(_)));
    }

    #[test]
    fn test_view_wallet_roundtrip() {
        let config = WalletConfig::default();
        let view = SubWallet::new([1; 32], None, "TRTLview".into(), 100, 0);
        let subs = SubWallets::new([9; 32], true, view);
        let status = SynchronizationStatus::new(100, 0, &config);

        let json = to_json(&subs, &status);
        let (restored, _) = from_json(&json, &config).unwrap();

        assert!(restored.is_view_wallet());
        assert_eq!(restored.get(&[1; 32]).unwrap().private_spend_key(), None);
    }
}
