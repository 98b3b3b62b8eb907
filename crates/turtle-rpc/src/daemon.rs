//! Daemon capability and its two HTTP providers.
//!
//! The wallet talks to either a conventional node (authoritative, higher
//! latency, no inline global indexes) or a blockchain-cache accelerator
//! (fast, may omit global indexes under load). Both expose the same five
//! operations, abstracted behind [`Daemon`] so the sync loop and tests
//! stay provider-agnostic.

use crate::client::{HttpClient, HttpConfig};
use crate::error::RpcError;
use crate::wire::Block;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use turtle_types::keys::{hex_to_32, TxHash};

// =============================================================================
// Response Types
// =============================================================================

/// Daemon `/info` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonInfo {
    /// Local daemon block count.
    pub height: u64,
    /// Observed network block count.
    pub network_height: u64,
    #[serde(default)]
    pub incoming_connections_count: u64,
    #[serde(default)]
    pub outgoing_connections_count: u64,
    #[serde(default)]
    pub difficulty: u64,
    #[serde(default)]
    pub status: String,
}

/// Daemon `/fee` response.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeInfo {
    pub status: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub amount: u64,
}

/// Result of a `/get_transactions_status` query.
#[derive(Debug, Clone, Default)]
pub struct TransactionsStatus {
    /// Hashes the daemon no longer knows about (dropped from the pool).
    pub transactions_unknown: Vec<TxHash>,
}

// =============================================================================
// Daemon Capability
// =============================================================================

/// The abstract daemon surface consumed by the wallet.
#[async_trait]
pub trait Daemon: Send + Sync {
    /// Network info: local and network block counts, peers, difficulty.
    async fn info(&self) -> Result<DaemonInfo, RpcError>;

    /// Node operator fee. `status` must be "OK" for the fee to apply.
    async fn fee(&self) -> Result<FeeInfo, RpcError>;

    /// Fetch the next batch of pre-filtered blocks, anchored on the
    /// wallet's checkpoints.
    async fn get_wallet_sync_data(
        &self,
        block_hash_checkpoints: Vec<TxHash>,
        start_height: u64,
        start_timestamp: u64,
    ) -> Result<Vec<Block>, RpcError>;

    /// Global output indexes for every transaction in `[start, end)`.
    async fn get_global_indexes_for_range(
        &self,
        start_height: u64,
        end_height: u64,
    ) -> Result<HashMap<TxHash, Vec<u64>>, RpcError>;

    /// Which of the given transactions the daemon no longer knows.
    async fn get_transactions_status(
        &self,
        transaction_hashes: Vec<TxHash>,
    ) -> Result<TransactionsStatus, RpcError>;
}

// =============================================================================
// Shared endpoint plumbing
// =============================================================================

fn check_status(endpoint: &str, value: &Value) -> Result<(), RpcError> {
    match value.get("status").and_then(|s| s.as_str()) {
        None | Some("OK") => Ok(()),
        Some(other) => Err(RpcError::DaemonError {
            endpoint: endpoint.to_string(),
            status: other.to_string(),
        }),
    }
}

async fn fetch_info(client: &HttpClient) -> Result<DaemonInfo, RpcError> {
    let val = client.get("/info").await?;
    check_status("/info", &val)?;
    Ok(serde_json::from_value(val)?)
}

async fn fetch_fee(client: &HttpClient) -> Result<FeeInfo, RpcError> {
    let val = client.get("/fee").await?;
    Ok(serde_json::from_value(val)?)
}

async fn fetch_sync_data(
    client: &HttpClient,
    block_hash_checkpoints: Vec<TxHash>,
    start_height: u64,
    start_timestamp: u64,
) -> Result<Vec<Block>, RpcError> {
    let endpoint = "/getwalletsyncdata";
    let checkpoints: Vec<String> = block_hash_checkpoints.iter().map(hex::encode).collect();
    let body = serde_json::json!({
        "blockHashCheckpoints": checkpoints,
        "startHeight": start_height,
        "startTimestamp": start_timestamp,
    });

    let val = client.post(endpoint, &body).await?;
    check_status(endpoint, &val)?;

    let items = val.get("items").cloned().ok_or(RpcError::NoResult {
        endpoint: endpoint.to_string(),
    })?;
    Ok(serde_json::from_value(items)?)
}

async fn fetch_global_indexes(
    client: &HttpClient,
    start_height: u64,
    end_height: u64,
) -> Result<HashMap<TxHash, Vec<u64>>, RpcError> {
    let endpoint = "/get_global_indexes_for_range";
    let body = serde_json::json!({
        "startHeight": start_height,
        "endHeight": end_height,
    });

    let val = client.post(endpoint, &body).await?;
    check_status(endpoint, &val)?;

    let entries = val
        .get("indexes")
        .and_then(|v| v.as_array())
        .ok_or(RpcError::NoResult {
            endpoint: endpoint.to_string(),
        })?;

    let mut indexes = HashMap::with_capacity(entries.len());
    for entry in entries {
        let hash = entry
            .get("key")
            .and_then(|v| v.as_str())
            .and_then(hex_to_32)
            .ok_or(RpcError::MalformedResponse {
                endpoint: endpoint.to_string(),
                field: "indexes.key",
            })?;
        let value: Vec<u64> = entry
            .get("value")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or(RpcError::MalformedResponse {
                endpoint: endpoint.to_string(),
                field: "indexes.value",
            })?;
        indexes.insert(hash, value);
    }

    Ok(indexes)
}

async fn fetch_transactions_status(
    client: &HttpClient,
    transaction_hashes: Vec<TxHash>,
) -> Result<TransactionsStatus, RpcError> {
    let endpoint = "/get_transactions_status";
    let hashes: Vec<String> = transaction_hashes.iter().map(hex::encode).collect();
    let body = serde_json::json!({ "transactionHashes": hashes });

    let val = client.post(endpoint, &body).await?;
    check_status(endpoint, &val)?;

    let unknown = val
        .get("transactionsUnknown")
        .and_then(|v| v.as_array())
        .ok_or(RpcError::NoResult {
            endpoint: endpoint.to_string(),
        })?;

    let transactions_unknown = unknown
        .iter()
        .map(|v| {
            v.as_str()
                .and_then(hex_to_32)
                .ok_or(RpcError::MalformedResponse {
                    endpoint: endpoint.to_string(),
                    field: "transactionsUnknown",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransactionsStatus {
        transactions_unknown,
    })
}

// =============================================================================
// Providers
// =============================================================================

/// Conventional TurtleCoind node.
///
/// Authoritative but does not inline global output indexes in sync
/// batches; the wallet backfills them per block range.
pub struct NodeDaemon {
    client: HttpClient,
}

impl NodeDaemon {
    pub fn new(url: &str) -> Self {
        Self {
            client: HttpClient::new(url),
        }
    }

    pub fn with_config(config: HttpConfig) -> Self {
        Self {
            client: HttpClient::with_config(config),
        }
    }
}

#[async_trait]
impl Daemon for NodeDaemon {
    async fn info(&self) -> Result<DaemonInfo, RpcError> {
        fetch_info(&self.client).await
    }

    async fn fee(&self) -> Result<FeeInfo, RpcError> {
        fetch_fee(&self.client).await
    }

    async fn get_wallet_sync_data(
        &self,
        block_hash_checkpoints: Vec<TxHash>,
        start_height: u64,
        start_timestamp: u64,
    ) -> Result<Vec<Block>, RpcError> {
        fetch_sync_data(
            &self.client,
            block_hash_checkpoints,
            start_height,
            start_timestamp,
        )
        .await
    }

    async fn get_global_indexes_for_range(
        &self,
        start_height: u64,
        end_height: u64,
    ) -> Result<HashMap<TxHash, Vec<u64>>, RpcError> {
        fetch_global_indexes(&self.client, start_height, end_height).await
    }

    async fn get_transactions_status(
        &self,
        transaction_hashes: Vec<TxHash>,
    ) -> Result<TransactionsStatus, RpcError> {
        fetch_transactions_status(&self.client, transaction_hashes).await
    }
}

/// Blockchain-cache accelerator.
///
/// Serves the same endpoints from an indexed database. Usually inlines
/// global output indexes in sync batches, but may drop them under load,
/// in which case the wallet falls back to the range query.
pub struct CacheDaemon {
    client: HttpClient,
}

impl CacheDaemon {
    pub fn new(url: &str) -> Self {
        Self {
            client: HttpClient::new(url),
        }
    }

    pub fn with_config(config: HttpConfig) -> Self {
        Self {
            client: HttpClient::with_config(config),
        }
    }
}

#[async_trait]
impl Daemon for CacheDaemon {
    async fn info(&self) -> Result<DaemonInfo, RpcError> {
        fetch_info(&self.client).await
    }

    async fn fee(&self) -> Result<FeeInfo, RpcError> {
        fetch_fee(&self.client).await
    }

    async fn get_wallet_sync_data(
        &self,
        block_hash_checkpoints: Vec<TxHash>,
        start_height: u64,
        start_timestamp: u64,
    ) -> Result<Vec<Block>, RpcError> {
        fetch_sync_data(
            &self.client,
            block_hash_checkpoints,
            start_height,
            start_timestamp,
        )
        .await
    }

    async fn get_global_indexes_for_range(
        &self,
        start_height: u64,
        end_height: u64,
    ) -> Result<HashMap<TxHash, Vec<u64>>, RpcError> {
        fetch_global_indexes(&self.client, start_height, end_height).await
    }

    async fn get_transactions_status(
        &self,
        transaction_hashes: Vec<TxHash>,
    ) -> Result<TransactionsStatus, RpcError> {
        fetch_transactions_status(&self.client, transaction_hashes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_accepts_ok_and_absent() {
        assert!(check_status("/x", &serde_json::json!({ "status": "OK" })).is_ok());
        assert!(check_status("/x", &serde_json::json!({})).is_ok());
    }

    #[test]
    fn test_check_status_rejects_failure() {
        let err = check_status("/fee", &serde_json::json!({ "status": "FAILED" })).unwrap_err();
        assert!(matches!(err, RpcError::DaemonError { status, .. } if status == "FAILED"));
    }

    #[test]
    fn test_daemon_info_parses_snake_case() {
        let info: DaemonInfo = serde_json::from_value(serde_json::json!({
            "height": 100,
            "network_height": 120,
            "incoming_connections_count": 3,
            "outgoing_connections_count": 8,
            "difficulty": 1_000_000,
            "status": "OK",
        }))
        .unwrap();
        assert_eq!(info.height, 100);
        assert_eq!(info.network_height, 120);
        assert_eq!(info.outgoing_connections_count, 8);
    }
}
