//! Wallet backend configuration.

use crate::constants;
use crate::mixin::MixinLimits;
use std::time::Duration;

/// Tunable options for the wallet backend.
///
/// The defaults suit mainnet; tests and exotic deployments override the
/// fields they care about.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Pause between sync-loop ticks.
    pub main_loop_interval: Duration,

    /// Maximum queued blocks drained per tick.
    pub blocks_per_tick: usize,

    /// Timeout applied to every daemon request.
    pub request_timeout: Duration,

    /// Target seconds between blocks.
    pub block_target_time: u64,

    /// Dense window of recent block hashes kept for resume/reorg.
    pub last_known_block_hashes_size: usize,

    /// A sparse checkpoint is recorded every this many blocks.
    pub block_hash_checkpoints_interval: u64,

    /// Maximum number of sparse checkpoints retained.
    pub max_block_hash_checkpoints: usize,

    /// Stop fetching while this many blocks are queued unprocessed.
    pub block_queue_high_water: usize,

    /// Network minimum transaction fee in atomic units.
    pub minimum_fee: u64,

    /// Character length of an integrated address.
    pub integrated_address_length: usize,

    /// Character length of a standard address.
    pub standard_address_length: usize,

    /// Height-indexed mixin schedule.
    pub mixin_limits: MixinLimits,

    /// Whether coinbase transactions are scanned for owned outputs.
    pub scan_coinbase_transactions: bool,

    /// Unlock times below this are block heights; above, Unix seconds.
    pub unlock_time_as_block_height_threshold: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            main_loop_interval: Duration::from_millis(10),
            blocks_per_tick: 1,
            request_timeout: Duration::from_secs(10),
            block_target_time: constants::BLOCK_TARGET_TIME,
            last_known_block_hashes_size: constants::LAST_KNOWN_BLOCK_HASHES_SIZE,
            block_hash_checkpoints_interval: constants::BLOCK_HASH_CHECKPOINTS_INTERVAL,
            max_block_hash_checkpoints: constants::MAX_BLOCK_HASH_CHECKPOINTS,
            block_queue_high_water: constants::BLOCK_QUEUE_HIGH_WATER,
            minimum_fee: constants::MINIMUM_FEE,
            integrated_address_length: constants::INTEGRATED_ADDRESS_LENGTH,
            standard_address_length: constants::STANDARD_ADDRESS_LENGTH,
            mixin_limits: MixinLimits::default(),
            scan_coinbase_transactions: false,
            unlock_time_as_block_height_threshold:
                constants::UNLOCK_TIME_AS_BLOCK_HEIGHT_THRESHOLD,
        }
    }
}

impl WalletConfig {
    /// Seconds of drift subtracted when a fresh wallet stamps its
    /// creation time, so a lagging daemon clock cannot hide blocks.
    pub fn creation_timestamp_drift(&self) -> u64 {
        constants::CREATION_TIMESTAMP_DRIFT_BLOCKS * self.block_target_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WalletConfig::default();
        assert_eq!(config.main_loop_interval, Duration::from_millis(10));
        assert_eq!(config.blocks_per_tick, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(!config.scan_coinbase_transactions);
        assert_eq!(config.unlock_time_as_block_height_threshold, 500_000_000);
    }

    #[test]
    fn test_creation_timestamp_drift() {
        let config = WalletConfig::default();
        assert_eq!(config.creation_timestamp_drift(), 100 * 30);
    }
}
