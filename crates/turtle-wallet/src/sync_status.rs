//! Rolling window of recently-seen block hashes.
//!
//! The daemon locates our resume point from the hashes we send it: the
//! sparse checkpoints cover long forks without unbounded memory, the
//! dense window of the last hundred hashes covers ordinary reorgs.

use serde::{Deserialize, Serialize};
use turtle_types::constants;
use turtle_types::keys::{hex32_list, TxHash};
use turtle_types::WalletConfig;

fn default_hashes_window() -> usize {
    constants::LAST_KNOWN_BLOCK_HASHES_SIZE
}

fn default_checkpoint_interval() -> u64 {
    constants::BLOCK_HASH_CHECKPOINTS_INTERVAL
}

fn default_max_checkpoints() -> usize {
    constants::MAX_BLOCK_HASH_CHECKPOINTS
}

/// Checkpoints for resume and reorg detection. Newest entries first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynchronizationStatus {
    /// Sparse hashes, one per checkpoint interval.
    #[serde(with = "hex32_list")]
    block_hash_checkpoints: Vec<TxHash>,
    /// Dense window of the most recent hashes.
    #[serde(with = "hex32_list")]
    last_known_block_hashes: Vec<TxHash>,
    last_known_block_height: u64,
    start_height: u64,
    start_timestamp: u64,

    #[serde(skip_serializing, default = "default_hashes_window")]
    hashes_window: usize,
    #[serde(skip_serializing, default = "default_checkpoint_interval")]
    checkpoint_interval: u64,
    #[serde(skip_serializing, default = "default_max_checkpoints")]
    max_checkpoints: usize,
}

impl SynchronizationStatus {
    /// Fresh status anchored at a height (imports) or timestamp (new
    /// wallets).
    pub fn new(start_height: u64, start_timestamp: u64, config: &WalletConfig) -> Self {
        Self {
            block_hash_checkpoints: Vec::new(),
            last_known_block_hashes: Vec::new(),
            last_known_block_height: start_height,
            start_height,
            start_timestamp,
            hashes_window: config.last_known_block_hashes_size,
            checkpoint_interval: config.block_hash_checkpoints_interval,
            max_checkpoints: config.max_block_hash_checkpoints,
        }
    }

    /// Re-apply window sizes after deserialization.
    pub(crate) fn apply_config(&mut self, config: &WalletConfig) {
        self.hashes_window = config.last_known_block_hashes_size;
        self.checkpoint_interval = config.block_hash_checkpoints_interval;
        self.max_checkpoints = config.max_block_hash_checkpoints;
    }

    pub fn last_known_block_height(&self) -> u64 {
        self.last_known_block_height
    }

    pub fn start_height(&self) -> u64 {
        self.start_height
    }

    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    /// Whether any block hash has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.last_known_block_hashes.is_empty() && self.block_hash_checkpoints.is_empty()
    }

    /// Record a processed block as the new tip.
    pub fn store_block_hash(&mut self, height: u64, hash: TxHash) {
        self.last_known_block_hashes.insert(0, hash);
        self.last_known_block_hashes.truncate(self.hashes_window);

        if self.checkpoint_interval > 0 && height % self.checkpoint_interval == 0 {
            self.block_hash_checkpoints.insert(0, hash);
            self.block_hash_checkpoints.truncate(self.max_checkpoints);
        }

        self.last_known_block_height = height;
    }

    /// The hash list sent with every sync-data request: sparse
    /// checkpoints, then the full dense window. Duplicates are fine;
    /// the daemon tolerates them.
    pub fn get_block_checkpoints(&self) -> Vec<TxHash> {
        let mut checkpoints =
            Vec::with_capacity(self.block_hash_checkpoints.len() + self.last_known_block_hashes.len());
        checkpoints.extend_from_slice(&self.block_hash_checkpoints);
        checkpoints.extend_from_slice(&self.last_known_block_hashes);
        checkpoints
    }

    /// Drop everything above `height` and make it the tip.
    ///
    /// Entry heights are not stored, but both lists are stride-regular:
    /// dense entry `i` sits at `last_known - i`, checkpoint `i` at
    /// `(last_known / interval - i) * interval`. That makes the number
    /// of invalidated entries pure arithmetic.
    pub fn rewind(&mut self, height: u64) {
        if height >= self.last_known_block_height {
            return;
        }

        let dropped_dense = (self.last_known_block_height - height) as usize;
        if dropped_dense >= self.last_known_block_hashes.len() {
            self.last_known_block_hashes.clear();
        } else {
            self.last_known_block_hashes.drain(..dropped_dense);
        }

        if self.checkpoint_interval > 0 {
            let dropped_checkpoints = (self.last_known_block_height / self.checkpoint_interval
                - height / self.checkpoint_interval)
                as usize;
            let dropped_checkpoints = dropped_checkpoints.min(self.block_hash_checkpoints.len());
            self.block_hash_checkpoints.drain(..dropped_checkpoints);
        }

        self.last_known_block_height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window: usize, interval: u64, max_checkpoints: usize) -> WalletConfig {
        WalletConfig {
            last_known_block_hashes_size: window,
            block_hash_checkpoints_interval: interval,
            max_block_hash_checkpoints: max_checkpoints,
            ..WalletConfig::default()
        }
    }

    fn hash(n: u64) -> TxHash {
        let mut h = [0u8; 32];
        h[..8].copy_from_slice(&n.to_le_bytes());
        h
    }

    #[test]
    fn test_newest_hash_first() {
        let mut status = SynchronizationStatus::new(0, 0, &config(3, 100, 10));
        status.store_block_hash(1, hash(1));
        status.store_block_hash(2, hash(2));

        assert_eq!(status.last_known_block_height(), 2);
        assert_eq!(status.get_block_checkpoints(), vec![hash(2), hash(1)]);
    }

    #[test]
    fn test_dense_window_truncates() {
        let mut status = SynchronizationStatus::new(0, 0, &config(3, 1000, 10));
        for height in 1..=5 {
            status.store_block_hash(height, hash(height));
        }

        assert_eq!(
            status.get_block_checkpoints(),
            vec![hash(5), hash(4), hash(3)]
        );
    }

    #[test]
    fn test_checkpoint_every_interval() {
        let mut status = SynchronizationStatus::new(0, 0, &config(2, 10, 10));
        for height in 1..=21 {
            status.store_block_hash(height, hash(height));
        }

        // Checkpoints at 10 and 20 (newest first), then the dense window.
        assert_eq!(
            status.get_block_checkpoints(),
            vec![hash(20), hash(10), hash(21), hash(20)]
        );
    }

    #[test]
    fn test_checkpoints_truncate() {
        let mut status = SynchronizationStatus::new(0, 0, &config(1, 10, 2));
        for height in 1..=50 {
            status.store_block_hash(height, hash(height));
        }

        assert_eq!(
            status.get_block_checkpoints(),
            vec![hash(50), hash(40), hash(50)]
        );
    }

    #[test]
    fn test_height_is_monotonic_across_stores() {
        let mut status = SynchronizationStatus::new(0, 0, &config(5, 100, 10));
        let mut previous = 0;
        for height in 1..=20 {
            status.store_block_hash(height, hash(height));
            assert!(status.last_known_block_height() >= previous);
            previous = status.last_known_block_height();
        }
    }

    #[test]
    fn test_rewind_drops_invalidated_hashes() {
        let mut status = SynchronizationStatus::new(0, 0, &config(10, 10, 10));
        for height in 1..=25 {
            status.store_block_hash(height, hash(height));
        }

        status.rewind(22);

        assert_eq!(status.last_known_block_height(), 22);
        // Dense window lost 25..23; checkpoint at 20 survives.
        let checkpoints = status.get_block_checkpoints();
        assert_eq!(checkpoints[0], hash(20));
        assert_eq!(checkpoints[1], hash(10));
        assert_eq!(checkpoints[2], hash(22));
    }

    #[test]
    fn test_rewind_past_checkpoint_drops_it() {
        let mut status = SynchronizationStatus::new(0, 0, &config(5, 10, 10));
        for height in 1..=25 {
            status.store_block_hash(height, hash(height));
        }

        status.rewind(15);

        assert_eq!(status.last_known_block_height(), 15);
        let checkpoints = status.get_block_checkpoints();
        // Checkpoint 20 invalidated; only 10 remains, dense window empty
        // (all five entries were above 15).
        assert_eq!(checkpoints, vec![hash(10)]);
    }

    #[test]
    fn test_rewind_forward_is_a_no_op() {
        let mut status = SynchronizationStatus::new(0, 0, &config(5, 10, 10));
        status.store_block_hash(5, hash(5));
        status.rewind(100);
        assert_eq!(status.last_known_block_height(), 5);
    }

    #[test]
    fn test_serde_roundtrip_preserves_state() {
        let mut status = SynchronizationStatus::new(100, 0, &config(5, 10, 10));
        for height in 101..=120 {
            status.store_block_hash(height, hash(height));
        }

        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("hashesWindow").is_none());

        let mut restored: SynchronizationStatus = serde_json::from_value(json).unwrap();
        restored.apply_config(&config(5, 10, 10));
        assert_eq!(restored, status);
    }
}
