//! TurtleCoin network constants.
//!
//! Reference values for address formats, sync checkpoint windows, and the
//! unlock-time encoding shared by the wallet and RPC crates.

// =============================================================================
// Key and Hash Sizes
// =============================================================================

/// Size of a public/secret key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a transaction or block hash in bytes.
pub const HASH_SIZE: usize = 32;

/// Length of a payment ID in hex characters.
pub const PAYMENT_ID_LENGTH: usize = 64;

// =============================================================================
// Addresses
// =============================================================================

/// Length of a standard TRTL address in characters.
pub const STANDARD_ADDRESS_LENGTH: usize = 99;

/// Length of an integrated TRTL address (standard + embedded payment ID).
pub const INTEGRATED_ADDRESS_LENGTH: usize = 99 + 88;

/// Base58 varint prefix of a standard address ("TRTL...").
pub const ADDRESS_PREFIX: u64 = 3_914_525;

// =============================================================================
// Synchronization
// =============================================================================

/// Dense window of recently-seen block hashes kept for resume/reorg.
pub const LAST_KNOWN_BLOCK_HASHES_SIZE: usize = 100;

/// A sparse checkpoint is recorded every this many blocks.
pub const BLOCK_HASH_CHECKPOINTS_INTERVAL: u64 = 5_000;

/// Maximum number of sparse checkpoints retained.
pub const MAX_BLOCK_HASH_CHECKPOINTS: usize = 100;

/// Stop fetching new batches while this many blocks are already queued.
pub const BLOCK_QUEUE_HIGH_WATER: usize = 100;

/// Seconds between refreshes of the daemon's height/fee info.
pub const DAEMON_UPDATE_INTERVAL_SECS: u64 = 10;

// =============================================================================
// Amounts and Unlock Times
// =============================================================================

/// Unlock times below this value are block heights; above, Unix seconds.
pub const UNLOCK_TIME_AS_BLOCK_HEIGHT_THRESHOLD: u64 = 500_000_000;

/// Network minimum transaction fee in atomic units.
pub const MINIMUM_FEE: u64 = 10;

/// Target seconds between blocks.
pub const BLOCK_TARGET_TIME: u64 = 30;

/// Blocks of timestamp drift allowed when a fresh wallet picks its
/// creation timestamp (daemon clocks may lag ours).
pub const CREATION_TIMESTAMP_DRIFT_BLOCKS: u64 = 100;

// =============================================================================
// Wallet File
// =============================================================================

/// Version stamp written into serialized wallet files.
pub const WALLET_FILE_FORMAT_VERSION: u32 = 1;
