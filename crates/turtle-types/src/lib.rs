//! TurtleCoin wallet backend shared types.
//!
//! Provides network constants, the tunable wallet configuration, the
//! height-indexed mixin schedule, and atomic-amount parsing.

pub mod amounts;
pub mod config;
pub mod constants;
pub mod keys;
pub mod mixin;

pub use amounts::{parse_atomic_amount, AmountError};
pub use config::WalletConfig;
pub use keys::{KeyDerivation, KeyImage, PublicKey, SecretKey, TxHash};
pub use mixin::{MixinLimit, MixinLimits};
