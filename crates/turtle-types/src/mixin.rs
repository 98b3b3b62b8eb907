//! Height-indexed mixin limits.
//!
//! The permitted ring-signature mixin band has changed over the chain's
//! history, so limits are looked up by the height a transaction will
//! confirm at.

use serde::{Deserialize, Serialize};

/// Mixin band in force from `activation_height` onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinLimit {
    pub activation_height: u64,
    pub min_mixin: u64,
    pub max_mixin: u64,
    pub default_mixin: u64,
}

impl MixinLimit {
    pub const fn new(
        activation_height: u64,
        min_mixin: u64,
        max_mixin: u64,
        default_mixin: u64,
    ) -> Self {
        Self {
            activation_height,
            min_mixin,
            max_mixin,
            default_mixin,
        }
    }
}

/// The full schedule, ordered by activation height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinLimits {
    limits: Vec<MixinLimit>,
}

impl MixinLimits {
    /// Build a schedule. Entries are sorted by activation height.
    pub fn new(mut limits: Vec<MixinLimit>) -> Self {
        limits.sort_by_key(|l| l.activation_height);
        Self { limits }
    }

    /// The band in force at `height`.
    ///
    /// Heights before the first activation get a fully permissive band.
    pub fn at_height(&self, height: u64) -> MixinLimit {
        self.limits
            .iter()
            .rev()
            .find(|l| l.activation_height <= height)
            .copied()
            .unwrap_or(MixinLimit::new(0, 0, u64::MAX, 3))
    }

    /// The default mixin to use for a transaction confirming at `height`.
    pub fn default_at_height(&self, height: u64) -> u64 {
        self.at_height(height).default_mixin
    }
}

impl Default for MixinLimits {
    /// The TurtleCoin mainnet schedule.
    fn default() -> Self {
        Self::new(vec![
            MixinLimit::new(440_000, 0, 100, 3),
            MixinLimit::new(620_000, 7, 7, 7),
            MixinLimit::new(800_000, 1, 3, 3),
        ])
    }
}
