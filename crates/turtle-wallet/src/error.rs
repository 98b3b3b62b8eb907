//! Wallet error types.

use thiserror::Error;
use turtle_types::AmountError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("address is not valid: {0}")]
    AddressNotValid(String),

    #[error("address is integrated where a standard address is required")]
    AddressIsIntegrated,

    #[error("address does not belong to this wallet")]
    AddressNotInWallet,

    #[error("no destinations given")]
    NoDestinationsGiven,

    #[error("amount is zero")]
    AmountIsZero,

    #[error("negative value given")]
    NegativeValueGiven,

    #[error("non-integer value given")]
    NonIntegerGiven,

    #[error("conflicting payment IDs given")]
    ConflictingPaymentIds,

    #[error("fee {given} is below the minimum {minimum}")]
    FeeTooSmall { minimum: u64, given: u64 },

    #[error("not enough balance: need {need}, have {have}")]
    NotEnoughBalance { need: u64, have: u64 },

    #[error("amounts will overflow")]
    WillOverflow,

    #[error("mixin {given} is below the minimum {minimum}")]
    MixinTooSmall { minimum: u64, given: u64 },

    #[error("mixin {given} is above the maximum {maximum}")]
    MixinTooBig { maximum: u64, given: u64 },

    #[error("payment ID has the wrong length")]
    PaymentIdWrongLength,

    #[error("payment ID is not valid hex")]
    PaymentIdInvalid,

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("invalid key")]
    InvalidKey,

    #[error("daemon is unreachable: {0}")]
    DaemonOffline(#[from] turtle_rpc::RpcError),

    #[error("block {height} not found")]
    BlockNotFound { height: u64 },

    #[error("invalid wallet file: {0}")]
    InvalidWalletFile(String),

    #[error("wallet file I/O failed: {0}")]
    FileIo(#[from] std::io::Error),
}

impl From<AmountError> for WalletError {
    fn from(e: AmountError) -> Self {
        match e {
            AmountError::NonInteger => WalletError::NonIntegerGiven,
            AmountError::Negative => WalletError::NegativeValueGiven,
            AmountError::Overflow => WalletError::WillOverflow,
            AmountError::Malformed => WalletError::NonIntegerGiven,
        }
    }
}
