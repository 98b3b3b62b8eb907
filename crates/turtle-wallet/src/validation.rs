//! Send-parameter validation.
//!
//! Everything here returns an error value; nothing throws. These checks
//! run before a send is composed, so the composition layer can assume
//! clean inputs.

use crate::crypto::CryptoOps;
use crate::error::WalletError;
use crate::subwallets::SubWallets;
use turtle_types::keys::PublicKey;
use turtle_types::WalletConfig;

/// Check that every address decodes and, unless permitted, is not
/// integrated. Integrated addresses are discriminated by their length.
pub fn validate_addresses(
    addresses: &[&str],
    allow_integrated: bool,
    crypto: &dyn CryptoOps,
    config: &WalletConfig,
) -> Result<(), WalletError> {
    for address in addresses {
        let decoded = crypto.decode_address(address)?;

        let integrated =
            decoded.is_integrated() || address.len() == config.integrated_address_length;
        if integrated && !allow_integrated {
            return Err(WalletError::AddressIsIntegrated);
        }

        if !crypto.check_key(&decoded.public_spend_key)
            || !crypto.check_key(&decoded.public_view_key)
        {
            return Err(WalletError::AddressNotValid(
                "address contains a non-canonical key".into(),
            ));
        }
    }
    Ok(())
}

/// Resolve addresses that must belong to this wallet into their spend
/// keys.
pub fn validate_our_addresses(
    addresses: &[&str],
    sub_wallets: &SubWallets,
    crypto: &dyn CryptoOps,
    config: &WalletConfig,
) -> Result<Vec<PublicKey>, WalletError> {
    validate_addresses(addresses, false, crypto, config)?;

    let mut keys = Vec::with_capacity(addresses.len());
    for address in addresses {
        let decoded = crypto.decode_address(address)?;
        if sub_wallets.get(&decoded.public_spend_key).is_none() {
            return Err(WalletError::AddressNotInWallet);
        }
        keys.push(decoded.public_spend_key);
    }
    Ok(keys)
}

/// Payment IDs are 64 hex characters; the empty string means none.
pub fn validate_payment_id(payment_id: &str) -> Result<(), WalletError> {
    if payment_id.is_empty() {
        return Ok(());
    }
    if payment_id.len() != turtle_types::constants::PAYMENT_ID_LENGTH {
        return Err(WalletError::PaymentIdWrongLength);
    }
    if !payment_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::PaymentIdInvalid);
    }
    Ok(())
}

/// Check a mixin against the band in force at `height`.
pub fn validate_mixin(mixin: u64, height: u64, config: &WalletConfig) -> Result<(), WalletError> {
    let band = config.mixin_limits.at_height(height);
    if mixin < band.min_mixin {
        return Err(WalletError::MixinTooSmall {
            minimum: band.min_mixin,
            given: mixin,
        });
    }
    if mixin > band.max_mixin {
        return Err(WalletError::MixinTooBig {
            maximum: band.max_mixin,
            given: mixin,
        });
    }
    Ok(())
}

/// Validate a whole prospective send.
#[allow(clippy::too_many_arguments)]
pub fn validate_transaction(
    destinations: &[(&str, u64)],
    payment_id: &str,
    mixin: u64,
    fee: u64,
    current_height: u64,
    sub_wallets: &SubWallets,
    crypto: &dyn CryptoOps,
    config: &WalletConfig,
) -> Result<(), WalletError> {
    if destinations.is_empty() {
        return Err(WalletError::NoDestinationsGiven);
    }

    let addresses: Vec<&str> = destinations.iter().map(|(address, _)| *address).collect();
    validate_addresses(&addresses, true, crypto, config)?;
    validate_payment_id(payment_id)?;
    validate_mixin(mixin, current_height, config)?;

    // An embedded payment ID must not disagree with an explicit one or
    // with another integrated destination.
    let mut effective_payment_id = if payment_id.is_empty() {
        None
    } else {
        Some(payment_id.to_string())
    };
    for address in &addresses {
        let decoded = crypto.decode_address(address)?;
        if let Some(embedded) = decoded.payment_id {
            match &effective_payment_id {
                Some(existing) if *existing != embedded => {
                    return Err(WalletError::ConflictingPaymentIds);
                }
                Some(_) => {}
                None => effective_payment_id = Some(embedded),
            }
        }
    }

    if fee < config.minimum_fee {
        return Err(WalletError::FeeTooSmall {
            minimum: config.minimum_fee,
            given: fee,
        });
    }

    let mut total: u64 = 0;
    for (_, amount) in destinations {
        if *amount == 0 {
            return Err(WalletError::AmountIsZero);
        }
        total = total.checked_add(*amount).ok_or(WalletError::WillOverflow)?;
    }
    let total_with_fee = total.checked_add(fee).ok_or(WalletError::WillOverflow)?;

    let (unlocked, _locked) = sub_wallets.get_balance(
        current_height,
        config.unlock_time_as_block_height_threshold,
        None,
    );
    if total_with_fee > unlocked {
        return Err(WalletError::NotEnoughBalance {
            need: total_with_fee,
            have: unlocked,
        });
    }

    Ok(())
}
