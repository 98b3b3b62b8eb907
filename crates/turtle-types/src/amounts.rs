//! Atomic-amount parsing.
//!
//! User-supplied amounts arrive as decimal strings. Only non-negative
//! integral values representable in a `u64` are accepted; everything
//! else maps to a distinct rejection reason.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is not an integer")]
    NonInteger,

    #[error("amount is negative")]
    Negative,

    #[error("amount does not fit in 64 bits")]
    Overflow,

    #[error("amount is not a number")]
    Malformed,
}

/// Parse a decimal string into atomic units.
pub fn parse_atomic_amount(input: &str) -> Result<u64, AmountError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(AmountError::Malformed);
    }

    if let Some(rest) = trimmed.strip_prefix('-') {
        // "-0" is still a rejection; the sign itself is the problem.
        if rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty() {
            return Err(AmountError::Negative);
        }
        return Err(AmountError::Malformed);
    }

    if trimmed.contains('.') {
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let numeric = whole.chars().all(|c| c.is_ascii_digit())
            && frac.chars().all(|c| c.is_ascii_digit())
            && !(whole.is_empty() && frac.is_empty());
        if !numeric {
            return Err(AmountError::Malformed);
        }
        return Err(AmountError::NonInteger);
    }

    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::Malformed);
    }

    trimmed.parse::<u64>().map_err(|_| AmountError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_integral_amounts() {
        assert_eq!(parse_atomic_amount("0"), Ok(0));
        assert_eq!(parse_atomic_amount("12345"), Ok(12345));
        assert_eq!(parse_atomic_amount(" 7 "), Ok(7));
        assert_eq!(
            parse_atomic_amount("18446744073709551615"),
            Ok(u64::MAX)
        );
    }

    #[test]
    fn test_rejects_fractional() {
        assert_eq!(parse_atomic_amount("1.5"), Err(AmountError::NonInteger));
        assert_eq!(parse_atomic_amount("0.0"), Err(AmountError::NonInteger));
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(parse_atomic_amount("-1"), Err(AmountError::Negative));
        assert_eq!(parse_atomic_amount("-0"), Err(AmountError::Negative));
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(
            parse_atomic_amount("18446744073709551616"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_atomic_amount(""), Err(AmountError::Malformed));
        assert_eq!(parse_atomic_amount("abc"), Err(AmountError::Malformed));
        assert_eq!(parse_atomic_amount("1e5"), Err(AmountError::Malformed));
        assert_eq!(parse_atomic_amount("-1.5"), Err(AmountError::Malformed));
    }
}
