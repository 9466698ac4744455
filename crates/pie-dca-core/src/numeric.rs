//! Decimal helpers shared by every pie operation.
//!
//! Covers:
//! 1. **Cent rounding** -- half-up to two decimal places
//! 2. **Float conversion** -- the only decimal/f64 crossing points
//! 3. **Largest-remainder apportionment** -- integer units that sum exactly
//! 4. **Content hashing** -- SHA-256 cache keys
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64` except at the
//! conversion functions below.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sha2::{Digest, Sha256};

use crate::error::PieError;
use crate::types::{Money, Percent};
use crate::PieResult;

/// Decimal places kept for monetary values.
pub const CENT_DP: u32 = 2;

/// Round a monetary value to cents, midpoints away from zero.
pub fn round_cents(value: Decimal) -> Money {
    value.round_dp_with_strategy(CENT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a float to a cent-rounded decimal.
pub fn to_decimal(value: f64) -> PieResult<Money> {
    let d = Decimal::from_f64(value).ok_or_else(|| PieError::InvalidInput {
        field: "value".into(),
        reason: format!("{value} is not representable as a decimal"),
    })?;
    Ok(round_cents(d))
}

/// Convert a decimal to the float used on the persistence wire.
///
/// Precision beyond ~15 significant digits is lost here.
pub fn to_wire(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// `part / total * 100`, or zero when the total is zero.
pub fn percent_of(part: Decimal, total: Decimal) -> Percent {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        part * dec!(100) / total
    }
}

/// Lowercase hex SHA-256 digest of `content`.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Apportion `units` whole units across `shares` with the largest-remainder
/// method.
///
/// Each share first receives `floor(share / total * units)`. The units left
/// over go one at a time to the shares with the largest fractional parts;
/// equal fractions keep their input order. The result always sums to
/// `units` and every entry is within one unit of its exact quota.
pub fn largest_remainder(shares: &[Decimal], units: u64) -> PieResult<Vec<u64>> {
    if shares.is_empty() {
        return Err(PieError::InvalidInput {
            field: "shares".into(),
            reason: "At least one share is required".into(),
        });
    }
    if let Some(neg) = shares.iter().find(|s| s.is_sign_negative() && !s.is_zero()) {
        return Err(PieError::InvalidInput {
            field: "shares".into(),
            reason: format!("Negative share {neg}"),
        });
    }

    let total: Decimal = shares.iter().copied().sum();
    if total.is_zero() {
        return Err(PieError::DivisionByZero {
            context: "largest-remainder apportionment over a zero total".into(),
        });
    }

    let units_dec = Decimal::from(units);
    // divide first: share * units overflows for large amounts
    let quotas: Vec<Decimal> = shares.iter().map(|s| *s / total * units_dec).collect();
    let mut floored: Vec<u64> = quotas
        .iter()
        .map(|q| q.floor().to_u64().unwrap_or(0))
        .collect();

    let assigned: u64 = floored.iter().sum();
    let remainder = units.saturating_sub(assigned) as usize;

    // sort_by is stable, so ties keep input order
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = quotas[a] - quotas[a].floor();
        let fb = quotas[b] - quotas[b].floor();
        fb.cmp(&fa)
    });

    for &i in order.iter().take(remainder) {
        floored[i] += 1;
    }

    Ok(floored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(dec!(3.14159)), dec!(3.14));
        assert_eq!(round_cents(dec!(2.999)), dec!(3.00));
        assert_eq!(round_cents(dec!(0.125)), dec!(0.13));
        assert_eq!(round_cents(dec!(103.333333)), dec!(103.33));
        assert_eq!(round_cents(dec!(51.666666)), dec!(51.67));
    }

    #[test]
    fn test_to_decimal_rounds_correctly() {
        assert_eq!(to_decimal(3.14159).unwrap(), dec!(3.14));
        assert_eq!(to_decimal(2.999).unwrap(), dec!(3.00));
    }

    #[test]
    fn test_to_decimal_rejects_nan() {
        assert!(to_decimal(f64::NAN).is_err());
        assert!(to_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn test_to_wire() {
        assert_eq!(to_wire(dec!(103.33)), 103.33);
        assert_eq!(to_wire(Decimal::ZERO), 0.0);
    }

    #[test]
    fn test_percent_of_zero_total() {
        assert_eq!(percent_of(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percent_of(dec!(25), dec!(200)), dec!(12.5));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash(b"example content");
        let b = content_hash(b"example content");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash(b"other content"));
    }

    #[test]
    fn test_largest_remainder_thirds() {
        let out = largest_remainder(&[dec!(1), dec!(1), dec!(1)], 100).unwrap();
        // 33.33 each; the first in order takes the spare unit
        assert_eq!(out, vec![34, 33, 33]);
    }

    #[test]
    fn test_largest_remainder_prefers_largest_fraction() {
        // quotas: 50.5, 30.3, 19.2 -> floors 50, 30, 19, one spare to 50.5
        let out = largest_remainder(&[dec!(50.5), dec!(30.3), dec!(19.2)], 100).unwrap();
        assert_eq!(out, vec![51, 30, 19]);
    }

    #[test]
    fn test_largest_remainder_exact_split() {
        let out = largest_remainder(&[dec!(150), dec!(100), dec!(50)], 100).unwrap();
        assert_eq!(out.iter().sum::<u64>(), 100);
        assert_eq!(out, vec![50, 33, 17]);
    }

    #[test]
    fn test_largest_remainder_with_zero_share() {
        let out = largest_remainder(&[dec!(0), dec!(3)], 7).unwrap();
        assert_eq!(out, vec![0, 7]);
    }

    #[test]
    fn test_largest_remainder_large_units() {
        let shares = [dec!(50000000000000000), dec!(50000000000000000)];
        let out = largest_remainder(&shares, 10_000_000_000_000_001).unwrap();
        assert_eq!(out, vec![5_000_000_000_000_001, 5_000_000_000_000_000]);
    }

    #[test]
    fn test_largest_remainder_errors() {
        assert!(largest_remainder(&[], 100).is_err());
        assert!(largest_remainder(&[dec!(0), dec!(0)], 100).is_err());
        assert!(largest_remainder(&[dec!(-1), dec!(2)], 100).is_err());
    }
}
