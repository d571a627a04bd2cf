//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts travel as `f64` in models and JSON; every calculation converts to
//! `Decimal` first and converts back with 2 decimal places at the end.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_paise(value).to_f64().unwrap_or_default()
}

/// Round to 2 decimal places
#[inline]
pub fn round_paise(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to the nearest whole rupee (50 paise and above round up)
#[inline]
pub fn round_rupee(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent`% of `amount`, `None` on overflow
#[inline]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

/// Convert a validated amount, rejecting values `Decimal` cannot hold
fn representable(value: f64, field_name: &str) -> Result<Decimal, String> {
    Decimal::from_f64(value).ok_or_else(|| format!("{field_name} is out of range, got {value}"))
}

/// Validate that an amount is finite and strictly positive
pub fn require_positive(value: f64, field_name: &str) -> Result<Decimal, String> {
    if !value.is_finite() {
        return Err(format!("{field_name} must be a finite number, got {value}"));
    }
    if value <= 0.0 {
        return Err(format!("{field_name} must be greater than zero, got {value}"));
    }
    representable(value, field_name)
}

/// Validate that an amount is finite and not negative
pub fn require_non_negative(value: f64, field_name: &str) -> Result<Decimal, String> {
    if !value.is_finite() {
        return Err(format!("{field_name} must be a finite number, got {value}"));
    }
    if value < 0.0 {
        return Err(format!("{field_name} must be non-negative, got {value}"));
    }
    representable(value, field_name)
}

/// Compare two amounts within [`MONEY_TOLERANCE`]
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_to_decimal_precision() {
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        let sum_dec = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_round_rupee() {
        assert_eq!(round_rupee(dec("1234.49")), dec("1234"));
        assert_eq!(round_rupee(dec("1234.50")), dec("1235"));
        assert_eq!(round_rupee(dec("0.5")), dec("1"));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("50000"), dec("2")), Some(dec("1000")));
        assert_eq!(percent_of(dec("1000"), dec("0.1")), Some(dec("1")));
        assert_eq!(percent_of(Decimal::MAX, dec("18")), None);
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive(10.0, "amount").is_ok());
        assert!(require_positive(0.0, "amount").is_err());
        assert!(require_positive(f64::NAN, "amount").is_err());
        assert!(require_non_negative(0.0, "discount").is_ok());
        assert!(require_non_negative(-1.0, "discount").is_err());
    }

    #[test]
    fn test_require_rejects_unrepresentable() {
        let err = require_non_negative(1e30, "amount").unwrap_err();
        assert!(err.contains("out of range"), "{err}");
        assert!(require_positive(1e30, "amount").is_err());
        assert!(require_positive(1e20, "amount").is_ok());
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(dec("10.001"), dec("10.0")));
        assert!(!approx_eq(dec("10.02"), dec("10.0")));
    }
}
