//! Savings figures derived from a month's spending and income totals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

const RATE_PLACES: u32 = 1;
const AMOUNT_PLACES: u32 = 2;

/// Savings rate (percent of income) and savings amount (income minus spending) for a month.
///
/// Both values are already rounded and carry a fixed scale, so `rate()` displays as `50.0` and
/// `amount()` as `10000.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavingsMetrics {
    rate: Decimal,
    amount: Decimal,
}

impl SavingsMetrics {
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Serialize for SavingsMetrics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("SavingsMetrics", 2)?;
        s.serialize_field("rate", &self.rate.to_string())?;
        s.serialize_field("amount", &self.amount.to_string())?;
        s.end()
    }
}

/// Computes savings for a month.
///
/// - `amount = income - spent`, which may be negative.
/// - `rate = amount / income * 100` when income is positive, otherwise zero.
///
/// This never fails: a zero, negative or overflowing denominator yields a zero rate.
pub fn compute_metrics(total_spent: Decimal, total_income: Decimal) -> SavingsMetrics {
    let raw_amount = total_income.saturating_sub(total_spent);

    let raw_rate = if total_income > Decimal::ZERO {
        raw_amount
            .checked_div(total_income)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    SavingsMetrics {
        rate: fixed(raw_rate, RATE_PLACES),
        amount: fixed(raw_amount, AMOUNT_PLACES),
    }
}

/// Rounds half away from zero and pads to exactly `places` decimal places.
fn fixed(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    // -0.0 would otherwise display with a sign
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn metrics(spent: &str, income: &str) -> (String, String) {
        let m = compute_metrics(dec(spent), dec(income));
        (m.rate().to_string(), m.amount().to_string())
    }

    #[test]
    fn test_half_saved() {
        assert_eq!(
            metrics("10000", "20000"),
            ("50.0".to_string(), "10000.00".to_string())
        );
    }

    #[test]
    fn test_zero_income_has_zero_rate() {
        assert_eq!(
            metrics("350.25", "0"),
            ("0.0".to_string(), "-350.25".to_string())
        );
    }

    #[test]
    fn test_zero_everything() {
        assert_eq!(metrics("0", "0"), ("0.0".to_string(), "0.00".to_string()));
    }

    #[test]
    fn test_negative_income_has_zero_rate() {
        let m = compute_metrics(dec("100"), dec("-50"));
        assert!(m.rate().is_zero());
        assert_eq!(m.amount(), dec("-150"));
    }

    #[test]
    fn test_overspending_gives_negative_rate() {
        assert_eq!(
            metrics("3000", "2000"),
            ("-50.0".to_string(), "-1000.00".to_string())
        );
    }

    #[test]
    fn test_rate_rounds_to_one_place() {
        // 1000 / 3000 * 100 = 33.333...
        assert_eq!(metrics("2000", "3000").0, "33.3");
        // 2000 / 3000 * 100 = 66.666...
        assert_eq!(metrics("1000", "3000").0, "66.7");
    }

    #[test]
    fn test_rate_midpoint_rounds_away_from_zero() {
        // 0.125 / 2 * 100 = 6.25
        assert_eq!(metrics("1.875", "2").0, "6.3");
        assert_eq!(metrics("2.125", "2").0, "-6.3");
    }

    #[test]
    fn test_amount_rounds_to_two_places() {
        assert_eq!(metrics("0.004", "10").1, "10.00");
        assert_eq!(metrics("0.006", "10").1, "9.99");
        assert_eq!(metrics("0.005", "10").1, "10.00");
    }

    #[test]
    fn test_serialize_as_fixed_strings() {
        let m = compute_metrics(dec("10000"), dec("20000"));
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json, serde_json::json!({"rate": "50.0", "amount": "10000.00"}));
    }
}
