//! Price representation in Indian rupees.
//!
//! The backend sends every amount in paisa (1 rupee = 100 paisa) as an
//! integer, so `Price` stores paisa and only converts to rupees for
//! arithmetic with decimals and for display.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of paisa in one rupee.
pub const PAISA_PER_RUPEE: i64 = 100;

/// An amount of money in Indian rupees, stored as paisa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    paisa: i64,
}

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self { paisa: 0 };

    /// Create a price from an amount in paisa.
    #[must_use]
    pub const fn from_paisa(paisa: i64) -> Self {
        Self { paisa }
    }

    /// Create a price from a rupee amount, rounding to the nearest paisa.
    #[must_use]
    pub fn from_rupees(rupees: Decimal) -> Self {
        let paisa = (rupees * Decimal::from(PAISA_PER_RUPEE))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self {
            paisa: i64::try_from(paisa).unwrap_or(i64::MAX),
        }
    }

    /// Amount in paisa.
    #[must_use]
    pub const fn paisa(&self) -> i64 {
        self.paisa
    }

    /// Amount in rupees with two decimal places.
    #[must_use]
    pub fn rupees(&self) -> Decimal {
        Decimal::new(self.paisa, 2)
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self {
            paisa: self.paisa.saturating_mul(i64::from(quantity)),
        }
    }

    /// Format for display with Indian digit grouping and no fraction,
    /// e.g. `₹1,23,456`.
    #[must_use]
    pub fn display(&self) -> String {
        let whole = self
            .rupees()
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let sign = if whole.is_sign_negative() && !whole.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = whole.abs().trunc().to_string();
        format!("{sign}₹{}", group_indian(&digits))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            paisa: self.paisa.saturating_add(rhs.paisa),
        }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Group a string of ASCII digits the Indian way: the last three digits,
/// then groups of two (`1234567` -> `12,34,567`).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(head.get(start..end).unwrap_or_default());
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paisa_to_rupees() {
        let price = Price::from_paisa(12_345);
        assert_eq!(price.rupees(), Decimal::new(12_345, 2));
        assert_eq!(price.paisa(), 12_345);
    }

    #[test]
    fn test_from_rupees_rounds_to_paisa() {
        assert_eq!(Price::from_rupees(Decimal::new(1999, 2)).paisa(), 1999);
        assert_eq!(Price::from_rupees(Decimal::new(10_005, 3)).paisa(), 1001);
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::ZERO.display(), "₹0");
        assert_eq!(Price::from_paisa(50_000).display(), "₹500");
        assert_eq!(Price::from_paisa(99_900).display(), "₹999");
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(Price::from_paisa(100_000).display(), "₹1,000");
        assert_eq!(Price::from_paisa(12_345_600).display(), "₹1,23,456");
        assert_eq!(Price::from_paisa(123_456_700).display(), "₹12,34,567");
        assert_eq!(Price::from_paisa(12_345_678_900).display(), "₹12,34,56,789");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Price::from_paisa(150).display(), "₹2");
        assert_eq!(Price::from_paisa(149).display(), "₹1");
        assert_eq!(Price::from_paisa(-150).display(), "-₹2");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::from_paisa(2_500_000);
        assert_eq!(unit.times(3), Price::from_paisa(7_500_000));
        assert_eq!(unit.times(0), Price::ZERO);

        let total: Price = [unit, unit.times(2)].into_iter().sum();
        assert_eq!(total.display(), "₹75,000");
    }

    #[test]
    fn test_serde_is_plain_paisa() {
        let price: Price = serde_json::from_str("4999900").unwrap_or_default();
        assert_eq!(price, Price::from_paisa(4_999_900));
    }
}
