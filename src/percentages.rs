//! Manual Percentages
//!
//! Caller-supplied production shares, in percent points, keyed by size.
//!
//! Values are parsed leniently: a value that is not a finite number between 0 and 100
//! is treated as zero for that size instead of rejecting the whole map. A bad entry for
//! one size therefore only removes that size from manual allocation.

use std::str::FromStr;

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use rustc_hash::FxHashMap;
use tracing::warn;

/// One hundred percent points.
pub const FULL_SHARE: Decimal = Decimal::ONE_HUNDRED;

/// Manual production shares per size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualPercentages {
    shares: FxHashMap<String, Decimal>,
}

impl ManualPercentages {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw `(size, value)` entries, e.g. from form fields or CLI flags.
    ///
    /// Accepts plain numbers (`"60"`, `"12.5"`), scientific notation and a trailing
    /// percent sign (`"60%"`). Anything else, including negative numbers, becomes zero.
    pub fn parse<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let shares = entries
            .into_iter()
            .map(|(size, raw)| {
                let size = size.into();
                let share = parse_share(&size, raw.as_ref());

                (size, share)
            })
            .collect();

        Self { shares }
    }

    /// Build from numeric values. Non-finite values and values outside `0..=100` become zero.
    pub fn from_values<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let shares = entries
            .into_iter()
            .map(|(size, value)| {
                let size = size.into();
                let share = Decimal::from_f64(value)
                    .filter(is_valid_share)
                    .unwrap_or_else(|| {
                        warn!(size = %size, value, "ignoring malformed percentage");
                        Decimal::ZERO
                    });

                (size, share)
            })
            .collect();

        Self { shares }
    }

    /// Set the share for one size, replacing any previous value. The share is clamped to
    /// `0..=100`.
    pub fn set(&mut self, size: impl Into<String>, share: Decimal) -> &mut Self {
        self.shares
            .insert(size.into(), share.clamp(Decimal::ZERO, FULL_SHARE));

        self
    }

    /// Share for a size in percent points, zero when absent
    pub fn share(&self, size: &str) -> Decimal {
        self.shares.get(size).copied().unwrap_or(Decimal::ZERO)
    }

    /// Share for a size as a fraction of one (`60` -> `0.6`)
    pub fn fraction(&self, size: &str) -> f64 {
        self.share(size).to_f64().unwrap_or(0.0) / 100.0
    }

    /// Returns true if any supplied share is positive, selecting manual allocation.
    pub fn is_active(&self) -> bool {
        self.shares.values().any(|share| *share > Decimal::ZERO)
    }

    /// Sum of the shares of the given sizes.
    pub fn total_for<'s>(&self, sizes: impl IntoIterator<Item = &'s str>) -> Decimal {
        sizes
            .into_iter()
            .fold(Decimal::ZERO, |total, size| total.saturating_add(self.share(size)))
    }

    /// Scale the given sizes' shares down proportionally so they total at most 100.
    ///
    /// Shares are rounded towards zero at two decimal places. When the total is already
    /// within 100 the map is returned unchanged.
    pub fn rebalanced<'s>(&self, sizes: impl IntoIterator<Item = &'s str> + Clone) -> Self {
        let total = self.total_for(sizes.clone());

        if total <= FULL_SHARE {
            return self.clone();
        }

        let mut rebalanced = self.clone();

        for size in sizes {
            let share = self.share(size);

            if share > Decimal::ZERO {
                let scaled = share
                    .checked_mul(FULL_SHARE)
                    .and_then(|scaled| scaled.checked_div(total))
                    .unwrap_or(Decimal::ZERO)
                    .round_dp_with_strategy(2, RoundingStrategy::ToZero);

                rebalanced.shares.insert(size.to_string(), scaled);
            }
        }

        rebalanced
    }

    /// Number of entries, including zero shares
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Returns true if no entries were supplied.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

fn is_valid_share(share: &Decimal) -> bool {
    (Decimal::ZERO..=FULL_SHARE).contains(share)
}

fn parse_share(size: &str, raw: &str) -> Decimal {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').map_or(trimmed, str::trim);

    if number.is_empty() {
        return Decimal::ZERO;
    }

    match Decimal::from_str(number).or_else(|_err| Decimal::from_scientific(number)) {
        Ok(share) if is_valid_share(&share) => share,
        _ => {
            warn!(size = %size, value = %raw, "ignoring malformed percentage");

            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_and_percent_suffixed_values() {
        let percentages = ManualPercentages::parse([("S", "60"), ("M", " 12.5% "), ("L", "1e1")]);

        assert_eq!(percentages.share("S"), Decimal::from(60));
        assert_eq!(percentages.share("M"), Decimal::new(125, 1));
        assert_eq!(percentages.share("L"), Decimal::from(10));
    }

    #[test]
    fn malformed_values_become_zero() {
        let percentages =
            ManualPercentages::parse([("S", "abc"), ("M", "-5"), ("L", ""), ("XL", "40")]);

        assert_eq!(percentages.share("S"), Decimal::ZERO);
        assert_eq!(percentages.share("M"), Decimal::ZERO);
        assert_eq!(percentages.share("L"), Decimal::ZERO);
        assert_eq!(percentages.share("XL"), Decimal::from(40));
        assert_eq!(percentages.len(), 4);
    }

    #[test]
    fn shares_above_one_hundred_become_zero() {
        let percentages = ManualPercentages::parse([
            ("S", "70000000000000000000000000000"),
            ("M", "7e28"),
            ("L", "100.01"),
            ("XL", "100"),
        ]);

        assert_eq!(percentages.share("S"), Decimal::ZERO);
        assert_eq!(percentages.share("M"), Decimal::ZERO);
        assert_eq!(percentages.share("L"), Decimal::ZERO);
        assert_eq!(percentages.share("XL"), FULL_SHARE);
        assert_eq!(percentages.total_for(["S", "M", "L", "XL"]), FULL_SHARE);

        let values = ManualPercentages::from_values([("S", 7e28), ("M", 250.0)]);

        assert!(!values.is_active());
    }

    #[test]
    fn huge_shares_rebalance_without_overflow() {
        let percentages = ManualPercentages::parse([
            ("S", "70000000000000000000000000000"),
            ("M", "80"),
            ("L", "40"),
        ]);

        let rebalanced = percentages.rebalanced(["S", "M", "L"]);

        assert_eq!(rebalanced.share("S"), Decimal::ZERO);
        assert_eq!(rebalanced.share("M"), Decimal::new(6666, 2));
        assert!(rebalanced.total_for(["S", "M", "L"]) <= FULL_SHARE);
    }

    #[test]
    fn from_values_drops_non_finite_values() {
        let percentages = ManualPercentages::from_values([("S", f64::NAN), ("M", 30.0)]);

        assert_eq!(percentages.share("S"), Decimal::ZERO);
        assert_eq!(percentages.share("M"), Decimal::from(30));
    }

    #[test]
    fn is_active_requires_a_positive_share() {
        let zeros = ManualPercentages::parse([("S", "0"), ("M", "junk")]);
        let active = ManualPercentages::parse([("S", "0"), ("M", "0.5")]);

        assert!(!zeros.is_active());
        assert!(active.is_active());
        assert!(!ManualPercentages::new().is_active());
    }

    #[test]
    fn total_is_exact_in_decimal() {
        let percentages =
            ManualPercentages::parse([("S", "33.33"), ("M", "33.33"), ("L", "33.34")]);

        assert_eq!(percentages.total_for(["S", "M", "L"]), FULL_SHARE);
        assert_eq!(percentages.total_for(["S", "XL"]), Decimal::new(3333, 2));
    }

    #[test]
    fn fraction_converts_percent_points() {
        let percentages = ManualPercentages::parse([("S", "60")]);

        assert!((percentages.fraction("S") - 0.6).abs() < 1e-12);
        assert!(percentages.fraction("M").abs() < 1e-12);
    }

    #[test]
    fn rebalanced_scales_overflowing_shares_down() {
        let percentages = ManualPercentages::parse([("S", "80"), ("M", "40"), ("L", "20")]);

        let rebalanced = percentages.rebalanced(["S", "M"]);

        // 80 * 100 / 120 = 66.666.., 40 * 100 / 120 = 33.333..
        assert_eq!(rebalanced.share("S"), Decimal::new(6666, 2));
        assert_eq!(rebalanced.share("M"), Decimal::new(3333, 2));
        assert_eq!(rebalanced.share("L"), Decimal::from(20));
        assert!(rebalanced.total_for(["S", "M"]) <= FULL_SHARE);
    }

    #[test]
    fn rebalanced_leaves_valid_shares_alone() {
        let percentages = ManualPercentages::parse([("S", "50"), ("M", "30")]);

        assert_eq!(percentages.rebalanced(["S", "M"]), percentages);
    }

    #[test]
    fn set_clamps_shares_to_full_range() {
        let mut percentages = ManualPercentages::new();
        percentages
            .set("S", Decimal::from(-3))
            .set("M", Decimal::from(25))
            .set("L", Decimal::MAX);

        assert_eq!(percentages.share("S"), Decimal::ZERO);
        assert_eq!(percentages.share("M"), Decimal::from(25));
        assert_eq!(percentages.share("L"), FULL_SHARE);
    }
}
