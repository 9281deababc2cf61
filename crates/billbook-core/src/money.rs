//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! Amounts are whole cents in an `i64`. Anything derived from a rate is
//! rounded to the cent once, where it is computed, so every sum on a bill
//! is exact and `total == subtotal - discount + tax` holds to the cent.
//!
//! ## Usage
//! ```rust
//! use billbook_core::money::Money;
//!
//! let price = Money::from_cents(10000); // 100.00
//! let line = price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 30000);
//! assert_eq!(line.to_string(), "300.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::Percent;

/// An amount in cents. Serialized as the bare integer.
///
/// Negative values are legal: a negative discount percentage yields a
/// negative discount amount.
///
/// ```text
/// Product.price ──► BillItem.price ──► BillItem.total
///                                          │
/// Bill.subtotal ──► discount ──► tax ──► Bill.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount in major units ("12", "12.5", "-3.75").
    ///
    /// Digits beyond the second decimal place are rounded half away from
    /// zero. Spreadsheet cells sometimes carry exponent notation ("1e3");
    /// those fall back to a float parse rounded to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major("12.5").unwrap().cents(), 1250);
    /// assert_eq!(Money::parse_major("0.005").unwrap().cents(), 1);
    /// assert!(Money::parse_major("twelve").is_none());
    /// ```
    pub fn parse_major(input: &str) -> Option<Money> {
        let input = input.trim().replace(',', "");
        if input.is_empty() {
            return None;
        }

        if let Some(money) = parse_plain_decimal(&input) {
            return Some(money);
        }

        let value: f64 = input.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Money((value * 100.0).round() as i64))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value in major units as a float.
    ///
    /// For spreadsheet cells and display only. Never feed the result back
    /// into arithmetic.
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `rate` percent of this amount, rounded half away from zero.
    ///
    /// Integer math on basis points: `amount * bps / 10000`, widened to
    /// i128. `None` when the result does not fit in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::money::Money;
    /// use billbook_core::types::Percent;
    ///
    /// let after_discount = Money::from_cents(31500); // 315.00
    /// let tax = after_discount.percentage(Percent::from_bps(1800)); // 18%
    /// assert_eq!(tax, Some(Money::from_cents(5670))); // 56.70
    /// ```
    pub fn percentage(&self, rate: Percent) -> Option<Money> {
        let scaled = self.0 as i128 * rate.bps() as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Unit price times quantity, `None` on overflow.
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

/// Parses `[+-]digits[.digits]` without going through floating point.
fn parse_plain_decimal(input: &str) -> Option<Money> {
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut fraction_digits = fraction.bytes().map(|b| (b - b'0') as i64);
    let tenths = fraction_digits.next().unwrap_or(0);
    let hundredths = fraction_digits.next().unwrap_or(0);
    let round_up = fraction_digits.next().map(|d| d >= 5).unwrap_or(false);

    let mut cents = whole.checked_mul(100)? + tenths * 10 + hundredths;
    if round_up {
        cents += 1;
    }

    Some(Money(if negative { -cents } else { cents }))
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals and no currency symbol.
///
/// The desk app prefixes the configured symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.checked_mul_quantity(3), Some(Money::from_cents(3000)));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(b.checked_sub(a), Some(Money::from_cents(-500)));
    }

    #[test]
    fn test_overflow_is_reported() {
        let price = Money::from_cents(10000);
        assert_eq!(price.checked_mul_quantity(i64::MAX / 2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);

        // Absurd rates are accepted until the amount stops fitting
        assert_eq!(price.percentage(Percent::from_bps(i64::MAX)), None);
        assert_eq!(
            price.percentage(Percent::from_bps(1_000_000)),
            Some(Money::from_cents(1_000_000))
        );
    }

    #[test]
    fn test_percentage_rounding() {
        // 10.00 at 8.25% = 0.825 → 0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage(Percent::from_bps(825)), Some(Money::from_cents(83)));

        // Negative rates round away from zero too
        assert_eq!(amount.percentage(Percent::from_bps(-825)), Some(Money::from_cents(-83)));

        assert_eq!(amount.percentage(Percent::zero()), Some(Money::zero()));
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(Money::parse_major("100").unwrap().cents(), 10000);
        assert_eq!(Money::parse_major("56.7").unwrap().cents(), 5670);
        assert_eq!(Money::parse_major(" 1,234.50 ").unwrap().cents(), 123450);
        assert_eq!(Money::parse_major("-3.75").unwrap().cents(), -375);
        assert_eq!(Money::parse_major(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_major("2.345").unwrap().cents(), 235);
        assert_eq!(Money::parse_major("1e3").unwrap().cents(), 100000);

        assert!(Money::parse_major("").is_none());
        assert!(Money::parse_major(".").is_none());
        assert!(Money::parse_major("12abc").is_none());
        assert!(Money::parse_major("NaN").is_none());
    }

    #[test]
    fn test_major_f64_for_display() {
        assert!((Money::from_cents(37170).to_major_f64() - 371.7).abs() < 1e-9);
    }
}
