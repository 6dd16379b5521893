//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    150 * 1.1 = 165.00000000000003  ❌ WRONG!                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    150 * 1000 bps / 10000 = 15 tax, total 165                          │
//! │    Rounding happens exactly once, at tax computation                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use regi_core::money::Money;
//!
//! let price = Money::from_minor(150);
//! let subtotal = price.multiply_quantity(2);
//! assert_eq!(subtotal.minor(), 300);
//! ```

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the currency's smallest unit.
///
/// For yen the smallest unit is the yen itself; for a two-decimal currency
/// it would be cents. The register never converts to floating point.
///
/// Serializes as a bare JSON number, which is what the backend sends for
/// `price`, `total_amt` and `total_amt_ex_tax`. Deserializing also accepts
/// whole-valued floats (`150.0`) and decimal strings (`"150.00"`), since
/// backends with decimal columns emit those. A real fraction is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use regi_core::money::Money;
    ///
    /// let price = Money::from_minor(1500);
    /// assert_eq!(price.minor(), 1500);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a line quantity.
    ///
    /// ## Example
    /// ```rust
    /// use regi_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(150);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 450);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Calculates tax at a fixed rate, rounding down.
    ///
    /// ## Rounding
    /// The register has always charged `floor(amount × (1 + rate))`, so the
    /// fractional part of the tax is dropped. Flooring uses Euclidean
    /// division so negative amounts (refunds) round toward negative infinity
    /// like positive ones round toward zero.
    ///
    /// ## Example
    /// ```rust
    /// use regi_core::money::Money;
    /// use regi_core::types::TaxRate;
    ///
    /// let amount = Money::from_minor(155);
    /// let rate = TaxRate::from_bps(1000); // 10%
    ///
    /// // 155 × 10% = 15.5 → 15
    /// assert_eq!(amount.calculate_tax(rate).minor(), 15);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 so large carts cannot overflow the intermediate product
        let tax = (self.0 as i128 * rate.bps() as i128).div_euclid(10_000);
        Money::from_minor(tax as i64)
    }

    /// Returns this amount with tax added.
    #[inline]
    pub fn with_tax(&self, rate: TaxRate) -> Money {
        *self + self.calculate_tax(rate)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount in minor units with thousands separators (`1,500`).
///
/// ## Note
/// Currency symbols and decimal placement are a display concern handled by
/// the front end's configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            write!(f, "{}", grouped)
        }
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Deserialization
// =============================================================================

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a whole amount in minor units")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map(Money)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Ok(Money(v as i64))
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        parse_whole_amount(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }
}

/// Parses `"150"` or `"150.00"`. Any non-zero fractional digit is rejected.
fn parse_whole_amount(text: &str) -> Option<Money> {
    let text = text.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));

    if !fraction.chars().all(|c| c == '0') {
        return None;
    }
    whole.parse::<i64>().ok().map(Money)
}

// =============================================================================
// Unit Tests
// =============================================================================
