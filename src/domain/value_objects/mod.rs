//! Value Objects for the grocery store

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peso amount with two decimal places, persisted as integer centavos.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(MoneyError::Negative); }
        Ok(Self(amount.round_dp(2)))
    }

    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }

    pub fn cents(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(i64::MAX)
    }

    pub fn amount(&self) -> Decimal { self.0 }

    pub fn add(&self, other: Money) -> Money { Money(self.0 + other.0) }

    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { Negative }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Amount cannot be negative") }
}

/// Positive item quantity on a cart or order line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Zero }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Quantity must be greater than zero") }
}

/// Order identifier: `ORD-YYYYMMDD-NNNN`, or `ORD-YYYYMMDD-<8 epoch digits>`
/// when the daily sequence could not produce a free id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn sequential(date: NaiveDate, sequence: u32) -> Self {
        Self(format!("{}{:04}", Self::day_prefix(date), sequence))
    }

    pub fn fallback(date: NaiveDate, epoch_millis: i64) -> Self {
        let digits = epoch_millis.rem_euclid(100_000_000);
        Self(format!("{}{:08}", Self::day_prefix(date), digits))
    }

    /// `ORD-YYYYMMDD-`, shared by every id generated on `date`.
    pub fn day_prefix(date: NaiveDate) -> String {
        format!("ORD-{}-", date.format("%Y%m%d"))
    }

    /// Daily sequence number, only for ids in the four-digit sequential form.
    pub fn sequence(&self) -> Option<u32> {
        let (prefix, seq) = self.0.rsplit_once('-')?;
        if !prefix.starts_with("ORD-") || seq.len() != 4 { return None; }
        seq.parse().ok()
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self { Self(value) }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 7).unwrap() }

    #[test]
    fn test_order_id_format() {
        let id = OrderId::sequential(day(), 12);
        assert_eq!(id.as_str(), "ORD-20240307-0012");
        assert_eq!(id.sequence(), Some(12));
    }

    #[test]
    fn test_fallback_order_id_has_no_sequence() {
        let id = OrderId::fallback(day(), 1_709_812_345_678);
        assert_eq!(id.as_str(), "ORD-20240307-12345678");
        assert_eq!(id.sequence(), None);
    }

    #[test]
    fn test_money_cents() {
        let m = Money::new(Decimal::new(8050, 2)).unwrap();
        assert_eq!(m.cents(), 8050);
        assert_eq!(Money::from_cents(8000).multiply(2).to_string(), "160.00");
        assert_eq!(Money::new(Decimal::new(-1, 0)), Err(MoneyError::Negative));
    }

    #[test]
    fn test_quantity_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(2).unwrap().add(Quantity::new(3).unwrap()).value(), 5);
    }
}
