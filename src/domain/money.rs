use crate::error::OrderError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary total, such as an order total or a line subtotal.
///
/// Wraps `rust_decimal::Decimal` so totals cannot be confused with unit prices
/// or plain quantities.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

/// A strictly positive catalog unit price.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, OrderError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(OrderError::InvalidArgument(format!(
                "price must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Subtotal for `quantity` units at this price.
    pub fn times(&self, quantity: u32) -> Result<Money, OrderError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .ok_or_else(|| {
                OrderError::InvalidArgument(format!(
                    "subtotal of {quantity} x {} would overflow",
                    self.0
                ))
            })
    }
}

impl TryFrom<Decimal> for Price {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, OrderError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| OrderError::InvalidArgument(format!("{self} + {rhs} would overflow")))
    }

    /// Loyalty points earned for this amount: the integer part, truncated.
    pub fn loyalty_points(&self) -> Result<u64, OrderError> {
        self.0.trunc().to_u64().ok_or_else(|| {
            OrderError::InvalidArgument(format!("{self} does not convert to loyalty points"))
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let total = Money::ZERO.checked_add(Money::new(dec!(10.50))).unwrap();
        assert_eq!(
            total.checked_add(Money::new(dec!(2.25))).unwrap(),
            Money::new(dec!(12.75))
        );
        assert!(matches!(
            Money::new(Decimal::MAX).checked_add(Money::new(dec!(1))),
            Err(OrderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_price_validation() {
        assert!(Price::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Price::new(dec!(0.0)),
            Err(OrderError::InvalidArgument(_))
        ));
        assert!(matches!(
            Price::new(dec!(-3.0)),
            Err(OrderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_price_times_quantity() {
        let price = Price::new(dec!(22.50)).unwrap();
        assert_eq!(price.times(3).unwrap(), Money::new(dec!(67.50)));

        let huge = Price::new(dec!(70000000000000000000000000000)).unwrap();
        assert!(matches!(huge.times(2), Err(OrderError::InvalidArgument(_))));
    }

    #[test]
    fn test_loyalty_points_truncate() {
        assert_eq!(Money::new(dec!(30.00)).loyalty_points().unwrap(), 30);
        assert_eq!(Money::new(dec!(67.99)).loyalty_points().unwrap(), 67);
        assert_eq!(Money::new(dec!(0.75)).loyalty_points().unwrap(), 0);
    }

    #[test]
    fn test_loyalty_points_out_of_range() {
        let total = Money::new(dec!(70000000000000000000000000000));
        assert!(matches!(
            total.loyalty_points(),
            Err(OrderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_price_rejects_non_positive_on_deserialize() {
        let parsed: Result<Price, _> = serde_json::from_str("\"-1.00\"");
        assert!(parsed.is_err());
        let parsed: Price = serde_json::from_str("\"9.90\"").unwrap();
        assert_eq!(parsed.value(), dec!(9.90));
    }
}
