//! Money handling.
//!
//! Prices are `DECIMAL(10,2)` in storage; every amount that leaves the domain
//! layer is normalized to two decimal places (banker's rounding).

use rust_decimal::{Decimal, RoundingStrategy};

/// Normalize an amount to two decimal places.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.00));
        assert_eq!(round_money(dec!(10.015)), dec!(10.02));
        assert_eq!(round_money(dec!(25)), dec!(25.00));
    }
}
