use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to cents, half-up.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `unit_price × quantity`, rounded to cents.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_money(dec("10.005")), dec("10.01"));
        assert_eq!(round_money(dec("10.004")), dec("10.00"));
        assert_eq!(round_money(dec("-2.345")), dec("-2.35"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("19.99"), 3), dec("59.97"));
        assert_eq!(line_total(dec("0.335"), 3), dec("1.01"));
    }
}
