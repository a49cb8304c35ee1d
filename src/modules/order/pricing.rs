use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Fixed 20% commission added on top of the item subtotal. Not configurable
/// per restaurant.
pub fn commission_rate() -> BigDecimal {
    BigDecimal::new(BigInt::from(20), 2)
}

/// A priced order line. `unit_price` is the snapshot taken at order time and
/// is already post-discount; `discount` is carried for display only.
#[derive(Clone, Debug)]
pub struct LineItem {
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub discount: i32,
}

pub fn subtotal(items: &[LineItem]) -> BigDecimal {
    items.iter().fold(BigDecimal::from(0), |acc, item| {
        acc + &item.unit_price * BigDecimal::from(item.quantity)
    })
}

pub fn platform_fee(subtotal: &BigDecimal) -> BigDecimal {
    round_money(subtotal * commission_rate())
}

pub fn total(subtotal: &BigDecimal, platform_fee: &BigDecimal) -> BigDecimal {
    subtotal + platform_fee
}

/// Currency amounts are persisted and displayed at 2 decimal places,
/// rounding half-up.
pub fn round_money(amount: BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn line(unit_price: &str, quantity: i32) -> LineItem {
        LineItem {
            unit_price: money(unit_price),
            quantity,
            discount: 0,
        }
    }

    #[test]
    fn booking_scenario() {
        // 2 x 10.00 + 1 x 5.00
        let items = vec![line("10.00", 2), line("5.00", 1)];

        let subtotal = subtotal(&items);
        assert_eq!(subtotal, money("25.00"));

        let fee = platform_fee(&subtotal);
        assert_eq!(fee, money("5.00"));

        assert_eq!(total(&subtotal, &fee), money("30.00"));
    }

    #[test]
    fn empty_order_costs_nothing() {
        assert_eq!(subtotal(&[]), BigDecimal::from(0));
    }

    #[test]
    fn fee_is_rounded_half_up() {
        // 20% of 10.13 is 2.026, which rounds up to 2.03.
        assert_eq!(platform_fee(&money("10.13")), money("2.03"));
        // 20% of 10.11 is 2.022, which rounds down to 2.02.
        assert_eq!(platform_fee(&money("10.11")), money("2.02"));
        // The half case rounds away from zero: 20% of 10.125 is 2.025.
        assert_eq!(platform_fee(&money("10.125")), money("2.03"));
    }

    #[test]
    fn fee_matches_rounded_commission() {
        for value in ["0.00", "0.01", "9.99", "18.99", "123.45", "999.99"] {
            let subtotal = money(value);
            assert_eq!(
                platform_fee(&subtotal),
                round_money(&subtotal * commission_rate())
            );
        }
    }

    #[test]
    fn subtotal_is_monotonic_in_quantity() {
        let mut previous = BigDecimal::from(0);
        for quantity in 1..=10 {
            let current = subtotal(&[line("18.99", quantity)]);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn total_is_exact_sum() {
        let subtotal = money("18.99");
        let fee = platform_fee(&subtotal);
        assert_eq!(fee, money("3.80"));
        assert_eq!(total(&subtotal, &fee), money("22.79"));
    }

    #[test]
    fn discount_does_not_change_the_charge() {
        let full = subtotal(&[line("18.99", 2)]);
        let discounted = subtotal(&[LineItem {
            unit_price: money("18.99"),
            quantity: 2,
            discount: 14,
        }]);
        assert_eq!(full, discounted);
    }
}
