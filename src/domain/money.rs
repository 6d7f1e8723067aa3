use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed exchange rate: 10 000 coins make up one euro.
pub const COINS_PER_EUR: i64 = 10_000;

/// A withdrawal may only be requested once the balance reaches 5 €.
pub const MIN_WITHDRAWAL_EUR: Decimal = dec!(5.00);
pub const MIN_WITHDRAWAL_COINS: i64 = 50_000;

/// Exact conversion of a coin amount into its euro value.
pub fn eur_from_coins(coins: i64) -> Decimal {
    Decimal::from(coins) / Decimal::from(COINS_PER_EUR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_is_exact() {
        assert_eq!(eur_from_coins(60_000), dec!(6.00));
        assert_eq!(eur_from_coins(40_000), dec!(4.00));
        assert_eq!(eur_from_coins(123), dec!(0.0123));
        assert_eq!(eur_from_coins(0), dec!(0));
    }

    #[test]
    fn minimum_constants_agree() {
        assert_eq!(eur_from_coins(MIN_WITHDRAWAL_COINS), MIN_WITHDRAWAL_EUR);
    }
}
