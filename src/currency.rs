//! Conversion of expense amounts into the group's base currency, plus the
//! static currency table the client offers for selection.
//!
//! A conversion rate is the number of base-currency units one unit of the
//! expense currency is worth, so `base = amount * rate`. With GBP as base,
//! 100 EUR at a rate of 0.85 is 85.00 GBP.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::ValidationError;

/// Minor unit of every base currency we settle in.
pub const BASE_DECIMALS: u32 = 2;

/// Cap on an expense amount, before and after conversion.
pub const MAX_AMOUNT: u64 = 1_000_000_000;
pub const MAX_RATE: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rate {
    /// The amount is already expressed in the base currency.
    Base,
    Factor(Decimal),
}

impl Rate {
    /// Interprets a client supplied rate. Absent and zero rates both mean the
    /// amount needs no conversion.
    pub fn from_input(rate: Option<Decimal>) -> Result<Rate, ValidationError> {
        match rate {
            None => Ok(Rate::Base),
            Some(rate) if rate.is_sign_negative() && !rate.is_zero() => {
                Err(ValidationError::NegativeRate)
            }
            Some(rate) if rate > Decimal::from(MAX_RATE) => {
                Err(ValidationError::RateTooLarge(MAX_RATE))
            }
            Some(rate) if rate.is_zero() || rate == Decimal::ONE => Ok(Rate::Base),
            Some(rate) => Ok(Rate::Factor(rate)),
        }
    }

    /// The value persisted next to the expense.
    pub fn stored(self) -> Decimal {
        match self {
            Rate::Base => Decimal::ONE,
            Rate::Factor(rate) => rate,
        }
    }
}

/// Rounds to the minor unit, always keeping two decimal places so `30`
/// renders as `30.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(BASE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(BASE_DECIMALS);
    rounded
}

/// Converts `amount` into the base currency. The result never exceeds
/// [`MAX_AMOUNT`].
pub fn normalize(amount: Decimal, rate: Rate) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    let too_large = ValidationError::BaseAmountTooLarge(MAX_AMOUNT);
    let converted = match rate {
        Rate::Base => amount,
        Rate::Factor(rate) => amount.checked_mul(rate).ok_or(too_large.clone())?,
    };
    let base_amount = round_money(converted);
    if base_amount > Decimal::from(MAX_AMOUNT) {
        return Err(too_large);
    }
    Ok(base_amount)
}

/// Upper-cases a currency code, rejecting anything that isn't three ASCII
/// letters.
pub fn parse_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ValidationError::InvalidCurrency(code.to_string()))
    }
}

/// Resolves the rate of an expense in `currency`. Amounts in the base
/// currency may only carry the neutral rates.
pub fn resolve_rate(
    currency: &str,
    rate: Option<Decimal>,
    base_currency: &str,
) -> Result<Rate, ValidationError> {
    let resolved = Rate::from_input(rate)?;
    if currency == base_currency && resolved != Rate::Base {
        return Err(ValidationError::BaseCurrencyRate(currency.to_string()));
    }
    Ok(resolved)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub country: &'static str,
}

const fn info(code: &'static str, name: &'static str, country: &'static str) -> CurrencyInfo {
    CurrencyInfo {
        code,
        name,
        country,
    }
}

// Sorted by country, which is the order the client lists them in.
const CURRENCIES: &[CurrencyInfo] = &[
    info("XCD", "Eastern Caribbean Dollar", "Antigua and Barbuda"),
    info("EUR", "Euro", "Austria"),
    info("BSD", "Bahamian Dollar", "Bahamas"),
    info("BBD", "Barbadian Dollar", "Barbados"),
    info("XCD", "Eastern Caribbean Dollar", "Barbados"),
    info("EUR", "Euro", "Belgium"),
    info("BZD", "Belize Dollar", "Belize"),
    info("XOF", "West African CFA Franc", "Benin"),
    info("XOF", "West African CFA Franc", "Burkina Faso"),
    info("KYD", "Cayman Islands Dollar", "Cayman Islands"),
    info("XOF", "West African CFA Franc", "Côte d'Ivoire"),
    info("CUP", "Cuban Peso", "Cuba"),
    info("XCD", "Eastern Caribbean Dollar", "Dominica"),
    info("DOP", "Dominican Peso", "Dominican Republic"),
    info("XCD", "Eastern Caribbean Dollar", "Grenada"),
    info("XOF", "West African CFA Franc", "Guinea-Bissau"),
    info("HTG", "Haitian Gourde", "Haiti"),
    info("JMD", "Jamaican Dollar", "Jamaica"),
    info("XOF", "West African CFA Franc", "Mali"),
    info("XOF", "West African CFA Franc", "Niger"),
    info("XCD", "Eastern Caribbean Dollar", "Saint Kitts and Nevis"),
    info("XCD", "Eastern Caribbean Dollar", "Saint Lucia"),
    info("XCD", "Eastern Caribbean Dollar", "Saint Vincent and the Grenadines"),
    info("XOF", "West African CFA Franc", "Senegal"),
    info("XOF", "West African CFA Franc", "Togo"),
    info("TTD", "Trinidad and Tobago Dollar", "Trinidad and Tobago"),
    info("GBP", "British Pound", "United Kingdom"),
    info("USD", "US Dollar", "United States"),
];

pub fn all() -> &'static [CurrencyInfo] {
    CURRENCIES
}

/// Case-insensitive substring search over code, name and country.
pub fn search(query: &str) -> Vec<CurrencyInfo> {
    let query = query.trim().to_lowercase();
    CURRENCIES
        .iter()
        .filter(|c| {
            query.is_empty()
                || c.code.to_lowercase().contains(&query)
                || c.name.to_lowercase().contains(&query)
                || c.country.to_lowercase().contains(&query)
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn multiplies_by_the_rate_and_rounds_to_pence() {
        assert_eq!(normalize(dec!(100), Rate::Factor(dec!(0.85))), Ok(dec!(85.00)));
        assert_eq!(normalize(dec!(10), Rate::Factor(dec!(0.333))), Ok(dec!(3.33)));
        assert_eq!(normalize(dec!(1), Rate::Factor(dec!(0.125))), Ok(dec!(0.13)));
    }

    #[test]
    fn base_rate_leaves_the_amount_alone() {
        assert_eq!(normalize(dec!(12.345), Rate::Base), Ok(dec!(12.35)));
        assert_eq!(Rate::from_input(None), Ok(Rate::Base));
        assert_eq!(Rate::from_input(Some(dec!(0))), Ok(Rate::Base));
        assert_eq!(Rate::from_input(Some(dec!(1.00))), Ok(Rate::Base));
        assert_eq!(Rate::Base.stored(), Decimal::ONE);
    }

    #[test]
    fn rejects_bad_operands() {
        assert_eq!(
            normalize(dec!(0), Rate::Base),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            normalize(dec!(-5), Rate::Factor(dec!(2))),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            Rate::from_input(Some(dec!(-0.5))),
            Err(ValidationError::NegativeRate)
        );
    }

    #[test]
    fn large_rates_and_results_are_rejected() {
        assert_eq!(
            Rate::from_input(Some(dec!(1000000.01))),
            Err(ValidationError::RateTooLarge(MAX_RATE))
        );
        assert_eq!(
            Rate::from_input(Some(dec!(1000000))),
            Ok(Rate::Factor(dec!(1000000)))
        );
        assert_eq!(
            normalize(dec!(1000000000), Rate::Factor(dec!(1.5))),
            Err(ValidationError::BaseAmountTooLarge(MAX_AMOUNT))
        );
        // Overflowing the multiplication itself is an error too
        assert_eq!(
            normalize(Decimal::MAX, Rate::Factor(dec!(2))),
            Err(ValidationError::BaseAmountTooLarge(MAX_AMOUNT))
        );
        assert_eq!(
            normalize(Decimal::MAX, Rate::Base),
            Err(ValidationError::BaseAmountTooLarge(MAX_AMOUNT))
        );
    }

    #[test]
    fn precise_rates_round_once() {
        assert_eq!(
            normalize(dec!(100), Rate::Factor(dec!(0.8512345678901234567890123456))),
            Ok(dec!(85.12))
        );
        assert_eq!(
            normalize(dec!(3), Rate::Factor(dec!(0.3333333333333333333333333333))),
            Ok(dec!(1.00))
        );
    }

    #[test]
    fn base_currency_cannot_be_converted() {
        assert_eq!(resolve_rate("GBP", Some(dec!(0)), "GBP"), Ok(Rate::Base));
        assert_eq!(
            resolve_rate("GBP", Some(dec!(1.2)), "GBP"),
            Err(ValidationError::BaseCurrencyRate("GBP".into()))
        );
        assert_eq!(
            resolve_rate("EUR", Some(dec!(0.85)), "GBP"),
            Ok(Rate::Factor(dec!(0.85)))
        );
    }

    #[test]
    fn currency_codes_are_normalized() {
        assert_eq!(parse_code(" eur "), Ok("EUR".to_string()));
        assert!(parse_code("EURO").is_err());
        assert!(parse_code("E1R").is_err());
    }

    #[test]
    fn search_matches_code_name_and_country() {
        assert!(search("xcd").iter().all(|c| c.code == "XCD"));
        assert_eq!(search("jamaica").len(), 1);
        assert_eq!(search("").len(), all().len());
        assert!(search("zzz").is_empty());
        assert_eq!(search("gbp")[0].name, "British Pound");
    }
}
