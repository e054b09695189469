//! Integration tests for money and exchange-rate arithmetic

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, ExchangeRate, Money, MoneyError};

#[test]
fn zero_is_zero_in_both_currencies() {
    assert!(Money::zero(Currency::USD).is_zero());
    assert!(Money::zero(Currency::VED).is_zero());
    assert!(!Money::zero(Currency::USD).is_positive());
    assert!(!Money::zero(Currency::USD).is_negative());
}

#[test]
fn sign_predicates() {
    assert!(Money::usd(dec!(0.01)).is_positive());
    assert!(Money::usd(dec!(-0.01)).is_negative());
    assert_eq!(Money::usd(dec!(-5)).abs(), Money::usd(dec!(5)));
}

#[test]
fn negation_flips_sign() {
    let m = Money::usd(dec!(25));
    assert_eq!((-m).amount(), dec!(-25));
    assert_eq!((-(-m)).amount(), dec!(25));
}

#[test]
fn rounded_truncates_to_cents() {
    let m = Money::usd(dec!(10.1234));
    assert_eq!(m.rounded().amount(), dec!(10.12));
}

#[test]
fn display_formats_with_symbol() {
    assert_eq!(Money::usd(dec!(35)).to_string(), "$ 35.00");
    assert_eq!(Money::ved(dec!(1250.5)).to_string(), "Bs. 1250.50");
}

#[test]
fn spec_scenario_rate_conversion() {
    // A 2500 VED payment at rate 100 is worth exactly 25 USD
    let rate = ExchangeRate::new(dec!(100)).unwrap();
    let usd = rate.to_usd(Money::ved(dec!(2500))).unwrap();
    assert_eq!(usd, Money::usd(dec!(25)));
}

#[test]
fn fractional_rate_conversion() {
    let rate = ExchangeRate::new(dec!(36.25)).unwrap();
    let usd = rate.to_usd(Money::ved(dec!(72.50))).unwrap();
    assert_eq!(usd.amount(), dec!(2));
}

#[test]
fn mismatched_subtraction_errors() {
    let usd = Money::usd(dec!(10));
    let ved = Money::ved(dec!(10));
    assert!(matches!(
        usd.checked_sub(&ved),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn multiply_scales_amount() {
    let m = Money::usd(dec!(25)).multiply(Decimal::from(3));
    assert_eq!(m.amount(), dec!(75));
}
